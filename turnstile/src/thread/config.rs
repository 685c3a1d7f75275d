use std::time::Duration;

use crate::thread::error::StationError;

pub const DEFAULT_ACTOR_COUNT: usize = 10;
pub const DEFAULT_RESOURCE_COUNT: usize = 2;
pub const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(30);
pub const DEFAULT_SERVICE_DURATION: Duration = Duration::from_millis(30);

// --- Configuration Enums ---

/// Determines how an actor waits for its turn at the head of the line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Block on the admission queue and wake on every queue change or stop.
    #[default]
    Notify,
    /// Spin-poll the front of the queue with a fixed delay between attempts.
    Poll {
        /// Delay between two peeks at the front of the admission queue.
        turn_interval: Duration,
        /// Delay between two checks for an idle resource.
        resource_interval: Duration,
    },
}

impl WaitStrategy {
    /// Polling with a 5ms turn delay and a 1ms resource delay.
    pub fn polling() -> Self {
        WaitStrategy::Poll {
            turn_interval: Duration::from_millis(5),
            resource_interval: Duration::from_millis(1),
        }
    }
}

// --- Station Configuration ---

/// Configuration for a `Station`.
#[derive(Clone, Debug)]
pub struct StationConfig {
    /// The number of actor threads.
    pub actor_count: usize,

    /// The number of resources in the pool.
    pub resource_count: usize,

    /// How long the station stays open.
    pub run_duration: Duration,

    /// How long an actor holds a resource for one service.
    pub service_duration: Duration,

    /// How actors wait for their turn and for an idle resource.
    pub wait_strategy: WaitStrategy,

    /// Kind label printed for actors.
    pub actor_label: String,

    /// Kind label printed for resources.
    pub resource_label: String,

    /// Whether actors record a service journal.
    pub record_journal: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            actor_count: DEFAULT_ACTOR_COUNT,
            resource_count: DEFAULT_RESOURCE_COUNT,
            run_duration: DEFAULT_RUN_DURATION,
            service_duration: DEFAULT_SERVICE_DURATION,
            wait_strategy: WaitStrategy::default(),
            actor_label: "Car".to_string(),
            resource_label: "Pump".to_string(),
            record_journal: false,
        }
    }
}

impl StationConfig {
    /// Check the configuration can run.
    ///
    /// A station without actors or without resources could never serve anyone,
    /// and a zero poll interval would turn polling into a hot spin.
    pub fn validate(&self) -> Result<(), StationError> {
        if self.actor_count == 0 {
            return Err(StationError::InvalidConfig(
                "actor_count must be at least 1".to_string(),
            ));
        }
        if self.resource_count == 0 {
            return Err(StationError::InvalidConfig(
                "resource_count must be at least 1".to_string(),
            ));
        }
        if let WaitStrategy::Poll {
            turn_interval,
            resource_interval,
        } = &self.wait_strategy
        {
            if turn_interval.is_zero() || resource_interval.is_zero() {
                return Err(StationError::InvalidConfig(
                    "poll intervals must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Turn on the service journal.
    pub fn with_journal(mut self) -> Self {
        self.record_journal = true;
        self
    }
}
