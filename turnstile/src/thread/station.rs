//! # Station Orchestrator
//!
//! `Station` owns the admission queue, the resource pool, the stop signal and
//! the actor threads, and drives a run through its phases:
//!
//! ```text
//! configure -> start -> run_for -> stop_and_join -> report -> teardown
//! ```
//!
//! ## Key Concepts
//! - Shared state: actors hold an `Arc` of one [`StationContext`]; every actor
//!   sees the same queue and pool instances
//! - Cooperative stop: raising the stop signal never interrupts a service or a
//!   resource wait; actors notice it at their next check
//! - Explicit reporting: counters are read by [`Station::report`] strictly
//!   after every actor thread has been joined
//!
//! ## Liveness
//! An actor blocked on `acquire` after the stop is not interrupted. Every
//! in-service actor releases its resource when its service ends, so the head
//! of the line always gets one and the join completes.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use turnstile_api::actor::{Actor, ActorExit};
use turnstile_api::clock::Clock;
use turnstile_api::event::ServiceEvent;
use turnstile_api::report::{ActorOutcome, StationReport};
use turnstile_api::types::ActorId;

use crate::logging;
use crate::thread::actor::StationActor;
use crate::thread::clock::SystemClock;
use crate::thread::config::{StationConfig, WaitStrategy};
use crate::thread::counter::UsageCounter;
use crate::thread::error::StationError;
use crate::thread::journal::Journal;
use crate::thread::pool::ResourcePool;
use crate::thread::queue::BoundedFifoQueue;
use crate::thread::signal::StopSignal;
use crate::{log_error, log_system};

/// State shared by every actor of a station.
///
/// Actors only touch it through the queue's and the pool's synchronized
/// operations.
#[derive(Debug)]
pub struct StationContext {
    line: BoundedFifoQueue<ActorId>,
    pool: ResourcePool,
    stop: StopSignal,
    clock: Arc<dyn Clock>,
    journal: Journal,
    service_duration: Duration,
    wait_strategy: WaitStrategy,
    actor_label: String,
}

impl StationContext {
    /// The admission queue.
    pub fn line(&self) -> &BoundedFifoQueue<ActorId> {
        &self.line
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn service_duration(&self) -> Duration {
        self.service_duration
    }

    pub fn wait_strategy(&self) -> &WaitStrategy {
        &self.wait_strategy
    }

    pub fn actor_label(&self) -> &str {
        &self.actor_label
    }

    /// Raises the stop signal and wakes every actor waiting for its turn.
    fn raise_stop(&self) -> bool {
        let raised = self.stop.raise();
        self.line.wake_all();
        raised
    }
}

/// Phase of a station run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationState {
    /// Resources seeded, no actor threads yet
    Configured,
    /// Actor threads running
    Running,
    /// Every actor thread joined
    Stopped,
    /// Final counters read
    Reported,
}

impl StationState {
    fn as_str(self) -> &'static str {
        match self {
            StationState::Configured => "configured",
            StationState::Running => "running",
            StationState::Stopped => "stopped",
            StationState::Reported => "reported",
        }
    }
}

impl fmt::Display for StationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raises a station's stop signal from another thread.
///
/// Holds a weak reference; once the station is gone, raising does nothing.
#[derive(Debug, Clone)]
pub struct StopHandle {
    context: Weak<StationContext>,
}

impl StopHandle {
    /// # Returns
    /// `true` if this call raised the signal.
    pub fn raise(&self) -> bool {
        match self.context.upgrade() {
            Some(context) => context.raise_stop(),
            None => false,
        }
    }
}

/// Entry for one actor thread
struct ActorSlot {
    id: ActorId,
    usage: Arc<UsageCounter>,
    handle: Option<JoinHandle<ActorExit>>,
    exit: Option<ActorExit>,
}

/// A bounded shared-resource station.
pub struct Station {
    run_id: Uuid,
    config: StationConfig,
    context: Arc<StationContext>,
    actors: Vec<ActorSlot>,
    state: StationState,
    started_at: Duration,
    elapsed: Duration,
    journal: Vec<ServiceEvent>,
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station")
            .field("run_id", &self.run_id)
            .field("state", &self.state)
            .field("actor_count", &self.actors.len())
            .field("pool", &self.context.pool)
            .finish()
    }
}

impl Station {
    /// Creates a station on wall-clock time.
    pub fn configure(config: StationConfig) -> Result<Self, StationError> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Creates a station whose waits and timestamps all go through `clock`.
    ///
    /// Builds the resources and seeds the pool; the admission queue stays
    /// empty until `start`.
    pub fn with_clock(config: StationConfig, clock: Arc<dyn Clock>) -> Result<Self, StationError> {
        config.validate()?;
        let actor_count = to_u32(config.actor_count)?;
        let resource_count = to_u32(config.resource_count)?;

        let journal = if config.record_journal {
            Journal::recording()
        } else {
            Journal::disabled()
        };

        let context = Arc::new(StationContext {
            line: BoundedFifoQueue::with_capacity(config.actor_count),
            pool: ResourcePool::new(resource_count),
            stop: StopSignal::new(),
            clock,
            journal,
            service_duration: config.service_duration,
            wait_strategy: config.wait_strategy.clone(),
            actor_label: config.actor_label.clone(),
        });

        let actors = (1..=actor_count)
            .map(|raw| ActorSlot {
                id: ActorId::new(raw),
                usage: Arc::new(UsageCounter::new()),
                handle: None,
                exit: None,
            })
            .collect();

        let run_id = Uuid::new_v4();
        log_system!(
            "configure",
            "completed",
            run_id = %run_id,
            actors = actor_count,
            resources = resource_count
        );

        Ok(Self {
            run_id,
            config,
            context,
            actors,
            state: StationState::Configured,
            started_at: Duration::ZERO,
            elapsed: Duration::ZERO,
            journal: Vec::new(),
        })
    }

    /// Configures, runs for the configured duration, reports and tears down.
    pub fn run_to_completion(config: StationConfig) -> Result<StationReport, StationError> {
        let run_duration = config.run_duration;
        let mut station = Self::configure(config)?;
        station.start()?;
        station.run_for(run_duration)?;
        station.stop_and_join()?;
        let report = station.report()?;
        station.teardown()?;
        Ok(report)
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn state(&self) -> StationState {
        self.state
    }

    pub fn context(&self) -> &StationContext {
        &self.context
    }

    /// Ids of every actor, in spawn order.
    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.iter().map(|slot| slot.id)
    }

    /// A handle that raises the stop signal from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            context: Arc::downgrade(&self.context),
        }
    }

    /// Spawns one thread per actor.
    ///
    /// If a spawn fails, the actors already running are stopped and joined
    /// before the error is returned.
    pub fn start(&mut self) -> Result<(), StationError> {
        self.expect_state("start", &[StationState::Configured])?;

        let dispatch = logging::current_subscriber();
        self.started_at = self.context.clock.elapsed();
        self.state = StationState::Running;

        for index in 0..self.actors.len() {
            let slot = &mut self.actors[index];
            let id = slot.id;
            let mut actor = StationActor::new(id, Arc::clone(&slot.usage));
            let context = Arc::clone(&self.context);
            let dispatch = dispatch.clone();

            let spawned = thread::Builder::new()
                .name(format!("actor-{}", id))
                .spawn(move || {
                    tracing::dispatcher::with_default(&dispatch, || actor.run(&context))
                });

            match spawned {
                Ok(handle) => slot.handle = Some(handle),
                Err(source) => {
                    log_error!(source, actor = %id, "failed to spawn actor thread");
                    self.stop_and_join()?;
                    return Err(StationError::ThreadSpawn { actor: id, source });
                }
            }
        }

        log_system!("start", "completed", run_id = %self.run_id, actors = self.actors.len());
        Ok(())
    }

    /// Keeps the station open for `duration` of clock time.
    ///
    /// This is the only thing that decides how long a run lasts. It returns
    /// early only if the stop signal is raised through a [`StopHandle`].
    pub fn run_for(&self, duration: Duration) -> Result<(), StationError> {
        self.expect_state("run", &[StationState::Running])?;

        let interrupted = self
            .context
            .stop
            .wait_timeout(self.context.clock.to_wall(duration));
        if interrupted {
            info!(run_id = %self.run_id, "run window ended early by stop request");
        }
        Ok(())
    }

    /// Raises the stop signal and joins every actor thread.
    ///
    /// Calling it again after the join is a no-op.
    pub fn stop_and_join(&mut self) -> Result<(), StationError> {
        if matches!(self.state, StationState::Stopped | StationState::Reported) {
            return Ok(());
        }

        self.context.raise_stop();

        for slot in &mut self.actors {
            let Some(handle) = slot.handle.take() else {
                continue;
            };
            let exit = match handle.join() {
                Ok(exit) => exit,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    log_error!(message, actor = %slot.id, "actor thread panicked");
                    let exit = ActorExit::Panicked(message);
                    self.context.journal.record(|| ServiceEvent::Exited {
                        actor: slot.id,
                        exit: exit.clone(),
                    });
                    exit
                }
            };
            slot.exit = Some(exit);
        }

        self.elapsed = self.context.clock.elapsed().saturating_sub(self.started_at);
        self.journal = self.context.journal.drain();
        self.state = StationState::Stopped;

        log_system!(
            "stop",
            "completed",
            run_id = %self.run_id,
            elapsed_ms = self.elapsed.as_millis() as u64
        );
        Ok(())
    }

    /// Reads the final per-actor and per-resource counters.
    ///
    /// Only available once every actor has been joined; reading again returns
    /// the same counts.
    pub fn report(&mut self) -> Result<StationReport, StationError> {
        self.expect_state("report", &[StationState::Stopped, StationState::Reported])?;

        let actors = self
            .actors
            .iter()
            .map(|slot| slot.usage.readout(&self.config.actor_label, slot.id.get()))
            .collect();
        let resources = self
            .context
            .pool
            .resources()
            .map(|resource| {
                resource
                    .usage()
                    .readout(&self.config.resource_label, resource.id().get())
            })
            .collect();
        let outcomes = self
            .actors
            .iter()
            .filter_map(|slot| {
                slot.exit.clone().map(|exit| ActorOutcome {
                    actor: slot.id,
                    exit,
                })
            })
            .collect();

        let report = StationReport {
            run_id: self.run_id,
            elapsed: self.elapsed,
            actors,
            resources,
            outcomes,
        };

        if !report.is_conserved() {
            warn!(
                actor_total = report.actor_total(),
                resource_total = report.resource_total(),
                "actor and resource service counts differ"
            );
        }
        log_system!(
            "report",
            "completed",
            run_id = %self.run_id,
            services = report.resource_total(),
            faulted = report.faulted().count()
        );

        self.state = StationState::Reported;
        Ok(report)
    }

    /// Service journal of the run; empty unless `record_journal` was set.
    pub fn journal(&self) -> Result<&[ServiceEvent], StationError> {
        self.expect_state("read journal", &[StationState::Stopped, StationState::Reported])?;
        Ok(&self.journal)
    }

    /// Drains the pool and checks every resource came back exactly once.
    pub fn teardown(self) -> Result<(), StationError> {
        self.expect_state("tear down", &[StationState::Reported])?;

        let expected = self.context.pool.capacity();
        let recovered = self.context.pool.drain();
        let distinct: BTreeSet<_> = recovered
            .iter()
            .filter(|id| self.context.pool.resource(**id).is_some())
            .collect();

        if recovered.len() != expected || distinct.len() != expected {
            error!(
                expected,
                recovered = recovered.len(),
                "pool did not recover every resource"
            );
            return Err(StationError::ResourceLeak {
                expected,
                recovered: recovered.len(),
            });
        }

        log_system!("teardown", "completed", run_id = %self.run_id, resources = expected);
        Ok(())
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[StationState],
    ) -> Result<(), StationError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(StationError::InvalidState {
                operation,
                state: self.state.as_str(),
            })
        }
    }
}

impl Drop for Station {
    /// A station dropped mid-run stops and joins its actors first.
    fn drop(&mut self) {
        if self.state != StationState::Running {
            return;
        }
        warn!(run_id = %self.run_id, "station dropped while running");
        if let Err(err) = self.stop_and_join() {
            log_error!(err, run_id = %self.run_id, "failed to stop dropped station");
        }
    }
}

fn to_u32(count: usize) -> Result<u32, StationError> {
    u32::try_from(count)
        .map_err(|_| StationError::InvalidConfig(format!("count {} does not fit in 32 bits", count)))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}
