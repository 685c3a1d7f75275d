//! # Station Report
//!
//! Final counters of a run, read by the station strictly after every actor
//! thread has been joined. The report's [`Display`](std::fmt::Display) form is
//! one line per actor followed by one line per resource:
//!
//! ```text
//! Car 1 filled up 97 times
//! Pump 1 filled up 486 times
//! ```

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::actor::ActorExit;
use crate::types::{ActorId, ResourceId};

/// Final usage count of a single actor or resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageLine {
    /// Kind label, such as "Car" or "Pump".
    pub label: String,
    pub id: u32,
    pub count: u64,
}

impl UsageLine {
    pub fn new(label: impl Into<String>, id: u32, count: u64) -> Self {
        Self {
            label: label.into(),
            id,
            count,
        }
    }
}

impl fmt::Display for UsageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} filled up {} times", self.label, self.id, self.count)
    }
}

/// How a given actor's thread ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorOutcome {
    pub actor: ActorId,
    pub exit: ActorExit,
}

/// Final counters of one station run.
#[derive(Debug, Clone, Serialize)]
pub struct StationReport {
    /// Identifies the run in logs.
    pub run_id: Uuid,
    /// Clock time between start and the end of the join.
    pub elapsed: Duration,
    pub actors: Vec<UsageLine>,
    pub resources: Vec<UsageLine>,
    pub outcomes: Vec<ActorOutcome>,
}

impl StationReport {
    /// Total service count seen from the actors' side.
    pub fn actor_total(&self) -> u64 {
        self.actors.iter().map(|line| line.count).sum()
    }

    /// Total service count seen from the resources' side.
    pub fn resource_total(&self) -> u64 {
        self.resources.iter().map(|line| line.count).sum()
    }

    /// Every service increments exactly one actor and one resource counter.
    pub fn is_conserved(&self) -> bool {
        self.actor_total() == self.resource_total()
    }

    pub fn actor_count(&self, actor: ActorId) -> Option<u64> {
        self.actors
            .iter()
            .find(|line| line.id == actor.get())
            .map(|line| line.count)
    }

    pub fn resource_count(&self, resource: ResourceId) -> Option<u64> {
        self.resources
            .iter()
            .find(|line| line.id == resource.get())
            .map(|line| line.count)
    }

    /// Actors that did not end by observing the stop signal.
    pub fn faulted(&self) -> impl Iterator<Item = &ActorOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.exit.is_clean())
    }
}

impl fmt::Display for StationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.actors.iter().chain(self.resources.iter()) {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
