use std::time::Duration;

use serde::Serialize;

use crate::actor::ActorExit;
use crate::types::{ActorId, ResourceId};

/// One entry of the service journal.
///
/// Timestamps are clock time since the station's clock was created.
/// `Released` is recorded before a handle goes back to the pool and
/// `Acquired` after it is taken out, so for any single resource the journal
/// alternates between the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServiceEvent {
    /// Actor pushed itself onto the admission queue with the given ticket.
    Joined {
        actor: ActorId,
        ticket: u64,
        at: Duration,
    },
    Acquired {
        actor: ActorId,
        resource: ResourceId,
        at: Duration,
    },
    Released {
        actor: ActorId,
        resource: ResourceId,
        at: Duration,
    },
    Exited {
        actor: ActorId,
        exit: ActorExit,
    },
}

impl ServiceEvent {
    pub fn actor(&self) -> ActorId {
        match self {
            ServiceEvent::Joined { actor, .. }
            | ServiceEvent::Acquired { actor, .. }
            | ServiceEvent::Released { actor, .. }
            | ServiceEvent::Exited { actor, .. } => *actor,
        }
    }

    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            ServiceEvent::Acquired { resource, .. } | ServiceEvent::Released { resource, .. } => {
                Some(*resource)
            }
            _ => None,
        }
    }
}
