use std::time::Duration;

use thiserror::Error;
use turnstile_api::errors::ActorFault;
use turnstile_api::types::{ActorId, ResourceId};

/// Errors related to queue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue is empty")]
    Empty,
    #[error("No item arrived within {0:?}")]
    Timeout(Duration),
}

/// Errors related to the resource pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool handed out an unknown resource handle: {0}")]
    InvalidHandle(ResourceId),
    #[error("Handle {0} names a pooled resource and cannot be injected")]
    KnownHandle(ResourceId),
}

/// Errors related to the station itself.
#[derive(Error, Debug)]
pub enum StationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Cannot {operation} while station is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    #[error("Failed to spawn thread for actor {actor}: {source}")]
    ThreadSpawn {
        actor: ActorId,
        #[source]
        source: std::io::Error,
    },
    #[error("Resource leak: expected {expected} handles back in the pool, recovered {recovered}")]
    ResourceLeak { expected: usize, recovered: usize },
}

impl From<PoolError> for ActorFault {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::InvalidHandle(id) | PoolError::KnownHandle(id) => {
                ActorFault::InvalidHandle(id)
            }
        }
    }
}
