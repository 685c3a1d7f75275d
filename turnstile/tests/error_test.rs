// Integration tests for error types in turnstile::thread::error

use std::error::Error;
use std::io;
use std::time::Duration;

use turnstile::thread::error::*;
use turnstile::{ActorFault, ActorId, ResourceId};

#[test]
fn test_queue_error_display() {
    assert_eq!(QueueError::Empty.to_string(), "Queue is empty");
    assert_eq!(
        QueueError::Timeout(Duration::from_millis(50)).to_string(),
        "No item arrived within 50ms"
    );
}

#[test]
fn test_pool_error_display() {
    assert_eq!(
        PoolError::InvalidHandle(ResourceId::new(7)).to_string(),
        "Pool handed out an unknown resource handle: 7"
    );
    assert_eq!(
        PoolError::KnownHandle(ResourceId::new(1)).to_string(),
        "Handle 1 names a pooled resource and cannot be injected"
    );
}

#[test]
fn test_station_error_display() {
    assert_eq!(
        StationError::InvalidConfig("actor_count must be at least 1".to_string()).to_string(),
        "Invalid configuration: actor_count must be at least 1"
    );
    assert_eq!(
        StationError::InvalidState {
            operation: "report",
            state: "running"
        }
        .to_string(),
        "Cannot report while station is running"
    );
    assert_eq!(
        StationError::ResourceLeak {
            expected: 2,
            recovered: 1
        }
        .to_string(),
        "Resource leak: expected 2 handles back in the pool, recovered 1"
    );
}

#[test]
fn test_thread_spawn_error_keeps_source() {
    let err = StationError::ThreadSpawn {
        actor: ActorId::new(4),
        source: io::Error::new(io::ErrorKind::Other, "no more threads"),
    };
    assert_eq!(
        err.to_string(),
        "Failed to spawn thread for actor 4: no more threads"
    );
    assert_eq!(err.source().map(|s| s.to_string()), Some("no more threads".to_string()));
}

#[test]
fn test_pool_error_becomes_actor_fault() {
    let fault: ActorFault = PoolError::InvalidHandle(ResourceId::new(9)).into();
    assert_eq!(fault, ActorFault::InvalidHandle(ResourceId::new(9)));
    assert_eq!(fault.to_string(), "Invalid resource handle acquired: 9");
}

#[test]
fn test_station_error_into_anyhow() {
    let err: anyhow::Error = StationError::InvalidConfig("bad".to_string()).into();
    assert!(err.to_string().contains("bad"));
}
