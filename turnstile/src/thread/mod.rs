#![doc = " Thread-based station implementation for Turnstile."]

pub mod actor;
pub mod clock;
pub mod config;
pub mod counter;
pub mod error;
pub mod journal;
pub mod pool;
pub mod queue;
pub mod signal;
pub mod station;

// Re-export key types for easier usage
pub use actor::StationActor;
pub use clock::{ScaledClock, SystemClock};
pub use config::{StationConfig, WaitStrategy};
pub use counter::UsageCounter;
pub use error::{PoolError, QueueError, StationError};
pub use journal::Journal;
pub use pool::{Resource, ResourceLease, ResourcePool};
pub use queue::BoundedFifoQueue;
pub use signal::StopSignal;
pub use station::{Station, StationContext, StationState, StopHandle};
