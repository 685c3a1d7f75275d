// Turnstile Station Implementation
//
// This crate provides a thread-based implementation of the Turnstile station
// API: one OS thread per actor, a shared FIFO admission queue and a shared
// resource pool.

pub mod logging;
pub mod thread;

// Re-export commonly used types
pub use thread::{
    BoundedFifoQueue, Journal, PoolError, QueueError, Resource, ResourceLease, ResourcePool,
    ScaledClock, Station, StationActor, StationConfig, StationContext, StationError,
    StationState, StopHandle, StopSignal, SystemClock, UsageCounter, WaitStrategy,
};
pub use turnstile_api::{
    Actor, ActorExit, ActorFault, ActorId, ActorOutcome, ActorState, Clock, ResourceId,
    ServiceEvent, StationReport, UsageLine,
};
