//! # Turnstile Station API
//!
//! Turnstile models a bounded shared-resource station: a fixed set of actors
//! repeatedly line up for, acquire, use and release a smaller fixed pool of
//! reusable resources while the station counts every use.
//!
//! This crate holds the abstract layer shared by station implementations. It
//! has no threads and no synchronization of its own.
//!
//! ## Core Components
//!
//! - **Identities**: [`ActorId`] and [`ResourceId`], stable small integers
//! - **Actors**: the [`Actor`] trait and its lifecycle ([`ActorState`], [`ActorExit`])
//! - **Time**: the [`Clock`] trait every wait and timestamp goes through
//! - **Faults**: [`ActorFault`], defects that end a single actor early
//! - **Journal**: [`ServiceEvent`], the optional record of a run
//! - **Reporting**: [`UsageLine`] and [`StationReport`], the final counters
//!
//! ## Usage Example
//!
//! ```rust
//! use turnstile_api::{ActorId, UsageLine};
//!
//! let line = UsageLine::new("Car", ActorId::new(3).get(), 12);
//! assert_eq!(line.to_string(), "Car 3 filled up 12 times");
//! ```
//!
//! ## Module Organization
//!
//! - [`actor`]: actor trait and lifecycle states
//! - [`clock`]: time source abstraction
//! - [`errors`]: actor fault taxonomy
//! - [`event`]: service journal events
//! - [`report`]: final usage report
//! - [`types`]: identities

pub mod actor;
pub mod clock;
pub mod errors;
pub mod event;
pub mod report;
pub mod types;

pub use actor::{Actor, ActorExit, ActorState};
pub use clock::Clock;
pub use errors::ActorFault;
pub use event::ServiceEvent;
pub use report::{ActorOutcome, StationReport, UsageLine};
pub use types::{ActorId, ResourceId};
