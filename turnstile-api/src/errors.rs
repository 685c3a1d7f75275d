//! # Actor Fault Types
//!
//! Faults are internal defects observed by a single actor. They are never
//! runtime conditions a caller can recover from: the affected actor logs the
//! fault and leaves its worker loop early. Other actors and the station keep
//! running, and the station still joins the faulted thread normally.
//!
//! ## Usage Example
//!
//! ```rust
//! use turnstile_api::{ActorFault, ResourceId};
//!
//! let fault = ActorFault::InvalidHandle(ResourceId::new(9));
//! assert_eq!(fault.to_string(), "Invalid resource handle acquired: 9");
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::types::{ActorId, ResourceId};

/// Defect that ends one actor's worker loop.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorFault {
    /// The pool handed out an id that does not name any resource.
    #[error("Invalid resource handle acquired: {0}")]
    InvalidHandle(ResourceId),

    /// The actor popped the head of the admission queue and found someone else.
    ///
    /// Only the head-of-line actor ever pops the queue, so this means the
    /// queue's membership invariant was broken.
    #[error("Admission queue out of turn: expected {expected}, found {found:?}")]
    OutOfTurn {
        expected: ActorId,
        found: Option<ActorId>,
    },
}
