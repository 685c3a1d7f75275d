use serde::Serialize;

use crate::errors::ActorFault;
use crate::types::ActorId;

/// Actor lifecycle state
///
/// An actor enqueues once, then cycles
/// `WaitingTurn -> WaitingResource -> InService -> Requeuing` until it
/// observes the stop signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActorState {
    Enqueuing,
    WaitingTurn,
    WaitingResource,
    InService,
    Requeuing,
    Stopped,
    Faulted,
}

impl ActorState {
    /// Whether the worker loop has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, ActorState::Stopped | ActorState::Faulted)
    }

    /// Whether the actor currently holds a resource.
    pub fn holds_resource(self) -> bool {
        matches!(self, ActorState::InService | ActorState::Requeuing)
    }
}

/// How an actor thread ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "exit", content = "detail", rename_all = "snake_case")]
pub enum ActorExit {
    /// Observed the stop signal and left the loop.
    Stopped,
    /// Hit an internal defect and left early, abandoning its place in line.
    Faulted(ActorFault),
    /// The actor thread panicked; carries the panic message.
    Panicked(String),
}

impl ActorExit {
    pub fn is_clean(&self) -> bool {
        matches!(self, ActorExit::Stopped)
    }
}

/// Core Actor trait
///
/// An actor has a single capability: running its worker loop against the
/// station state it is handed. The loop returns when the actor is done.
pub trait Actor: Send + 'static {
    /// Shared station state the worker loop runs against.
    type Context: ?Sized + Send + Sync;

    /// The actor's identity.
    fn id(&self) -> ActorId;

    /// Run the worker loop until the stop signal is observed or a defect ends it.
    fn run(&mut self, ctx: &Self::Context) -> ActorExit;

    /// Get Actor state
    fn state(&self) -> ActorState;
}
