use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Station-wide stop signal.
///
/// Starts lowered, is raised at most once and never reset. Actors read it
/// lock-free on every loop iteration; the orchestrator can additionally block
/// on it with a timeout so an external stop cuts the run window short.
#[derive(Debug, Default)]
pub struct StopSignal {
    raised: AtomicBool,
    /// Mirror of `raised` for waiters
    gate: Mutex<bool>,
    on_raise: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal.
    ///
    /// # Returns
    /// `true` for the call that raised it, `false` if it was already raised.
    pub fn raise(&self) -> bool {
        if self.raised.swap(true, Ordering::SeqCst) {
            return false;
        }
        let mut gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        *gate = true;
        self.on_raise.notify_all();
        true
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Blocks for at most `timeout` of wall time, or until the signal is raised.
    ///
    /// # Returns
    /// `true` if the signal was raised before the timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let (gate, _) = self
            .on_raise
            .wait_timeout_while(gate, timeout, |raised| !*raised)
            .unwrap_or_else(PoisonError::into_inner);
        *gate
    }
}
