use std::sync::atomic::{AtomicU64, Ordering};

use turnstile_api::report::UsageLine;

/// Monotonic usage counter attached to an actor or a resource.
///
/// Increments are atomic. The count is only meaningful for reporting once the
/// thread that increments it has been joined; reads before that see an
/// in-flight value.
#[derive(Debug, Default)]
pub struct UsageCounter {
    count: AtomicU64,
}

impl UsageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one use and returns the new count.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Final readout line for the entity this counter belongs to.
    pub fn readout(&self, label: &str, id: u32) -> UsageLine {
        UsageLine::new(label, id, self.get())
    }
}
