use std::time::{Duration, Instant};

use turnstile_api::clock::Clock;

/// Wall-clock time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock running `factor` times faster than wall time.
///
/// A one second run window with a 30ms service time on a `ScaledClock::new(4)`
/// lasts 250ms of wall time with 7.5ms holds, and journal timestamps still
/// read as if the full second had passed.
#[derive(Debug, Clone)]
pub struct ScaledClock {
    origin: Instant,
    factor: u32,
}

impl ScaledClock {
    /// # Panics
    /// Panics if `factor` is zero.
    pub fn new(factor: u32) -> Self {
        assert!(factor > 0, "clock scale factor must be at least 1");
        Self {
            origin: Instant::now(),
            factor,
        }
    }
}

impl Clock for ScaledClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed() * self.factor
    }

    fn to_wall(&self, span: Duration) -> Duration {
        span / self.factor
    }
}
