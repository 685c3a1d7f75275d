//! # Clock
//!
//! Every wait in a station (service holds, poll delays, the run window) and
//! every journal timestamp goes through a [`Clock`]. Implementations decide
//! how clock time maps to wall time, which lets tests run a long simulated
//! window in a short real one.

use std::fmt;
use std::time::Duration;

/// Source of station time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Clock time elapsed since the clock was created.
    fn elapsed(&self) -> Duration;

    /// Wall time a span of clock time lasts.
    fn to_wall(&self, span: Duration) -> Duration {
        span
    }

    /// Block the calling thread for `span` of clock time.
    fn sleep(&self, span: Duration) {
        let wall = self.to_wall(span);
        if !wall.is_zero() {
            std::thread::sleep(wall);
        }
    }
}
