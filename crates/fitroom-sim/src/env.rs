//! Environment abstraction for the driver.
//!
//! Worker threads never touch the clock, `thread::sleep` or an RNG directly;
//! they go through an [`Environment`]. A seeded environment makes the start
//! order and dwell draws of a run reproducible, the system environment uses
//! OS entropy.
//!
//! Implementations must keep `now()` monotonic and, when seeded, produce the
//! same random stream for the same seed.

use std::time::{Duration, Instant};

/// Clock, blocking sleep and randomness for one run.
///
/// One value is shared by every worker thread of the run.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current time. Never earlier than a previous call.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Draw a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut raw = [0u8; 8];
        self.random_bytes(&mut raw);
        u64::from_le_bytes(raw)
    }

    /// Draw a value in `0..bound`; 0 when `bound` is 0.
    fn random_below(&self, bound: u64) -> u64 {
        if bound == 0 { 0 } else { self.random_u64() % bound }
    }
}
