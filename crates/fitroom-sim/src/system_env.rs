//! Production environment using system time and OS randomness.

use std::time::{Duration, Instant};

use crate::env::Environment;

/// Environment backed by the real clock, `thread::sleep` and `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// System environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // Zeros mean an unshuffled start order and minimum dwell times.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}
