//! Reproducible environment for seeded runs.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::env::Environment;

/// Environment whose randomness comes from a seeded ChaCha stream.
///
/// Time and sleeping are real; only the random draws are reproducible. Clones
/// share one stream, so the sequence depends on the order of draws across
/// threads. The worker start order is drawn before any thread starts and is
/// therefore fully determined by the seed.
#[derive(Debug, Clone)]
pub struct SeededEnv {
    seed: u64,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SeededEnv {
    /// Create an environment seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        tracing::info!("seeded environment, seed={}", seed);
        Self { seed, rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))) }
    }

    /// The seed this environment was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Environment for SeededEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().fill_bytes(buffer);
    }
}
