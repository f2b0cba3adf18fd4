//! Fitroom simulation driver.
//!
//! Runs the synchronization core with one OS thread per worker:
//! - Real or seeded randomness for start order and dwell times
//! - Console transcript rendering as a room observer
//! - Interactive prompting for missing configuration
//!
//! ## Architecture
//!
//! ```text
//! fitroom-sim
//!   ├─ Simulation       (config, spawn, join, report)
//!   ├─ Environment      (time, sleep, randomness)
//!   │    ├─ SystemEnv   (clock + getrandom)
//!   │    └─ SeededEnv   (ChaCha, reproducible)
//!   ├─ ConsoleRenderer  (transcript observer)
//!   └─ prompt           (stdin fallback for CLI values)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod env;
mod error;
pub mod prompt;
mod render;
mod seeded_env;
mod simulation;
mod system_env;

pub use env::Environment;
pub use error::SimError;
pub use render::ConsoleRenderer;
pub use seeded_env::SeededEnv;
pub use simulation::{DEFAULT_DWELL_MAX, DEFAULT_DWELL_MIN, DwellRange, RunReport, Simulation};
pub use system_env::SystemEnv;
