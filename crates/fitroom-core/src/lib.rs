//! Fitroom synchronization core.
//!
//! Coordinates workers of two mutually exclusive categories competing for a
//! room with a fixed number of slots. Three classic patterns compose into a
//! deadlock- and starvation-free protocol:
//!
//! - Lightswitch ([`CategoryGate`]): the first worker of a category in takes
//!   the [`ExclusionLock`], the last one out releases it.
//! - Turnstile ([`FairnessGate`]): every arrival passes single-file, so a
//!   worker blocked on the exclusion lock stops everyone behind it.
//! - Multiplexer ([`CapacityLimiter`]): bounds same-category occupancy to the
//!   room capacity.
//!
//! ## Architecture
//!
//! ```text
//! Room
//!   ├─ FairnessGate       (turnstile, shared)
//!   ├─ CategoryGate x2    (lightswitch per category)
//!   ├─ ExclusionLock      (held by the occupying category)
//!   ├─ CapacityLimiter x2 (multiplexer per category)
//!   └─ RoomState          (occupancy, ids, event emission)
//! ```
//!
//! The core owns no threads. A driver spawns workers, each calling
//! [`Room::enter`] (or [`Room::visit`]) and observing occupancy changes via a
//! [`RoomObserver`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod category;
mod config;
mod error;
mod event;
mod exclusion;
mod lightswitch;
mod multiplexer;
mod room;
mod state;
mod turnstile;
mod wait;
mod worker;

pub use category::Category;
pub use config::RoomConfig;
pub use error::{ConfigError, RoomError, Violation};
pub use event::{NoopObserver, ObserverSet, RoomEvent, RoomObserver};
pub use exclusion::ExclusionLock;
pub use lightswitch::CategoryGate;
pub use multiplexer::CapacityLimiter;
pub use room::{Occupant, Room, RoomSnapshot};
pub use state::{Admission, Departure, RoomState};
pub use turnstile::FairnessGate;
pub use wait::{Deadline, WaitPolicy, WaitStage};
pub use worker::{WorkerId, WorkerState};
