//! Run configuration.

use std::num::NonZeroUsize;

use crate::{category::Category, error::ConfigError};

/// Validated room configuration: capacity plus worker counts per category.
///
/// Construction is the only validation point; a `RoomConfig` value is
/// always runnable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    capacity: NonZeroUsize,
    workers: [usize; 2],
}

impl RoomConfig {
    /// Validate raw user input.
    ///
    /// # Errors
    ///
    /// - `ConfigError::NonPositiveCapacity` if `capacity <= 0`
    /// - `ConfigError::NegativeWorkers` if either count is negative
    /// - `ConfigError::NoWorkers` if both counts are zero
    pub fn new(capacity: i64, blue_workers: i64, green_workers: i64) -> Result<Self, ConfigError> {
        let capacity = Self::check_capacity(capacity)?;
        let workers = [
            Self::check_workers(Category::Blue, blue_workers)?,
            Self::check_workers(Category::Green, green_workers)?,
        ];

        if workers == [0, 0] {
            return Err(ConfigError::NoWorkers);
        }

        Ok(Self { capacity, workers })
    }

    /// Validate a capacity on its own, for callers that collect values one
    /// at a time.
    ///
    /// # Errors
    ///
    /// `ConfigError::NonPositiveCapacity` if `capacity <= 0`.
    pub fn check_capacity(capacity: i64) -> Result<NonZeroUsize, ConfigError> {
        if capacity <= 0 {
            return Err(ConfigError::NonPositiveCapacity(capacity));
        }

        to_usize("capacity", capacity)
            .and_then(|c| NonZeroUsize::new(c).ok_or(ConfigError::NonPositiveCapacity(capacity)))
    }

    /// Validate one category's worker count on its own.
    ///
    /// # Errors
    ///
    /// `ConfigError::NegativeWorkers` if `count < 0`.
    pub fn check_workers(category: Category, count: i64) -> Result<usize, ConfigError> {
        if count < 0 {
            return Err(ConfigError::NegativeWorkers { category, count });
        }

        let field = match category {
            Category::Blue => "blue workers",
            Category::Green => "green workers",
        };
        to_usize(field, count)
    }

    /// Number of slots in the room.
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Workers of `category` to run.
    pub fn workers(&self, category: Category) -> usize {
        self.workers[category.index()]
    }

    /// Workers of both categories.
    pub fn total_workers(&self) -> usize {
        self.workers.iter().sum()
    }
}

fn to_usize(field: &'static str, value: i64) -> Result<usize, ConfigError> {
    usize::try_from(value).map_err(|_| ConfigError::OutOfRange { field, value })
}
