//! Backoff policy: the configuration side of the retry schedule.

use std::time::Duration;

use super::backoff::{Backoff, ExponentialSchedule};

/// Factory for per-call backoff schedules.
///
/// The client is immutable and may run many calls concurrently, so each
/// `execute` call mints its own schedule instead of mutating shared state.
pub trait RetryPolicy: Send + Sync {
    fn schedule(&self) -> Box<dyn Backoff + Send>;
}

/// Exponential backoff with jitter, an interval cap, and a total elapsed-time
/// budget after which the driver gives up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Fraction of jitter applied to each delay (0.0 = deterministic).
    pub randomization_factor: f64,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Upper bound on a single delay.
    pub max_interval: Duration,
    /// Total time across attempts before giving up (None = unbounded).
    pub max_elapsed_time: Option<Duration>,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            randomization_factor: 0.5,
            multiplier: 1.5,
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn schedule(&self) -> Box<dyn Backoff + Send> {
        Box::new(ExponentialSchedule::new(*self))
    }
}
