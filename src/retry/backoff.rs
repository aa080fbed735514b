//! Backoff schedules: the delay sequence consumed by the retry driver.

use std::time::{Duration, Instant};

use rand::Rng;

use super::policy::ExponentialBackoff;

/// A sequence of inter-attempt delays. `None` means the budget is spent and
/// the driver must give up.
pub trait Backoff {
    fn next_backoff(&mut self) -> Option<Duration>;
}

/// Running state for one [`ExponentialBackoff`] policy: grows the interval
/// by `multiplier` up to `max_interval`, jitters each delay by
/// `randomization_factor`, and stops once `max_elapsed_time` has passed
/// since the first delay was requested.
#[derive(Debug)]
pub struct ExponentialSchedule {
    policy: ExponentialBackoff,
    current_interval: Duration,
    started: Option<Instant>,
}

impl ExponentialSchedule {
    pub fn new(policy: ExponentialBackoff) -> Self {
        Self {
            current_interval: policy.initial_interval,
            policy,
            started: None,
        }
    }
}

impl Backoff for ExponentialSchedule {
    fn next_backoff(&mut self) -> Option<Duration> {
        let started = *self.started.get_or_insert_with(Instant::now);
        if let Some(budget) = self.policy.max_elapsed_time {
            if started.elapsed() >= budget {
                return None;
            }
        }
        let delay = jitter(self.current_interval, self.policy.randomization_factor);
        let next = self
            .current_interval
            .mul_f64(self.policy.multiplier.max(1.0));
        self.current_interval = next.min(self.policy.max_interval);
        Some(delay)
    }
}

/// Spreads `interval` uniformly across `interval * (1 ± factor)` so
/// concurrent callers do not all retry at the same moment.
fn jitter(interval: Duration, factor: f64) -> Duration {
    if factor <= 0.0 {
        return interval;
    }
    let factor = factor.min(1.0);
    let scale = rand::thread_rng().gen_range(1.0 - factor..=1.0 + factor);
    interval.mul_f64(scale)
}
