//! Retry driver: run an attempt until success, permanent failure, or budget
//! exhaustion.

use std::fmt;

use crate::context::{sleep_while_live, RequestContext};

use super::error::RetryError;
use super::policy::RetryPolicy;

/// Runs `op` until it succeeds, fails permanently, or the policy's schedule
/// runs out of delays. Transient failures sleep for the scheduled delay
/// (cancellable through `ctx`) and try again; a context that dies mid-sleep
/// gives up with the last error.
pub fn retry_with<T, E, F>(
    policy: &dyn RetryPolicy,
    ctx: &RequestContext,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: fmt::Display,
    F: FnMut() -> Result<T, RetryError<E>>,
{
    let mut schedule = policy.schedule();
    let mut attempt = 1u32;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err @ RetryError::Permanent(_)) => return Err(err),
            Err(RetryError::Transient(e)) => {
                let delay = match schedule.next_backoff() {
                    Some(delay) => delay,
                    None => return Err(RetryError::Transient(e)),
                };
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, backing off: {}",
                    e
                );
                if sleep_while_live(ctx, delay).is_err() {
                    return Err(RetryError::Transient(e));
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Backoff;
    use std::time::Duration;

    /// Policy whose schedules yield `n` zero-length delays then give up.
    struct FixedRetries(u32);

    struct CountDown(u32);

    impl Backoff for CountDown {
        fn next_backoff(&mut self) -> Option<Duration> {
            if self.0 == 0 {
                None
            } else {
                self.0 -= 1;
                Some(Duration::ZERO)
            }
        }
    }

    impl RetryPolicy for FixedRetries {
        fn schedule(&self) -> Box<dyn Backoff + Send> {
            Box::new(CountDown(self.0))
        }
    }

    #[test]
    fn transient_failures_are_retried_until_success() {
        let ctx = RequestContext::background();
        let mut calls = 0u32;
        let result: Result<u32, RetryError<String>> = retry_with(&FixedRetries(5), &ctx, || {
            calls += 1;
            if calls < 3 {
                Err(RetryError::Transient("reset".to_string()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn permanent_failure_stops_immediately() {
        let ctx = RequestContext::background();
        let mut calls = 0u32;
        let result: Result<(), RetryError<String>> = retry_with(&FixedRetries(5), &ctx, || {
            calls += 1;
            Err(RetryError::Permanent("bad request".to_string()))
        });
        assert!(matches!(result, Err(RetryError::Permanent(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn exhausted_schedule_returns_last_transient() {
        let ctx = RequestContext::background();
        let mut calls = 0u32;
        let result: Result<(), RetryError<String>> = retry_with(&FixedRetries(2), &ctx, || {
            calls += 1;
            Err(RetryError::Transient(format!("attempt {}", calls)))
        });
        match result {
            Err(RetryError::Transient(msg)) => assert_eq!(msg, "attempt 3"),
            other => panic!("expected transient exhaustion, got {:?}", other.map(|_| ())),
        }
        assert_eq!(calls, 3);
    }

    #[test]
    fn canceled_context_stops_between_attempts() {
        let (ctx, handle) = RequestContext::with_cancel();
        let policy = crate::retry::ExponentialBackoff {
            initial_interval: Duration::from_secs(60),
            randomization_factor: 0.0,
            multiplier: 1.0,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: None,
        };
        let mut calls = 0u32;
        let result: Result<(), RetryError<String>> = retry_with(&policy, &ctx, || {
            calls += 1;
            handle.cancel();
            Err(RetryError::Transient("reset".to_string()))
        });
        assert!(matches!(result, Err(RetryError::Transient(_))));
        assert_eq!(calls, 1, "the 60s sleep must abort on cancellation");
    }
}
