//! Outbound rate limiting: the waiter gate and a token-bucket limiter.
//!
//! The waiter is the only intended point of cross-call coordination in the
//! client; everything else in a request's life is call-local.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::context::{sleep_while_live, ContextError, RequestContext};

/// Blocks until outbound traffic is admitted, or fails with the context
/// error if the context is canceled or past its deadline first.
pub trait Waiter: Send + Sync {
    fn wait(&self, ctx: &RequestContext) -> Result<(), ContextError>;
}

/// Token bucket: `rate` admissions per second with `burst` capacity.
/// Safe for concurrent use; admission order under contention is whoever
/// refills first, not call-site FIFO.
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// `rate` admissions per second, up to `burst` immediately available.
    /// Both are clamped to sane minimums (rate > 0, burst >= 1).
    pub fn new(rate: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            rate: rate.max(f64::MIN_POSITIVE),
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }
}

/// The opinionated default: 1 request per second, burst 1.
impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(1.0, 1)
    }
}

impl Waiter for RateLimiter {
    fn wait(&self, ctx: &RequestContext) -> Result<(), ContextError> {
        loop {
            ctx.done()?;
            let shortfall = {
                let mut state = self.state.lock().unwrap();
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
                state.last_refill = now;
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return Ok(());
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
            };
            // Another caller may win the refilled token; re-check after waking.
            sleep_while_live(ctx, shortfall)?;
        }
    }
}
