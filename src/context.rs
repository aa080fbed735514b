//! Request cancellation: shared cancel flag plus optional deadline.
//!
//! A `RequestContext` is the single cancellation channel for one request.
//! The waiter polls it while blocked, the curl transport polls it from its
//! progress callback, and the retry driver polls it between attempts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Why a context stopped being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("request canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation state shared between a request and whoever may abort it.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    canceled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            canceled: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Context with an explicit cancel handle (e.g. wired to a ctrl-c handler).
    pub fn with_cancel() -> (Self, CancelHandle) {
        let ctx = Self::background();
        let handle = CancelHandle {
            canceled: Arc::clone(&ctx.canceled),
        };
        (ctx, handle)
    }

    /// Adds a deadline to an existing context, keeping its cancel flag.
    pub fn and_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Ok while the context is live; the cancellation or deadline error once done.
    pub fn done(&self) -> Result<(), ContextError> {
        if self.canceled.load(Ordering::Relaxed) {
            return Err(ContextError::Canceled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ContextError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline (None = unbounded).
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

/// Cancels the associated context. Cloneable and thread-safe.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    canceled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Relaxed);
    }
}

/// Granularity of cancellation checks while sleeping.
const POLL_SLICE: Duration = Duration::from_millis(10);

/// Sleeps for `dur`, polling the context. Returns early with the context
/// error if it is canceled or expires before the sleep completes.
pub(crate) fn sleep_while_live(ctx: &RequestContext, dur: Duration) -> Result<(), ContextError> {
    let wake = Instant::now() + dur;
    loop {
        ctx.done()?;
        let now = Instant::now();
        if now >= wake {
            return Ok(());
        }
        thread::sleep(POLL_SLICE.min(wake - now));
    }
}
