//! Error taxonomy for request execution.

use std::fmt;

use thiserror::Error;

use crate::context::ContextError;
use crate::transport::TransportError;

/// A 4xx response, classified as a permanent (non-retryable) failure.
/// Carries the status code and the drained body text; the body is empty when
/// draining itself failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    pub code: u16,
    pub body: String,
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            write!(f, "failed HTTP call: {}", self.code)
        } else {
            write!(f, "failed HTTP call: {}: {}", self.code, self.body)
        }
    }
}

impl std::error::Error for StatusError {}

/// Final error surfaced by [`Client::execute`](crate::Client::execute).
#[derive(Debug, Error)]
pub enum Error {
    /// The context was canceled or expired before the waiter admitted us.
    /// Terminal: further attempts are pointless.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// Transport-level failure (connection, DNS, timeout). Transient.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    /// 4xx response. Permanent.
    #[error(transparent)]
    Status(#[from] StatusError),
    /// The retry driver gave up; wraps the last underlying error.
    #[error("exhausted all retries: {0}")]
    RetriesExhausted(#[source] Box<Error>),
}

impl Error {
    /// The classified status error, digging through retry wrapping.
    pub fn status(&self) -> Option<&StatusError> {
        match self {
            Error::Status(e) => Some(e),
            Error::RetriesExhausted(inner) => inner.status(),
            _ => None,
        }
    }

    /// True for failures the retry driver may re-attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
