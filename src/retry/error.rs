//! Tagged failure consumed at the retry-driver boundary.

use std::fmt;

/// A failed attempt, tagged with whether the driver may try again.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Eligible for another attempt (e.g. connection failure).
    Transient(E),
    /// The driver must stop and surface this immediately (e.g. 4xx).
    Permanent(E),
}

impl<E> RetryError<E> {
    /// The underlying error, tag stripped.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Transient(e) | RetryError::Permanent(e) => e,
        }
    }

    pub fn inner(&self) -> &E {
        match self {
            RetryError::Transient(e) | RetryError::Permanent(e) => e,
        }
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, RetryError::Permanent(_))
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner())
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner())
    }
}
