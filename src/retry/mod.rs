//! Retry with exponential backoff.
//!
//! This module encapsulates the tagged transient/permanent failure type, the
//! backoff schedule, and the driver loop, so the client only decides which
//! failures are permanent and hands the attempt closure over.

mod backoff;
mod error;
mod policy;
mod run;

pub use backoff::{Backoff, ExponentialSchedule};
pub use error::RetryError;
pub use policy::{ExponentialBackoff, RetryPolicy};
pub use run::retry_with;
