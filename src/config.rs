//! Tuning knobs loadable from a TOML file.
//!
//! Every section is optional: a missing `[rate_limit]` means no waiter at
//! all, a missing `[retry]` means a single attempt. The numeric defaults for
//! present-but-partial sections mirror the library presets.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientConfig;
use crate::limit::{RateLimiter, Waiter};
use crate::retry::{ExponentialBackoff, RetryPolicy};
use crate::transport::CurlTransport;

/// Retry schedule parameters (optional `[retry]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry, in milliseconds.
    pub initial_interval_ms: u64,
    /// Fraction of jitter applied to each delay (0.0 = deterministic).
    pub randomization_factor: f64,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Upper bound on a single delay, in seconds.
    pub max_interval_secs: u64,
    /// Total budget across attempts, in seconds (0 = unbounded).
    pub max_elapsed_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 500,
            randomization_factor: 0.5,
            multiplier: 1.5,
            max_interval_secs: 5,
            max_elapsed_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            randomization_factor: self.randomization_factor,
            multiplier: self.multiplier,
            max_interval: Duration::from_secs(self.max_interval_secs),
            max_elapsed_time: if self.max_elapsed_secs == 0 {
                None
            } else {
                Some(Duration::from_secs(self.max_elapsed_secs))
            },
        }
    }
}

/// Rate limit parameters (optional `[rate_limit]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Admissions per second.
    pub requests_per_sec: f64,
    /// Immediately available admissions.
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_sec: 1.0,
            burst: 1,
        }
    }
}

impl RateLimitConfig {
    pub fn to_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.requests_per_sec, self.burst)
    }
}

/// Transport parameters (optional `[transport]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_secs: u64,
    /// Overall transfer timeout in seconds (0 = only the context deadline).
    pub timeout_secs: u64,
    pub follow_redirects: bool,
    pub max_redirections: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 30,
            follow_redirects: true,
            max_redirections: 10,
        }
    }
}

impl TransportConfig {
    pub fn to_transport(&self) -> CurlTransport {
        CurlTransport::new()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(if self.timeout_secs == 0 {
                None
            } else {
                Some(Duration::from_secs(self.timeout_secs))
            })
            .follow_redirects(self.follow_redirects)
            .max_redirections(self.max_redirections)
    }
}

/// Full settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    #[serde(default)]
    pub transport: Option<TransportConfig>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(raw)?)
    }

    /// Loads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Builds a client configuration: curl transport with the `[transport]`
    /// tuning, waiter and retry policy present only when their sections are.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            transport: Box::new(self.transport.clone().unwrap_or_default().to_transport()),
            waiter: self
                .rate_limit
                .as_ref()
                .map(|c| Box::new(c.to_limiter()) as Box<dyn Waiter>),
            retry: self
                .retry
                .as_ref()
                .map(|c| Box::new(c.to_backoff()) as Box<dyn RetryPolicy>),
        }
    }
}
