//! The resilient client: wait, send, classify, with optional retries.

use crate::error::{Error, StatusError};
use crate::http::{Request, Response};
use crate::limit::{RateLimiter, Waiter};
use crate::retry::{retry_with, ExponentialBackoff, RetryError, RetryPolicy};
use crate::transport::{CurlTransport, Transport};

/// Explicit configuration for [`Client::new`]: the transport is required,
/// the waiter and retry policy are optional. No waiter means no gating; no
/// retry policy means exactly one attempt.
pub struct ClientConfig {
    pub transport: Box<dyn Transport>,
    pub waiter: Option<Box<dyn Waiter>>,
    pub retry: Option<Box<dyn RetryPolicy>>,
}

impl ClientConfig {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            waiter: None,
            retry: None,
        }
    }

    pub fn waiter(mut self, waiter: impl Waiter + 'static) -> Self {
        self.waiter = Some(Box::new(waiter));
        self
    }

    pub fn retry(mut self, retry: impl RetryPolicy + 'static) -> Self {
        self.retry = Some(Box::new(retry));
        self
    }
}

/// Executes requests through a transport, rate-gated by the waiter and
/// retried on transient failure by the retry policy.
///
/// Immutable after construction and safe to share across threads; the waiter
/// is the only cross-call coordination point.
pub struct Client {
    transport: Box<dyn Transport>,
    waiter: Option<Box<dyn Waiter>>,
    retry: Option<Box<dyn RetryPolicy>>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            transport: config.transport,
            waiter: config.waiter,
            retry: config.retry,
        }
    }

    /// Client with the opinionated defaults: curl transport, 1 request per
    /// second (burst 1), and the default exponential backoff schedule.
    pub fn with_defaults() -> Self {
        Self::new(
            ClientConfig::new(CurlTransport::default())
                .waiter(RateLimiter::default())
                .retry(ExponentialBackoff::default()),
        )
    }

    /// Executes the request: rate-gate, send, classify; transient failures
    /// are retried when a retry policy is configured.
    ///
    /// On success the response body is unread and open; the caller owns it.
    /// When the retry driver gives up (budget spent or permanent failure),
    /// the underlying error comes back wrapped as
    /// [`Error::RetriesExhausted`].
    pub fn execute(&self, request: &Request) -> Result<Response, Error> {
        match &self.retry {
            None => self.attempt(request).map_err(RetryError::into_inner),
            Some(policy) => retry_with(policy.as_ref(), request.context(), || {
                self.attempt(request)
            })
            .map_err(|e| Error::RetriesExhausted(Box::new(e.into_inner()))),
        }
    }

    /// One wait-send-classify pass, tagged for the retry driver.
    fn attempt(&self, request: &Request) -> Result<Response, RetryError<Error>> {
        if let Some(waiter) = &self.waiter {
            if let Err(e) = waiter.wait(request.context()) {
                // A dead context makes further attempts pointless.
                return Err(RetryError::Permanent(Error::Context(e)));
            }
        }

        let response = match self.transport.perform(request) {
            Ok(response) => response,
            Err(e) => return Err(RetryError::Transient(Error::Transport(e))),
        };

        let status = response.status();
        if status > 399 && status < 500 {
            tracing::debug!(status, "client error response, not retrying");
            let body = match response.into_body().read_to_end_and_close() {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::warn!("failed to drain error response body: {}", e);
                    String::new()
                }
            };
            return Err(RetryError::Permanent(Error::Status(StatusError {
                code: status,
                body,
            })));
        }

        // TODO: honor Retry-After on 429/503 once the schedule can take a
        // server-supplied floor; until then only transport failures retry.
        Ok(response)
    }
}
