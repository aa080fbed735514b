//! HTTP transport capability and the curl-backed default.
//!
//! Uses the curl crate (libcurl) for the real exchange: headers and body are
//! collected via callbacks, the request context is polled from the progress
//! callback so cancellation aborts an in-flight transfer.

use std::str;
use std::time::Duration;

use thiserror::Error;

use crate::http::{Body, Method, Request, Response};

/// Performs one HTTP exchange. Any error from a transport is a
/// transport-level failure and is treated as transient by the client.
pub trait Transport: Send + Sync {
    fn perform(&self, request: &Request) -> Result<Response, TransportError>;
}

/// Network-level failure: connection, DNS, timeout, aborted transfer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
    #[error("{0}")]
    Other(String),
}

/// Default `Transport` over `curl::easy`. One handle per request; safe
/// for concurrent use because no handle state is shared between calls.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    timeout: Option<Duration>,
    follow_redirects: bool,
    max_redirections: u32,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Some(Duration::from_secs(30)),
            follow_redirects: true,
            max_redirections: 10,
        }
    }
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Overall transfer timeout; `None` leaves only the context deadline.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn max_redirections(mut self, max: u32) -> Self {
        self.max_redirections = max;
        self
    }
}

impl Transport for CurlTransport {
    fn perform(&self, request: &Request) -> Result<Response, TransportError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(request.url().as_str())?;
        match request.method() {
            Method::Get => easy.get(true)?,
            Method::Head => easy.nobody(true)?,
            Method::Post => easy.post(true)?,
            Method::Put => easy.custom_request("PUT")?,
            Method::Delete => easy.custom_request("DELETE")?,
        }
        if let Some(body) = request.body() {
            easy.post_fields_copy(body)?;
        } else if request.method() == Method::Post {
            easy.post_fields_copy(&[])?;
        }
        if self.follow_redirects {
            easy.follow_location(true)?;
            easy.max_redirections(self.max_redirections)?;
        }
        easy.connect_timeout(self.connect_timeout)?;

        // The context deadline caps the whole transfer, like a client-wide
        // timeout would; the tighter of the two wins.
        let timeout = match (self.timeout, request.context().remaining()) {
            (Some(configured), Some(remaining)) => Some(configured.min(remaining)),
            (Some(configured), None) => Some(configured),
            (None, remaining) => remaining,
        };
        if let Some(timeout) = timeout {
            easy.timeout(timeout)?;
        }

        if !request.headers().is_empty() {
            let mut list = curl::easy::List::new();
            for (name, value) in request.headers() {
                list.append(&format!("{}: {}", name.trim(), value.trim()))?;
            }
            easy.http_headers(list)?;
        }

        // Poll cancellation from the progress callback; returning false
        // aborts the transfer mid-flight.
        easy.progress(true)?;
        let ctx = request.context().clone();

        let mut header_lines: Vec<String> = Vec::new();
        let mut body_buf: Vec<u8> = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                body_buf.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.progress_function(move |_, _, _, _| ctx.done().is_ok())?;
            transfer.perform()?;
        }

        let code = easy.response_code()? as u16;
        let headers = parse_headers(&header_lines);
        Ok(Response::new(code, headers, Body::from_bytes(body_buf)))
    }
}

/// Parse collected header lines into name/value pairs. A new status line
/// (redirect hop) discards the previous block so only the final response's
/// headers survive.
fn parse_headers(lines: &[String]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            out.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            out.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_headers_takes_last_response_block() {
        let lines = vec![
            "HTTP/1.1 301 Moved Permanently".to_string(),
            "Location: /elsewhere".to_string(),
            String::new(),
            "HTTP/1.1 200 OK".to_string(),
            "Content-Type: text/plain".to_string(),
            "ETag: \"abc\"".to_string(),
            String::new(),
        ];
        let headers = parse_headers(&lines);
        assert_eq!(
            headers,
            vec![
                ("Content-Type".to_string(), "text/plain".to_string()),
                ("ETag".to_string(), "\"abc\"".to_string()),
            ]
        );
    }

    #[test]
    fn parse_headers_skips_malformed_lines() {
        let lines = vec![
            "HTTP/1.1 200 OK".to_string(),
            "no-colon-here".to_string(),
            "X-One: 1".to_string(),
        ];
        assert_eq!(
            parse_headers(&lines),
            vec![("X-One".to_string(), "1".to_string())]
        );
    }
}
