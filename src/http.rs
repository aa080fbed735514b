//! Transport-agnostic HTTP request/response model.
//!
//! `Request` is owned by the caller and only read by the client; its context
//! travels into the waiter and the transport. `Response` carries a `Body`
//! whose underlying stream is closed exactly once, by whichever party last
//! holds it (the caller on success, the client on the 4xx path).

use std::fmt;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use url::Url;

use crate::context::RequestContext;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request description.
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    context: RequestContext,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            context: RequestContext::background(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn head(url: Url) -> Self {
        Self::new(Method::Head, url)
    }

    pub fn post(url: Url, body: Vec<u8>) -> Self {
        let mut req = Self::new(Method::Post, url);
        req.body = Some(body);
        req
    }

    /// Adds a request header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Replaces the default background context.
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

/// An inbound response. On success the body is returned unread; the caller
/// owns it and is responsible for closing it (dropping closes too).
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Body,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Body) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }
}

/// Readable response body with close-exactly-once semantics.
///
/// `close` is idempotent and safe to race from multiple threads: the first
/// caller drops the underlying stream, later calls are no-ops. Reading after
/// close yields EOF.
pub struct Body {
    reader: Mutex<Option<Box<dyn Read + Send>>>,
    closed: AtomicBool,
}

impl Body {
    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
            closed: AtomicBool::new(false),
        }
    }

    /// Closes the body. Returns true when this call performed the close,
    /// false when it was already closed.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Ok(mut guard) = self.reader.lock() {
            guard.take();
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Drains the remaining bytes and closes, whether or not the read
    /// succeeds. Read failures are reported after the close.
    pub fn read_to_end_and_close(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let res = {
            let mut guard = self
                .reader
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "body lock poisoned"))?;
            match guard.as_mut() {
                Some(reader) => reader.read_to_end(&mut buf).map(|_| ()),
                None => Ok(()),
            }
        };
        self.close();
        res.map(|()| buf)
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut guard = self
            .reader
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "body lock poisoned"))?;
        match guard.as_mut() {
            Some(reader) => reader.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for Body {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("closed", &self.is_closed())
            .finish()
    }
}
