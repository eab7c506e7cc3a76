//! The live per-request response.
//!
//! [`ResponseWriter`] is what the host server hands to the middleware chain.
//! It behaves like a streaming response: the first body write or flush
//! commits it, and from then on the status line and headers are frozen.
//! Any later header or status write fails with [`HeaderError::Committed`].
//!
//! Middleware that needs to touch headers after the handler ran must
//! therefore wrap the writer in a [`heron_core::BufferedResponse`].

use std::io;

use bytes::{Bytes, BytesMut};
use heron_core::{HeaderError, ResponseBody, ResponseHandle, ResponseHeaders};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;

use crate::error::MiddlewareError;
use crate::types::{json_error, HttpResponse};

/// An eagerly committing response.
///
/// # Example
///
/// ```
/// use heron_core::{ResponseBody, ResponseHeaders};
/// use heron_middleware::ResponseWriter;
///
/// let mut writer = ResponseWriter::new();
/// writer.set_header("content-type", "text/plain").unwrap();
/// writer.write_text("hello").unwrap();
///
/// assert!(writer.is_committed());
/// assert!(writer.set_header("x-late", "nope").is_err());
/// ```
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    committed: bool,
}

impl ResponseWriter {
    /// Creates an empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            committed: false,
        }
    }

    /// Returns the headers written so far.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Converts into an `http` response for the transport.
    #[must_use]
    pub fn into_response(self) -> HttpResponse {
        let mut response = http::Response::new(Full::new(Bytes::from(self.body.freeze())));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    /// Converts into the response for a request that failed with `err`.
    ///
    /// A committed writer already handed its status, headers and body to
    /// the client, so it is sent unchanged. Otherwise the error becomes a
    /// JSON body with the error's status, and the headers written so far
    /// are kept.
    #[must_use]
    pub fn into_error_response(self, err: &MiddlewareError) -> HttpResponse {
        if self.committed {
            return self.into_response();
        }

        let mut response = json_error(err.status(), err.code(), &err.to_string());
        let mut headers = self.headers;
        headers.remove(http::header::CONTENT_LENGTH);
        for (name, value) in response.headers() {
            headers.insert(name.clone(), value.clone());
        }
        *response.headers_mut() = headers;
        response
    }

    fn ensure_open(&self, name: &str) -> Result<(), HeaderError> {
        if self.committed {
            return Err(HeaderError::committed(name));
        }
        Ok(())
    }

    fn commit(&mut self) {
        if !self.committed {
            self.committed = true;
            tracing::trace!(status = %self.status, headers = self.headers.len(), "Response committed");
        }
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseHeaders for ResponseWriter {
    fn add_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.ensure_open(name)?;
        self.headers.add_header(name, value)
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.ensure_open(name)?;
        self.headers.set_header(name, value)
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.has_header(name)
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.header(name)
    }

    fn header_names(&self) -> Vec<String> {
        self.headers.header_names()
    }

    fn header_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.headers.header_bytes(name)
    }

    fn set_header_bytes(&mut self, name: &str, value: &[u8]) -> Result<(), HeaderError> {
        self.ensure_open(name)?;
        self.headers.set_header_bytes(name, value)
    }
}

impl ResponseBody for ResponseWriter {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.commit();
        self.body.extend_from_slice(bytes);
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.write_bytes(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }

    fn is_committed(&self) -> bool {
        self.committed
    }
}

impl ResponseHandle for ResponseWriter {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) -> Result<(), HeaderError> {
        self.ensure_open(":status")?;
        self.status = status;
        Ok(())
    }
}
