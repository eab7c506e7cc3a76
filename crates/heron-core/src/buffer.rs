//! Response buffering.
//!
//! Some hosts commit a response the moment body bytes reach the transport,
//! after which status and headers are frozen. To apply headers after the
//! downstream chain has written its body, the body must be held back until
//! header work is done. [`BufferedResponse`] does that: it decorates a live
//! [`ResponseHandle`], passes header operations straight through, and keeps
//! body writes in memory until it is released.
//!
//! ## Release Guarantee
//!
//! The buffer is handed to the real response exactly once:
//!
//! - [`BufferedResponse::release`] writes it and reports I/O errors
//! - [`BufferedResponse::discard`] drops it on purpose
//! - otherwise `Drop` releases it, so an early return, a `?`, or a
//!   cancelled future cannot lose the body
//!
//! ## Example
//!
//! ```
//! use heron_core::{BufferedResponse, ResponseBody, ResponseHeaders};
//! # use heron_core::{HeaderError, ResponseHandle};
//! # use http::{HeaderMap, StatusCode};
//! # #[derive(Default)]
//! # struct Live { headers: HeaderMap, body: Vec<u8>, committed: bool }
//! # impl ResponseHeaders for Live {
//! #     fn add_header(&mut self, n: &str, v: &str) -> Result<(), HeaderError> { self.headers.add_header(n, v) }
//! #     fn set_header(&mut self, n: &str, v: &str) -> Result<(), HeaderError> { self.headers.set_header(n, v) }
//! #     fn has_header(&self, n: &str) -> bool { self.headers.has_header(n) }
//! #     fn header(&self, n: &str) -> Option<String> { self.headers.header(n) }
//! #     fn header_names(&self) -> Vec<String> { self.headers.header_names() }
//! # }
//! # impl ResponseBody for Live {
//! #     fn write_bytes(&mut self, b: &[u8]) -> std::io::Result<()> { self.committed = true; self.body.extend_from_slice(b); Ok(()) }
//! #     fn write_text(&mut self, t: &str) -> std::io::Result<()> { self.write_bytes(t.as_bytes()) }
//! #     fn flush(&mut self) -> std::io::Result<()> { self.committed = true; Ok(()) }
//! #     fn is_committed(&self) -> bool { self.committed }
//! # }
//! # impl ResponseHandle for Live {
//! #     fn status(&self) -> StatusCode { StatusCode::OK }
//! #     fn set_status(&mut self, _: StatusCode) -> Result<(), HeaderError> { Ok(()) }
//! # }
//! let mut live = Live::default();
//!
//! let mut buffered = BufferedResponse::acquire(&mut live);
//! buffered.write_text("hello ")?;
//! buffered.write_bytes(b"world")?;
//! buffered.set_header("x-late", "still-mutable").unwrap();
//! buffered.release()?;
//!
//! assert_eq!(live.body, b"hello world");
//! assert_eq!(live.headers.header("x-late").as_deref(), Some("still-mutable"));
//! # Ok::<(), std::io::Error>(())
//! ```

use std::fmt;
use std::io;

use bytes::BytesMut;
use http::StatusCode;

use crate::error::HeaderError;
use crate::response::{ResponseBody, ResponseHandle, ResponseHeaders};

/// A response decorator that holds the body in memory until released.
pub struct BufferedResponse<'r, R: ResponseHandle + ?Sized> {
    /// The live response; receives headers immediately and the body on release.
    inner: &'r mut R,

    /// Accumulated body bytes.
    sink: BytesMut,

    /// Text written since the last byte write or flush.
    pending_text: String,

    /// Set once the body was handed over or discarded.
    released: bool,
}

impl<'r, R: ResponseHandle + ?Sized> BufferedResponse<'r, R> {
    /// Wraps a live response.
    pub fn acquire(inner: &'r mut R) -> Self {
        Self {
            inner,
            sink: BytesMut::new(),
            pending_text: String::new(),
            released: false,
        }
    }

    /// Returns the bytes buffered so far, excluding text not yet flushed.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.sink
    }

    /// Returns the total number of buffered bytes, including pending text.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sink.len() + self.pending_text.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the buffered body to the live response and flushes it.
    pub fn release(mut self) -> io::Result<()> {
        self.release_inner()
    }

    /// Drops the buffered body without writing it.
    pub fn discard(mut self) {
        tracing::debug!(bytes = self.len(), "Discarding buffered response body");
        self.released = true;
        self.sink.clear();
        self.pending_text.clear();
    }

    fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            self.sink.extend_from_slice(self.pending_text.as_bytes());
            self.pending_text.clear();
        }
    }

    fn release_inner(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        self.flush_text();
        let body = self.sink.split().freeze();
        if !body.is_empty() {
            self.inner.write_bytes(&body)?;
        }
        self.inner.flush()
    }
}

impl<R: ResponseHandle + ?Sized> Drop for BufferedResponse<'_, R> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        tracing::debug!(bytes = self.len(), "Releasing buffered response on drop");
        if let Err(e) = self.release_inner() {
            tracing::warn!(error = %e, "Failed to release buffered response body");
        }
    }
}

impl<R: ResponseHandle + ?Sized> ResponseHeaders for BufferedResponse<'_, R> {
    fn add_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.inner.add_header(name, value)
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.inner.set_header(name, value)
    }

    fn has_header(&self, name: &str) -> bool {
        self.inner.has_header(name)
    }

    fn header(&self, name: &str) -> Option<String> {
        self.inner.header(name)
    }

    fn header_names(&self) -> Vec<String> {
        self.inner.header_names()
    }

    fn header_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.inner.header_bytes(name)
    }

    fn set_header_bytes(&mut self, name: &str, value: &[u8]) -> Result<(), HeaderError> {
        self.inner.set_header_bytes(name, value)
    }
}

impl<R: ResponseHandle + ?Sized> ResponseBody for BufferedResponse<'_, R> {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.flush_text();
        self.sink.extend_from_slice(bytes);
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.pending_text.push_str(text);
        Ok(())
    }

    // Moves pending text into the sink; nothing reaches the live response.
    fn flush(&mut self) -> io::Result<()> {
        self.flush_text();
        Ok(())
    }

    fn is_committed(&self) -> bool {
        self.inner.is_committed()
    }
}

impl<R: ResponseHandle + ?Sized> ResponseHandle for BufferedResponse<'_, R> {
    fn status(&self) -> StatusCode {
        self.inner.status()
    }

    fn set_status(&mut self, status: StatusCode) -> Result<(), HeaderError> {
        self.inner.set_status(status)
    }
}

impl<R: ResponseHandle + ?Sized> fmt::Debug for BufferedResponse<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedResponse")
            .field("buffered", &self.sink.len())
            .field("pending_text", &self.pending_text.len())
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;

    /// A response that commits on the first body write.
    #[derive(Debug, Default)]
    struct EagerResponse {
        headers: HeaderMap,
        status: Option<StatusCode>,
        body: Vec<u8>,
        writes: usize,
        flushes: usize,
        committed: bool,
    }

    impl EagerResponse {
        fn check(&self, name: &str) -> Result<(), HeaderError> {
            if self.committed {
                return Err(HeaderError::committed(name));
            }
            Ok(())
        }
    }

    impl ResponseHeaders for EagerResponse {
        fn add_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
            self.check(name)?;
            self.headers.add_header(name, value)
        }

        fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
            self.check(name)?;
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
            self.check(name)?;
            self.headers.set_header_bytes(name, value)
        }
    }

    impl ResponseBody for EagerResponse {
        fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.committed = true;
            self.writes += 1;
            self.body.extend_from_slice(bytes);
            Ok(())
        }

        fn write_text(&mut self, text: &str) -> io::Result<()> {
            self.write_bytes(text.as_bytes())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.committed = true;
            self.flushes += 1;
            Ok(())
        }

        fn is_committed(&self) -> bool {
            self.committed
        }
    }

    impl ResponseHandle for EagerResponse {
        fn status(&self) -> StatusCode {
            self.status.unwrap_or(StatusCode::OK)
        }

        fn set_status(&mut self, status: StatusCode) -> Result<(), HeaderError> {
            self.check(":status")?;
            self.status = Some(status);
            Ok(())
        }
    }

    #[test]
    fn test_body_held_until_release() {
        let mut live = EagerResponse::default();
        let mut buffered = BufferedResponse::acquire(&mut live);

        buffered.write_bytes(b"abc").unwrap();
        assert!(!buffered.is_committed());
        buffered.set_header("x-after-body", "ok").unwrap();
        buffered.set_status(StatusCode::CREATED).unwrap();
        buffered.release().unwrap();

        assert_eq!(live.body, b"abc");
        assert_eq!(live.status(), StatusCode::CREATED);
        assert_eq!(live.header("x-after-body").as_deref(), Some("ok"));
        assert!(live.is_committed());
    }

    #[test]
    fn test_interleaved_text_and_bytes_keep_order() {
        let mut live = EagerResponse::default();
        let mut buffered = BufferedResponse::acquire(&mut live);

        buffered.write_text("one ").unwrap();
        buffered.write_bytes(b"two ").unwrap();
        buffered.write_text("three ").unwrap();
        buffered.write_text("four ").unwrap();
        buffered.write_bytes(&[0xff, 0x00]).unwrap();
        buffered.write_text("five").unwrap();
        buffered.release().unwrap();

        let mut expected = b"one two three four ".to_vec();
        expected.extend_from_slice(&[0xff, 0x00]);
        expected.extend_from_slice(b"five");
        assert_eq!(live.body, expected);
    }

    #[test]
    fn test_pending_text_excluded_from_buffer_until_flushed() {
        let mut live = EagerResponse::default();
        let mut buffered = BufferedResponse::acquire(&mut live);

        buffered.write_text("text").unwrap();
        assert!(buffered.buffer().is_empty());
        assert_eq!(buffered.len(), 4);

        buffered.flush().unwrap();
        assert_eq!(buffered.buffer(), b"text");
        buffered.discard();

        assert!(live.body.is_empty());
        assert!(!live.is_committed());
    }

    #[test]
    fn test_release_writes_once() {
        let mut live = EagerResponse::default();
        let mut buffered = BufferedResponse::acquire(&mut live);
        buffered.write_bytes(b"body").unwrap();
        buffered.release().unwrap();

        assert_eq!(live.writes, 1);
        assert_eq!(live.flushes, 1);
    }

    #[test]
    fn test_empty_release_commits_without_write() {
        let mut live = EagerResponse::default();
        BufferedResponse::acquire(&mut live).release().unwrap();

        assert_eq!(live.writes, 0);
        assert_eq!(live.flushes, 1);
    }

    #[test]
    fn test_drop_releases_body() {
        let mut live = EagerResponse::default();
        {
            let mut buffered = BufferedResponse::acquire(&mut live);
            buffered.write_text("kept").unwrap();
        }

        assert_eq!(live.body, b"kept");
        assert_eq!(live.writes, 1);
    }

    #[test]
    fn test_drop_after_error_path_releases_body() {
        fn failing(response: &mut EagerResponse) -> Result<(), HeaderError> {
            let mut buffered = BufferedResponse::acquire(response);
            buffered.write_bytes(b"partial").map_err(|_| HeaderError::committed("x"))?;
            Err(HeaderError::invalid_name("bad name"))
        }

        let mut live = EagerResponse::default();
        assert!(failing(&mut live).is_err());
        assert_eq!(live.body, b"partial");
    }

    #[test]
    fn test_discard_drops_body() {
        let mut live = EagerResponse::default();
        let mut buffered = BufferedResponse::acquire(&mut live);
        buffered.write_bytes(b"gone").unwrap();
        buffered.discard();

        assert!(live.body.is_empty());
        assert_eq!(live.flushes, 0);
    }

    #[test]
    fn test_works_through_trait_object() {
        let mut live = EagerResponse::default();
        let handle: &mut dyn ResponseHandle = &mut live;
        let mut buffered = BufferedResponse::acquire(handle);
        buffered.write_bytes(b"dyn").unwrap();
        buffered.add_header("x-h", "v").unwrap();
        buffered.release().unwrap();

        assert_eq!(live.body, b"dyn");
        assert!(live.has_header("x-h"));
    }
}
