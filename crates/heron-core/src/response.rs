//! Response capability traits.
//!
//! The core never owns a response. It mutates one through the narrow
//! capability set defined here, which the host HTTP layer implements for
//! whatever object represents the in-flight response.
//!
//! - [`ResponseHeaders`] - header reads and writes
//! - [`ResponseBody`] - body writes and commit
//! - [`ResponseHandle`] - both, plus the status line
//!
//! `ResponseHeaders` is implemented here for [`http::HeaderMap`] and
//! [`http::Response`], so the applicator can be used directly on plain
//! `http` types.

use std::io;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

use crate::error::HeaderError;

/// Header capabilities of an outgoing response.
///
/// Names are matched case-insensitively by implementations backed by
/// `http`; the strings passed in are used as provided.
pub trait ResponseHeaders {
    /// Appends a value, keeping any values already present for `name`.
    fn add_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError>;

    /// Replaces every value of `name` with the single `value`.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError>;

    /// Returns `true` if at least one value is present for `name`.
    fn has_header(&self, name: &str) -> bool;

    /// Returns the first value of `name`, if any.
    fn header(&self, name: &str) -> Option<String>;

    /// Returns the distinct header names currently present.
    fn header_names(&self) -> Vec<String>;

    /// Returns the raw bytes of the first value of `name`, if any.
    ///
    /// Values may carry obs-text bytes that are not UTF-8. The default
    /// goes through [`header`](Self::header) and cannot return them.
    fn header_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.header(name).map(String::into_bytes)
    }

    /// Replaces every value of `name` with the raw `value` bytes.
    ///
    /// The default goes through [`set_header`](Self::set_header) and rejects
    /// values that are not UTF-8.
    fn set_header_bytes(&mut self, name: &str, value: &[u8]) -> Result<(), HeaderError> {
        let value = std::str::from_utf8(value).map_err(|_| HeaderError::invalid_value(name))?;
        self.set_header(name, value)
    }
}

/// Body capabilities of an outgoing response.
pub trait ResponseBody {
    /// Writes raw bytes to the body.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Writes UTF-8 text to the body.
    fn write_text(&mut self, text: &str) -> io::Result<()>;

    /// Flushes pending output. For a live response this commits it.
    fn flush(&mut self) -> io::Result<()>;

    /// Returns `true` once status and headers can no longer change.
    fn is_committed(&self) -> bool;
}

/// A complete per-request response handle.
///
/// This is the object a middleware chain threads through to the handler.
pub trait ResponseHandle: ResponseHeaders + ResponseBody + Send {
    /// Returns the current status code.
    fn status(&self) -> StatusCode;

    /// Sets the status code.
    fn set_status(&mut self, status: StatusCode) -> Result<(), HeaderError>;
}

/// Parses a name/value pair into `http` types.
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), HeaderError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| HeaderError::invalid_name(name))?;
    let header_value = HeaderValue::from_str(value).map_err(|_| HeaderError::invalid_value(name))?;
    Ok((header_name, header_value))
}

/// Parses a name and a raw byte value into `http` types.
pub fn parse_header_bytes(
    name: &str,
    value: &[u8],
) -> Result<(HeaderName, HeaderValue), HeaderError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| HeaderError::invalid_name(name))?;
    let header_value =
        HeaderValue::from_bytes(value).map_err(|_| HeaderError::invalid_value(name))?;
    Ok((header_name, header_value))
}

fn value_to_string(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

impl ResponseHeaders for HeaderMap {
    fn add_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let (name, value) = parse_header(name, value)?;
        self.append(name, value);
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let (name, value) = parse_header(name, value)?;
        self.insert(name, value);
        Ok(())
    }

    fn has_header(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn header(&self, name: &str) -> Option<String> {
        self.get(name).map(value_to_string)
    }

    fn header_names(&self) -> Vec<String> {
        self.keys().map(|name| name.as_str().to_owned()).collect()
    }

    fn header_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.get(name).map(|value| value.as_bytes().to_vec())
    }

    fn set_header_bytes(&mut self, name: &str, value: &[u8]) -> Result<(), HeaderError> {
        let (name, value) = parse_header_bytes(name, value)?;
        self.insert(name, value);
        Ok(())
    }
}

impl<B> ResponseHeaders for http::Response<B> {
    fn add_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.headers_mut().add_header(name, value)
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        self.headers_mut().set_header(name, value)
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers().has_header(name)
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers().header(name)
    }

    fn header_names(&self) -> Vec<String> {
        self.headers().header_names()
    }

    fn header_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.headers().header_bytes(name)
    }

    fn set_header_bytes(&mut self, name: &str, value: &[u8]) -> Result<(), HeaderError> {
        self.headers_mut().set_header_bytes(name, value)
    }
}
