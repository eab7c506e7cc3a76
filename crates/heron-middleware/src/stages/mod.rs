//! Middleware stages shipped with Heron.
//!
//! - [`response_headers`] - injects configured headers into every response

pub mod response_headers;

pub use response_headers::ResponseHeadersMiddleware;
