//! # Heron Core
//!
//! Configured response-header injection, independent of any HTTP server.
//!
//! ```text
//! params ──▶ HeaderSpec ──▶ HeaderApplicator ──▶ ResponseHeaders
//!             (immutable)     │   pre / post        (mutated)
//!                             ▼
//!                      downstream chain
//! ```
//!
//! - [`HeaderSpec`] - the parsed, immutable configuration
//! - [`HeaderApplicator`] - applies the spec around a downstream continuation
//! - [`BufferedResponse`] - holds the body back so headers stay mutable
//! - [`ResponseHeaders`], [`ResponseBody`], [`ResponseHandle`] - the
//!   capabilities a host response must provide
//!
//! ## Example
//!
//! ```
//! use heron_core::{HeaderApplicator, HeaderError, HeaderSpec};
//! use http::HeaderMap;
//!
//! let spec = HeaderSpec::from_params([("x-frame-options", "DENY")]);
//! let applicator = HeaderApplicator::new(spec);
//!
//! let mut headers = HeaderMap::new();
//! applicator.apply(&mut headers, |_| Ok::<_, HeaderError>(())).unwrap();
//! assert_eq!(headers["x-frame-options"], "DENY");
//! ```

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod applicator;
pub mod buffer;
pub mod error;
pub mod header_spec;
pub mod observer;
pub mod response;

pub use applicator::{HeaderApplicator, MERGE_SEPARATOR};
pub use buffer::BufferedResponse;
pub use error::HeaderError;
pub use header_spec::{
    HeaderSpec, HeaderSpecBuilder, APPEND_ON_CONFLICT_PARAM, APPLY_AFTER_DOWNSTREAM_PARAM,
    VALUE_DELIMITER,
};
pub use observer::{ApplyEvent, ApplyObserver, NoopObserver, Phase, RecordingObserver, TracingObserver};
pub use response::{ResponseBody, ResponseHandle, ResponseHeaders};
