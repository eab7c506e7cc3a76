//! # Heron
//!
//! Adds a fixed set of configured headers to every HTTP response.
//!
//! Headers are declared once as filter parameters, parsed into a
//! [`HeaderSpec`](core::HeaderSpec), and applied by the
//! [`ResponseHeadersMiddleware`](middleware::stages::ResponseHeadersMiddleware)
//! stage either before the handler runs or after it returns.
//!
//! ```
//! use heron::prelude::*;
//!
//! let stage = ResponseHeadersMiddleware::from_params([
//!     ("appendValues", "true"),
//!     ("cache-control", "no-store"),
//!     ("x-multi", "one\ntwo"),
//! ]);
//!
//! assert!(stage.spec().append_on_conflict());
//! assert_eq!(stage.spec().values("x-multi").map(<[String]>::len), Some(2));
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Header spec, applicator and buffering
pub use heron_core as core;

// Middleware chain and the header stage
pub use heron_middleware as middleware;

// Configuration loading
pub use heron_config as config;

// Logging and metrics
pub use heron_telemetry as telemetry;

// HTTP host
pub use heron_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use heron::prelude::*;
/// ```
pub mod prelude {
    pub use heron_core::{
        ApplyEvent, ApplyObserver, BufferedResponse, HeaderApplicator, HeaderError, HeaderSpec,
        Phase, ResponseBody, ResponseHandle, ResponseHeaders,
    };

    pub use heron_middleware::stages::ResponseHeadersMiddleware;
    pub use heron_middleware::{
        FnHandler, Handler, Middleware, MiddlewareContext, MiddlewareError, MiddlewareResult,
        Next, Pipeline, ResponseWriter,
    };

    pub use heron_config::{ConfigLoader, HeronConfig};

    pub use heron_server::{Server, ShutdownSignal};
}
