//! # Heron Middleware
//!
//! Async middleware chain for Heron, and the stage that injects configured
//! response headers.
//!
//! ```text
//! Request → ResponseHeaders (pre) → … → Handler
//!                                         ↓ writes body into buffer
//! Response ← ResponseHeaders (post, release) ←┘
//! ```
//!
//! ## Key Types
//!
//! - [`Middleware`] and [`Next`] - a stage and its continuation
//! - [`Handler`] / [`FnHandler`] - the end of the chain
//! - [`Pipeline`] - an ordered, shareable list of stages
//! - [`ResponseWriter`] - the live response, committed on first body write
//! - [`stages::ResponseHeadersMiddleware`] - the header injection stage
//!
//! ## Example
//!
//! ```
//! use heron_core::ResponseBody;
//! use heron_middleware::stages::ResponseHeadersMiddleware;
//! use heron_middleware::{FnHandler, MiddlewareContext, Pipeline, ResponseWriter};
//! # use bytes::Bytes;
//! # use http_body_util::Full;
//!
//! # tokio_test::block_on(async {
//! let pipeline = Pipeline::builder()
//!     .stage(ResponseHeadersMiddleware::from_params([
//!         ("setHeadersAfterServlet", "true"),
//!         ("x-served-by", "heron"),
//!     ]))
//!     .build();
//! let handler = FnHandler::new(|_ctx, _req, response| {
//!     response.write_text("body first")?;
//!     Ok(())
//! });
//!
//! let mut response = ResponseWriter::new();
//! pipeline
//!     .process(
//!         &mut MiddlewareContext::new(),
//!         http::Request::new(Full::new(Bytes::new())),
//!         &handler,
//!         &mut response,
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(response.headers()["x-served-by"], "heron");
//! assert_eq!(response.body(), b"body first");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/heron-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod response;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use error::{MiddlewareError, MiddlewareResult};
pub use middleware::{BoxFuture, FnHandler, Handler, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use response::ResponseWriter;
pub use types::{json_error, HttpResponse, Request};
