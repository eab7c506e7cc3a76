//! # Heron Server
//!
//! Hyper HTTP/1.1 host for a Heron middleware [`Pipeline`](heron_middleware::Pipeline).
//!
//! - [`Server`]: accept loop, per-request pipeline run, JSON error
//!   responses, `GET /health`
//! - [`ShutdownSignal`] and [`ConnectionTracker`]: graceful shutdown with
//!   connection draining
//! - [`app`]: wiring from a loaded [`HeronConfig`](heron_config::HeronConfig)
//!   to the server the `heron` binary runs

#![doc(html_root_url = "https://docs.rs/heron-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;
pub mod server;
pub mod shutdown;

pub use server::{Server, ServerBuilder, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
