//! Typed configuration for Heron.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use heron_config::ConfigLoader;
//!
//! # fn main() -> Result<(), heron_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("heron.toml")?
//!     .with_env_prefix("HERON")
//!     .load()?;
//!
//! let spec = config.header_spec();
//! println!("{} headers configured", spec.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//!
//! [filter]
//! setHeadersAfterServlet = true
//! appendValues = false
//! "x-frame-options" = "DENY"
//! "content-security-policy" = ["default-src 'self'", "frame-ancestors 'none'"]
//! ```
//!
//! Entries of `[filter]` apply in the order they are written.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
