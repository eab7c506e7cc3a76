//! Logging and metrics for Heron.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: Prometheus exporter via the `metrics` crate, plus
//!   [`MetricsObserver`] to count header activity
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_telemetry::{init_logging, init_metrics, LogConfig, MetricsConfig};
//!
//! init_logging(&LogConfig::production())?;
//! init_metrics(&MetricsConfig { enabled: true, addr: "0.0.0.0:9090".into() })?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use self::error::TelemetryError;
pub use self::logging::{init_logging, LogConfig};
pub use self::metrics::{init_metrics, record_request, InFlightGuard, MetricsConfig, MetricsObserver};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
