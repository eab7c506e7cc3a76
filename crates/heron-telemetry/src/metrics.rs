//! Prometheus metrics for Heron.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `heron_requests_total` | Counter | `status` | Requests served |
//! | `heron_request_duration_seconds` | Histogram | - | Request latency |
//! | `heron_in_flight_requests` | Gauge | - | Requests being processed |
//! | `heron_apply_phases_total` | Counter | `phase` | Header merge passes |
//! | `heron_headers_added_total` | Counter | `header` | Values added as new instances |
//! | `heron_headers_merged_total` | Counter | `header` | Values merged into existing headers |

use std::net::SocketAddr;
use std::time::Duration;

use heron_core::{ApplyEvent, ApplyObserver};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Metrics exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to expose metrics on (e.g., "0.0.0.0:9090").
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime; the exporter runs as a
/// background task on it.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if a recorder is already installed or the
/// listener cannot bind.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();
    tracing::info!(addr = %addr, "Prometheus metrics exporter listening");

    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!("heron_requests_total", "Total number of HTTP requests served");
    describe_histogram!(
        "heron_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "heron_in_flight_requests",
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        "heron_apply_phases_total",
        "Header merge passes by phase"
    );
    describe_counter!(
        "heron_headers_added_total",
        "Configured header values added as new header instances"
    );
    describe_counter!(
        "heron_headers_merged_total",
        "Configured header values merged into an existing header"
    );
}

/// Records a completed request.
pub fn record_request(status_code: u16, duration: Duration) {
    counter!("heron_requests_total", "status" => status_code.to_string()).increment(1);
    histogram!("heron_request_duration_seconds").record(duration.as_secs_f64());
}

/// Guard that tracks an in-flight request until dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!("heron_in_flight_requests").increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("heron_in_flight_requests").decrement(1.0);
    }
}

/// An [`ApplyObserver`] that counts header activity.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use heron_core::HeaderApplicator;
/// use heron_telemetry::MetricsObserver;
///
/// let applicator = HeaderApplicator::new(heron_core::HeaderSpec::default())
///     .with_observer(Arc::new(MetricsObserver));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl ApplyObserver for MetricsObserver {
    fn on_event(&self, event: &ApplyEvent) {
        match event {
            ApplyEvent::PhaseStarted { phase, .. } => {
                counter!("heron_apply_phases_total", "phase" => phase.as_str()).increment(1);
            }
            ApplyEvent::HeaderAdded { name, .. } => {
                counter!("heron_headers_added_total", "header" => name.clone()).increment(1);
            }
            ApplyEvent::HeaderMerged { name, .. } => {
                counter!("heron_headers_merged_total", "header" => name.clone()).increment(1);
            }
        }
    }
}
