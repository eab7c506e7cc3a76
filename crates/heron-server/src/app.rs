//! Turns a loaded [`HeronConfig`] into telemetry settings and a server.

use std::sync::Arc;

use heron_config::{HeronConfig, LogFormat, LoggingConfig};
use heron_core::{ResponseBody, ResponseHandle, ResponseHeaders};
use heron_middleware::stages::ResponseHeadersMiddleware;
use heron_middleware::{FnHandler, Pipeline};
use heron_telemetry::{LogConfig, MetricsConfig, MetricsObserver};
use http::StatusCode;

use crate::server::Server;

/// Maps the `[logging]` section onto the subscriber settings.
#[must_use]
pub fn log_config(logging: &LoggingConfig) -> LogConfig {
    let base = match logging.format {
        LogFormat::Json => LogConfig::production(),
        LogFormat::Pretty => LogConfig::development(),
    };

    LogConfig {
        enabled: logging.enabled,
        level: logging.level.clone(),
        ansi: logging.ansi_enabled,
        file_line_info: logging.include_location,
        ..base
    }
}

/// Maps the `[metrics]` section onto the exporter settings.
#[must_use]
pub fn metrics_config(config: &HeronConfig) -> MetricsConfig {
    MetricsConfig {
        enabled: config.metrics.enabled,
        addr: config.metrics.addr.clone(),
    }
}

/// Builds the pipeline: the response header stage for the `[filter]`
/// section, reporting to Prometheus when metrics are enabled.
#[must_use]
pub fn build_pipeline(config: &HeronConfig) -> Pipeline {
    let mut stage = ResponseHeadersMiddleware::new(config.header_spec());
    if config.metrics.enabled {
        stage = stage.with_observer(Arc::new(MetricsObserver));
    }

    Pipeline::builder().stage(stage).build()
}

/// Builds the server the `heron` binary runs.
///
/// The terminal handler answers every request with a short plain text
/// body, so the configured headers can be inspected with any client.
#[must_use]
pub fn build_server(config: &HeronConfig) -> Server {
    Server::builder()
        .config(config.server.clone())
        .pipeline(build_pipeline(config))
        .handler(FnHandler::new(|_ctx, request, response| {
            response.set_status(StatusCode::OK)?;
            response.set_header("content-type", "text/plain; charset=utf-8")?;
            response.write_text(&format!("heron: {} {}\n", request.method(), request.uri().path()))?;
            Ok(())
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use heron_config::FilterParams;
    use http_body_util::{BodyExt, Full};

    #[test]
    fn test_log_config_follows_format() {
        let json = log_config(&LoggingConfig::default());
        assert!(json.json_format);
        assert!(!json.ansi);

        let pretty = log_config(&LoggingConfig {
            level: "heron_core=trace".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            ..Default::default()
        });
        assert!(!pretty.json_format);
        assert!(pretty.file_line_info);
        assert_eq!(pretty.level, "heron_core=trace");
    }

    #[test]
    fn test_pipeline_has_header_stage() {
        let pipeline = build_pipeline(&HeronConfig::default());
        assert_eq!(pipeline.stage_names(), ["response_headers"]);
    }

    #[test]
    fn test_metrics_config_copied() {
        let config = HeronConfig::production();
        let metrics = metrics_config(&config);
        assert!(metrics.enabled);
        assert_eq!(metrics.addr, config.metrics.addr);
    }

    #[tokio::test]
    async fn test_built_server_applies_filter_headers() {
        let mut filter: FilterParams = [("x-frame-options", "DENY")].into_iter().collect();
        filter.insert("setHeadersAfterServlet", true);
        let config = HeronConfig::builder().filter(filter).build();
        let server = build_server(&config);

        let request = http::Request::get("/status")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = server.handle(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"heron: GET /status\n");
    }
}
