//! Main configuration types.
//!
//! This module provides the top-level [`HeronConfig`] struct and its builder.

use heron_core::HeaderSpec;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, FilterParams, LogFormat, LoggingConfig, MetricsConfig, ServerConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete Heron configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.header_spec().is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Response header filter parameters.
    #[serde(default)]
    pub filter: FilterParams,
}

impl HeronConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> HeronConfigBuilder {
        HeronConfigBuilder::new()
    }

    /// Builds the header spec from the `[filter]` section.
    #[must_use]
    pub fn header_spec(&self) -> HeaderSpec {
        self.filter.header_spec()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - Server address is invalid
    /// - Metrics address is invalid while metrics are enabled
    /// - Log level is not a known level or filter directive
    /// - Request timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.metrics.enabled && self.metrics.addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        // Directives such as `heron_core=debug` are left to the subscriber.
        let level = self.logging.level.trim();
        if !level.contains('=')
            && !LOG_LEVELS.iter().any(|known| known.eq_ignore_ascii_case(level))
        {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown log level: {}", self.logging.level),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::HeronConfig;
    ///
    /// let config = HeronConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;
        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::{HeronConfig, LogFormat};
    ///
    /// let config = HeronConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// assert!(config.metrics.enabled);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;
        config.metrics.enabled = true;
        config
    }
}

/// Builder for [`HeronConfig`].
#[derive(Debug, Default)]
pub struct HeronConfigBuilder {
    server: Option<ServerConfig>,
    logging: Option<LoggingConfig>,
    metrics: Option<MetricsConfig>,
    filter: Option<FilterParams>,
}

impl HeronConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the filter parameters.
    #[must_use]
    pub fn filter(mut self, filter: FilterParams) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> HeronConfig {
        HeronConfig {
            server: self.server.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
            filter: self.filter.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<HeronConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
