//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Server configuration section.
///
/// # Example
///
/// ```
/// use heron_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:8080".to_string(),
///     shutdown_timeout_secs: 10,
///     request_timeout_ms: 5000,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Time allowed for reading a request body, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30000
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (e.g. `info`, `heron_core=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Serve Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus metrics endpoint address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_true() -> bool {
    true
}

/// A single filter parameter value.
///
/// Files may write a parameter as a string, a boolean, or a list of
/// strings. Lists are equivalent to a newline separated string, which is
/// how multiple values for one header are expressed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ParamValue {
    /// A boolean, used for the control flags.
    Flag(bool),
    /// Raw text, split on newlines for headers.
    Text(String),
    /// One entry per header value.
    Lines(Vec<String>),
}

impl ParamValue {
    /// Returns the parameter as the raw string the filter parses.
    #[must_use]
    pub fn as_param(&self) -> String {
        match self {
            Self::Flag(flag) => flag.to_string(),
            Self::Text(text) => text.clone(),
            Self::Lines(lines) => lines.join("\n"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::Lines(value)
    }
}

/// The `[filter]` section: an ordered parameter mapping.
///
/// Keys are the control flags (`setHeadersAfterServlet`, `appendValues`)
/// or header names. Declaration order is kept, and it is the order headers
/// are applied in. A `null` value (JSON only) is kept as an absent
/// parameter.
///
/// # Example
///
/// ```
/// use heron_config::FilterParams;
///
/// let filter: FilterParams = toml::from_str(r#"
///     appendValues = true
///     "x-frame-options" = "DENY"
///     "x-multi" = ["a", "b"]
/// "#).unwrap();
///
/// let spec = filter.header_spec();
/// assert!(spec.append_on_conflict());
/// assert_eq!(spec.names().collect::<Vec<_>>(), ["x-frame-options", "x-multi"]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FilterParams(IndexMap<String, Option<ParamValue>>);

impl FilterParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, keeping the position of an existing key.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), Some(value.into()));
    }

    /// Sets a header parameter, matching an existing key case-insensitively.
    ///
    /// The existing key's spelling and position are kept, so a value from
    /// the environment replaces the file's value in place.
    pub fn override_header(&mut self, name: &str, value: impl Into<ParamValue>) {
        let value = Some(value.into());
        match self.0.keys().position(|k| k.eq_ignore_ascii_case(name)) {
            Some(index) => {
                if let Some((_, slot)) = self.0.get_index_mut(index) {
                    *slot = value;
                }
            }
            None => {
                self.0.insert(name.to_string(), value);
            }
        }
    }

    /// Returns a parameter value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name).and_then(Option::as_ref)
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the parameters as raw strings, in declaration order.
    pub fn params(&self) -> impl Iterator<Item = (&str, Option<String>)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref().map(ParamValue::as_param)))
    }

    /// Parses the parameters into a [`heron_core::HeaderSpec`].
    #[must_use]
    pub fn header_spec(&self) -> heron_core::HeaderSpec {
        heron_core::HeaderSpec::from_nullable_params(self.params())
    }
}

impl<K, V> FromIterator<(K, V)> for FilterParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}
