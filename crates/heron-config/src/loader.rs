//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use heron_core::{APPEND_ON_CONFLICT_PARAM, APPLY_AFTER_DOWNSTREAM_PARAM};

use crate::{ConfigError, HeronConfig, LogFormat};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Environment Variables
///
/// With prefix `HERON`:
///
/// | Variable | Sets |
/// |----------|------|
/// | `HERON__SERVER__HTTP_ADDR` | `server.http_addr` |
/// | `HERON__LOGGING__LEVEL` | `logging.level` |
/// | `HERON__METRICS__ENABLED` | `metrics.enabled` |
/// | `HERON__FILTER__APPEND_VALUES` | `filter.appendValues` |
/// | `HERON__FILTER__SET_HEADERS_AFTER_SERVLET` | `filter.setHeadersAfterServlet` |
/// | `HERON__HEADER__X_FRAME_OPTIONS` | header `x-frame-options` |
///
/// Header variable names are lowercased and `_` becomes `-`. An empty
/// value blanks the header, which removes it from the spec.
///
/// # Example
///
/// ```no_run
/// use heron_config::ConfigLoader;
///
/// # fn main() -> Result<(), heron_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("heron.toml")?
///     .with_env_prefix("HERON")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HeronConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HeronConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HeronConfig::default();
        self
    }

    /// Start with the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HeronConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HeronConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let file_config = Self::parse_file(&content, path)?;
        tracing::debug!(
            path = %path.display(),
            filter_params = file_config.filter.len(),
            "Loaded configuration file"
        );
        self.config = file_config;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `"toml"` or `"json"` format.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [filter]
    ///     "x-content-type-options" = "nosniff"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.header_spec().len(), 1);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if one exists.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ConfigError::validation_error(format!(
                    "failed to load .env file: {e}"
                )))
            }
        }
        Ok(self)
    }

    /// Applies environment overrides and validates the result.
    pub fn load(mut self) -> Result<HeronConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HeronConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<HeronConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        // Sorted so that new headers land in a stable order.
        let env_vars: BTreeMap<String, String> =
            env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            // Server section
            ["SERVER", "HTTP_ADDR"] => {
                self.config.server.http_addr = value.to_string();
            }
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                self.config.server.shutdown_timeout_secs = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                self.config.server.request_timeout_ms = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }

            // Logging section
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => {
                self.config.logging.ansi_enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Metrics section
            ["METRICS", "ENABLED"] => {
                self.config.metrics.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["METRICS", "ADDR"] => {
                self.config.metrics.addr = value.to_string();
            }

            // Filter flags are parsed leniently by the filter itself.
            ["FILTER", "APPEND_VALUES"] => {
                self.config.filter.insert(APPEND_ON_CONFLICT_PARAM, value);
            }
            ["FILTER", "SET_HEADERS_AFTER_SERVLET"] => {
                self.config.filter.insert(APPLY_AFTER_DOWNSTREAM_PARAM, value);
            }

            ["HEADER", name] if !name.is_empty() => {
                let header = name.to_lowercase().replace('_', "-");
                self.config.filter.override_header(&header, value);
            }

            _ => {
                tracing::debug!(var = %key, "Ignoring unrecognised environment override");
            }
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
