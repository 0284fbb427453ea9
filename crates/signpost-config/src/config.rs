//! Top-level configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ClientSection, CodegenSection, ConfigError, LogFormat, LoggingSection};

/// Complete signpost configuration.
///
/// # Example
///
/// ```
/// use signpost_config::SignpostConfig;
///
/// let config = SignpostConfig::default();
/// assert_eq!(config.logging.level, "info");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SignpostConfig {
    /// Route discovery and generation.
    #[serde(default)]
    pub codegen: CodegenSection,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Client runtime.
    #[serde(default)]
    pub client: ClientSection,
}

impl SignpostConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an invalid base URL, client
    /// origin or log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_url) = &self.codegen.base_url {
            check_origin("codegen.base_url", base_url)?;
        }
        if let Some(origin) = &self.client.origin {
            check_origin("client.origin", origin)?;
        }
        if let Some(origin) = &self.client.server_origin {
            check_origin("client.server_origin", origin)?;
        }

        signpost_telemetry::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        Ok(())
    }

    /// Debug-level pretty logging.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Info-level JSON logging.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

fn check_origin(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.ends_with('/') {
        return Err(ConfigError::invalid_value(field, "must not end with a slash"));
    }
    match Url::parse(value) {
        Ok(url) if url.has_host() => Ok(()),
        _ => Err(ConfigError::invalid_value(
            field,
            "must be a valid URL and include a protocol and host",
        )),
    }
}
