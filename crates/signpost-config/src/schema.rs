//! Configuration section types.

use serde::{Deserialize, Serialize};
use signpost_telemetry::LogConfig;
use std::path::PathBuf;

/// Route discovery and client generation settings.
///
/// # Example
///
/// ```
/// use signpost_config::CodegenSection;
///
/// let section = CodegenSection {
///     base_path: "/api".to_string(),
///     query_cache: true,
///     ..Default::default()
/// };
/// assert_eq!(section.root, std::path::PathBuf::from("."));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CodegenSection {
    /// Project root holding `app/` or `src/app/`.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Prefix applied to every generated URL.
    #[serde(default)]
    pub base_path: String,

    /// Fixed absolute origin for generated calls.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Emit query/mutation wrappers for the reactive cache.
    #[serde(default)]
    pub query_cache: bool,
}

impl Default for CodegenSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            base_path: String::new(),
            base_url: None,
            query_cache: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Whether logging is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingSection {
    /// Converts the section into the telemetry crate's config.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Pretty => LogConfig::default(),
            LogFormat::Json => LogConfig::production(),
        };
        LogConfig {
            enabled: self.enabled,
            ..base.with_level(self.level.clone())
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Client runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    /// Origin used for every call when set.
    #[serde(default)]
    pub origin: Option<String>,

    /// Origin used for server-side calls.
    #[serde(default)]
    pub server_origin: Option<String>,

    /// Port used to derive the local server-side origin.
    #[serde(default)]
    pub port: Option<u16>,

    /// Per-call timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}
