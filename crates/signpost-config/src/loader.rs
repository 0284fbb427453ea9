//! Configuration loader with layered approach.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, LogFormat, SignpostConfig};

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "signpost.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SIGNPOST";

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. `.env` file, loaded into the process environment
/// 4. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use signpost_config::ConfigLoader;
///
/// # fn main() -> Result<(), signpost_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("signpost.toml")?
///     .with_dotenv()?
///     .with_env_prefix("SIGNPOST")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: SignpostConfig,
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
            config: SignpostConfig::default(),
            env_prefix: None,
        }
    }

    /// The standard stack for a project root: `{root}/signpost.toml` if
    /// present, then `.env`, then `SIGNPOST__*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed.
    pub fn for_project(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path: PathBuf = root.as_ref().join(CONFIG_FILE_NAME);
        Ok(Self::new()
            .with_optional_file(path)?
            .with_dotenv()?
            .with_env_prefix(ENV_PREFIX))
    }

    /// Start with development preset configuration.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = SignpostConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = SignpostConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is picked from the extension (`.toml` or `.json`).
    /// Unknown fields are rejected.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
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

    /// Load configuration from a string in `format` ("toml" or "json").
    ///
    /// # Example
    ///
    /// ```
    /// use signpost_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [codegen]
    ///     base_path = "/api"
    ///     query_cache = true
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.codegen.base_path, "/api");
    /// assert!(config.codegen.query_cache);
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

    /// Loads a `.env` file into the process environment, if one exists.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::invalid_config(format!("invalid .env file: {e}"))),
        }
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates.
    pub fn load(mut self) -> Result<SignpostConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Returns the configuration without environment overrides or
    /// validation.
    #[must_use]
    pub fn load_unvalidated(self) -> SignpostConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<SignpostConfig, ConfigError> {
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
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();

        match parts.as_slice() {
            ["CODEGEN", "ROOT"] => {
                self.config.codegen.root = PathBuf::from(value);
            }
            ["CODEGEN", "BASE_PATH"] => {
                self.config.codegen.base_path = value.to_string();
            }
            ["CODEGEN", "BASE_URL"] => {
                self.config.codegen.base_url = non_empty(value);
            }
            ["CODEGEN", "QUERY_CACHE"] => {
                self.config.codegen.query_cache = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

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

            ["CLIENT", "ORIGIN"] => {
                self.config.client.origin = non_empty(value);
            }
            ["CLIENT", "SERVER_ORIGIN"] => {
                self.config.client.server_origin = non_empty(value);
            }
            ["CLIENT", "PORT"] => {
                self.config.client.port = Some(
                    value
                        .parse()
                        .map_err(|_| ConfigError::env_parse_error(key, "expected port number"))?,
                );
            }
            ["CLIENT", "TIMEOUT_MS"] => {
                self.config.client.timeout_ms = Some(
                    value
                        .parse()
                        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?,
                );
            }

            _ => {
                tracing::debug!(var = key, "ignoring unknown configuration variable");
            }
        }

        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, SignpostConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");

        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"client": {"port": 4000}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.client.port, Some(4000));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_loader_rejects_unknown_section() {
        let result = ConfigLoader::new().with_string("[server]\nport = 1", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_loader_unsupported_format() {
        let err = ConfigLoader::new().with_string("", "yaml").unwrap_err();
        assert!(err.to_string().contains("unsupported configuration format"));
    }

    #[test]
    fn test_loader_with_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[codegen]\nbase_url = \"https://api.example.com\"\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
        assert_eq!(
            config.codegen.base_url.as_deref(),
            Some("https://api.example.com")
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/signpost.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/signpost.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, SignpostConfig::default());
    }

    #[test]
    fn test_load_validates() {
        let toml = "[codegen]\nbase_url = \"https://x.dev/\"\n";
        let err = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.codegen.base_url.as_deref(), Some("https://x.dev/"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_apply_env_var_codegen() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__CODEGEN__ROOT", "/srv/app", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__CODEGEN__QUERY_CACHE", "yes", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__CODEGEN__BASE_URL", "", "TEST")
            .unwrap();
        assert_eq!(loader.config.codegen.root, PathBuf::from("/srv/app"));
        assert!(loader.config.codegen.query_cache);
        assert!(loader.config.codegen.base_url.is_none());
    }

    #[test]
    fn test_apply_env_var_logging_and_client() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__LOGGING__FORMAT", "json", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST__CLIENT__PORT", "8080", "TEST")
            .unwrap();
        assert_eq!(loader.config.logging.format, LogFormat::Json);
        assert_eq!(loader.config.client.port, Some(8080));
    }

    #[test]
    fn test_apply_env_var_invalid() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_var("TEST__CLIENT__PORT", "http", "TEST")
            .unwrap_err();
        assert!(err.to_string().contains("TEST__CLIENT__PORT"));

        let err = loader
            .apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST")
            .unwrap_err();
        assert!(err.to_string().contains("expected 'json' or 'pretty'"));
    }

    #[test]
    fn test_apply_env_var_unknown_ignored() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST__SERVER__PORT", "1", "TEST")
            .unwrap();
        assert_eq!(loader.config, SignpostConfig::default());
    }
}
