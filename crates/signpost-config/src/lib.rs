//! Layered configuration for signpost.
//!
//! - TOML and JSON configuration files (`signpost.toml`)
//! - `.env` files via `dotenvy`
//! - Environment variable overrides (`SIGNPOST__SECTION__KEY`)
//! - Strict validation (fails on unknown fields)
//! - A `notify`-based [`FileWatcher`] for development mode
//!
//! # Configuration File Format
//!
//! ```toml
//! [codegen]
//! root = "."
//! base_path = "/api"
//! base_url = "https://api.example.com"
//! query_cache = true
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [client]
//! port = 3000
//! timeout_ms = 10000
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `SIGNPOST__CODEGEN__BASE_PATH=/api`
//! - `SIGNPOST__CODEGEN__QUERY_CACHE=true`
//! - `SIGNPOST__LOGGING__LEVEL=debug`
//! - `SIGNPOST__CLIENT__SERVER_ORIGIN=http://localhost:4000`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;
mod watcher;

pub use config::SignpostConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, CONFIG_FILE_NAME, ENV_PREFIX};
pub use schema::{ClientSection, CodegenSection, LogFormat, LoggingSection};
pub use watcher::{
    FileChangeEvent, FileChangeKind, FileWatcher, FileWatcherBuilder, FileWatcherConfig,
};
