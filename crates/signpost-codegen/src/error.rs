//! Code generation errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while discovering routes or writing the client.
#[derive(Error, Debug)]
pub enum CodegenError {
    /// The configured base URL ends with a slash.
    #[error("baseUrl must not end with a slash")]
    BaseUrlTrailingSlash,

    /// The configured base URL is not an absolute URL.
    #[error("baseUrl must be a valid URL and include a protocol and host. For example: https://example.com")]
    BaseUrlInvalid,

    /// A directory or file could not be read or written.
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file watcher could not be set up.
    #[error("watch error: {0}")]
    Watch(#[from] signpost_config::ConfigError),
}

impl CodegenError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
