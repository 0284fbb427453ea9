//! Test error types.

use thiserror::Error;

/// Errors that can occur while driving a route table in tests.
#[derive(Error, Debug)]
pub enum TestError {
    /// Request building failed
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// Response body reading failed
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Header name or value is invalid
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The loopback server could not bind
    #[error("Server bind error: {0}")]
    Bind(#[from] std::io::Error),
}

impl TestError {
    /// Creates a request build error.
    pub fn request_build(message: impl Into<String>) -> Self {
        Self::RequestBuild(message.into())
    }

    /// Creates an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader(message.into())
    }
}
