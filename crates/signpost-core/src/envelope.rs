//! The JSON envelope every handler response is wrapped in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope: `{"status":"ok","data":..}` or
/// `{"status":"error","message":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T = Value> {
    /// Successful result.
    Ok {
        /// Handler output.
        data: T,
    },
    /// Failure reported by the server.
    Error {
        /// Human-readable message.
        message: String,
    },
}

impl<T> Envelope<T> {
    /// Wraps a successful value.
    pub fn ok(data: T) -> Self {
        Self::Ok { data }
    }

    /// Wraps an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Converts into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the message of an `Error` envelope.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Ok { data } => Ok(data),
            Self::Error { message } => Err(message),
        }
    }
}
