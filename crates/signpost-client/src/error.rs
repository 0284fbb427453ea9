//! Client failures.

use http::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Coarse failure category, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestErrorKind {
    /// 401.
    Unauthorized,
    /// 403.
    Forbidden,
    /// 404.
    NotFound,
    /// Any 5xx, or an `error` envelope.
    ServerError,
    /// Any other 4xx.
    BadRequest,
    /// No response was obtained.
    NetworkError,
    /// Anything else.
    Unknown,
}

impl RequestErrorKind {
    /// Classifies a non-success status.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500.. => Self::ServerError,
            400..=499 => Self::BadRequest,
            _ => Self::Unknown,
        }
    }

    /// Kebab-case name, e.g. `not-found`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not-found",
            Self::ServerError => "server-error",
            Self::BadRequest => "bad-request",
            Self::NetworkError => "network-error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct RequestError {
    /// Failure category.
    pub kind: RequestErrorKind,
    /// Server message, response text, or transport error.
    pub message: String,
    /// Response body, if it was JSON.
    pub data: Option<Value>,
}

impl RequestError {
    /// Creates an error without data.
    pub fn new(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a `network-error`.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::NetworkError, message)
    }

    /// Attaches response data.
    #[must_use]
    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    /// True if the error is of `kind`.
    pub fn is(&self, kind: RequestErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        Self::network(e.to_string())
    }
}

/// Result alias for client calls.
pub type RequestResult<T> = Result<T, RequestError>;

/// Outcome of a call that does not raise.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    /// The call succeeded.
    Ok(T),
    /// The call failed.
    Error(RequestError),
}

impl<T> Settled<T> {
    /// True for [`Settled::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// The data, if the call succeeded.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ok(data) => Some(data),
            Self::Error(_) => None,
        }
    }

    /// The error, if the call failed.
    pub fn error(&self) -> Option<&RequestError> {
        match self {
            Self::Ok(_) => None,
            Self::Error(e) => Some(e),
        }
    }

    /// Converts back into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the held error.
    pub fn into_result(self) -> RequestResult<T> {
        match self {
            Self::Ok(data) => Ok(data),
            Self::Error(e) => Err(e),
        }
    }
}

impl<T> From<RequestResult<T>> for Settled<T> {
    fn from(result: RequestResult<T>) -> Self {
        match result {
            Ok(data) => Self::Ok(data),
            Err(e) => Self::Error(e),
        }
    }
}
