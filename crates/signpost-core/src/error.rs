//! Error types for signpost.
//!
//! Two families of errors exist:
//!
//! - [`BuildError`] is raised while a chain is being assembled (conflicting
//!   shapes, unsatisfiable context). It never reaches a client.
//! - [`HandlerError`] is raised while a request runs. The finalizer maps each
//!   variant to a response:
//!
//! | Variant      | Response                                   |
//! |--------------|--------------------------------------------|
//! | `Redirect`   | redirect with `Location`, default 307      |
//! | `NotFound`   | 404 error envelope                         |
//! | `BadRequest` | 400 error envelope                         |
//! | `Internal`   | 500 error envelope, "Unknown error" if empty |

use http::StatusCode;
use std::fmt;
use thiserror::Error;

use crate::schema::ValidationError;

/// Result type alias using [`HandlerError`].
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Which part of a route spec a build error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecSection {
    /// Query string fields.
    Query,
    /// Cookie fields.
    Cookies,
    /// Request body.
    Body,
}

impl fmt::Display for SpecSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Cookies => write!(f, "cookies"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// Errors raised while assembling a chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The same field was declared twice with different schemas.
    #[error("conflicting {section} field '{field}': declared with different schemas")]
    FieldConflict {
        /// Section the field belongs to.
        section: SpecSection,
        /// Field name.
        field: String,
    },

    /// Two body shapes cannot be merged.
    #[error("conflicting body shapes: only object bodies can be merged")]
    BodyConflict,

    /// A route parameter was declared both as single and catch-all.
    #[error("route param '{name}' declared as both single and catch-all")]
    ParamConflict {
        /// Parameter name.
        name: String,
    },

    /// A query or cookie shape was not an object schema.
    #[error("{section} shape must be an object schema")]
    NotAnObject {
        /// Offending section.
        section: SpecSection,
    },

    /// A top-level chain requires context nothing can provide.
    #[error("chain requires context that no outer chain provides: {}", keys.join(", "))]
    UnsatisfiedContext {
        /// Missing context keys.
        keys: Vec<String>,
    },
}

/// Errors raised by steps and terminal handlers while a request runs.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Intentional redirect. Rendered as a redirect response, not an error.
    #[error("redirect to {location} ({status})")]
    Redirect {
        /// Target URL.
        location: String,
        /// Redirect status, 307 unless specified.
        status: StatusCode,
    },

    /// The requested resource does not exist.
    #[error("{message}")]
    NotFound {
        /// Message placed in the error envelope.
        message: String,
    },

    /// Input failed to parse or validate.
    #[error("{message}")]
    BadRequest {
        /// Message placed in the error envelope.
        message: String,
    },

    /// Any other failure.
    #[error("{message}")]
    Internal {
        /// Message placed in the error envelope. May be empty.
        message: String,
    },
}

impl HandlerError {
    /// Creates a temporary (307) redirect.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::redirect_with_status(location, StatusCode::TEMPORARY_REDIRECT)
    }

    /// Creates a redirect with an explicit status.
    pub fn redirect_with_status(location: impl Into<String>, status: StatusCode) -> Self {
        Self::Redirect {
            location: location.into(),
            status,
        }
    }

    /// Creates a not-found error with the default message.
    #[must_use]
    pub fn not_found() -> Self {
        Self::not_found_with("Not found")
    }

    /// Creates a not-found error with a custom message.
    pub fn not_found_with(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a bad-request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Redirect { status, .. } => *status,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message for the error envelope.
    #[must_use]
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.is_empty() {
            "Unknown error".to_string()
        } else {
            message
        }
    }

    /// Returns true for [`HandlerError::Redirect`].
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }
}

impl From<ValidationError> for HandlerError {
    fn from(error: ValidationError) -> Self {
        Self::bad_request(error.to_string())
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}
