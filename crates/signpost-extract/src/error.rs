//! Extraction error types.

use http::StatusCode;
use signpost_core::{HandlerError, ValidationError, ValidationIssue};
use std::fmt;

/// Part of the request an extraction error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Query string.
    Query,
    /// `Cookie` headers.
    Cookies,
    /// Request body.
    Body,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Cookies => write!(f, "cookies"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// What went wrong while extracting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    /// The raw input could not be decoded (bad JSON, bad UTF-8, bad
    /// url-encoding).
    Malformed,
    /// The decoded input did not satisfy the declared shape.
    Invalid,
}

/// Error raised while parsing a request's inputs.
///
/// # Example
///
/// ```rust
/// use signpost_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::malformed(ExtractionSource::Body, "expected value at line 1");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.source(), ExtractionSource::Body);
/// assert!(err.to_string().starts_with("malformed body"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionError {
    source: ExtractionSource,
    kind: ExtractionErrorKind,
    message: String,
    issues: Vec<ValidationIssue>,
}

impl ExtractionError {
    /// Creates an error for undecodable input.
    pub fn malformed(source: ExtractionSource, details: impl Into<String>) -> Self {
        Self {
            source,
            kind: ExtractionErrorKind::Malformed,
            message: format!("malformed {source}: {}", details.into()),
            issues: Vec::new(),
        }
    }

    /// Creates an error for input that failed validation.
    pub fn invalid(source: ExtractionSource, error: ValidationError) -> Self {
        Self {
            source,
            kind: ExtractionErrorKind::Invalid,
            message: format!("invalid {source}: {error}"),
            issues: error.issues().to_vec(),
        }
    }

    /// Returns where the error came from.
    #[must_use]
    pub fn source(&self) -> ExtractionSource {
        self.source
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> ExtractionErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns individual validation issues, empty for malformed input.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Status code used by the default parse-error response.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExtractionError {}

impl From<ExtractionError> for HandlerError {
    fn from(error: ExtractionError) -> Self {
        HandlerError::bad_request(error.message)
    }
}
