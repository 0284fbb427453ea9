//! HTTP methods a route file may export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A method a route handler can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

/// Error returned when a token is not a supported method.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported request method: {0}")]
pub struct ParseMethodError(pub String);

impl RequestMethod {
    /// Every method, in generation order.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
    ];

    /// Uppercase token, e.g. `"GET"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// True for methods whose requests carry a JSON body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// True for state-changing methods.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }

    /// Matches an exact uppercase token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == token)
    }

    /// Converts to an [`http::Method`].
    #[must_use]
    pub fn to_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Patch => http::Method::PATCH,
            Self::Delete => http::Method::DELETE,
            Self::Head => http::Method::HEAD,
            Self::Options => http::Method::OPTIONS,
        }
    }

    /// Converts from an [`http::Method`], if supported.
    #[must_use]
    pub fn from_http(method: &http::Method) -> Option<Self> {
        Self::from_token(method.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(&s.to_ascii_uppercase()).ok_or_else(|| ParseMethodError(s.to_string()))
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mutations: Vec<_> = RequestMethod::ALL
            .into_iter()
            .filter(|m| m.is_mutation())
            .collect();
        assert_eq!(
            mutations,
            vec![
                RequestMethod::Post,
                RequestMethod::Put,
                RequestMethod::Patch,
                RequestMethod::Delete
            ]
        );
        assert!(!RequestMethod::Delete.has_body());
        assert!(RequestMethod::Patch.has_body());
        assert!(!RequestMethod::Get.has_body());
    }

    #[test]
    fn test_from_token_is_exact() {
        assert_eq!(RequestMethod::from_token("GET"), Some(RequestMethod::Get));
        assert_eq!(RequestMethod::from_token("get"), None);
        assert_eq!(RequestMethod::from_token("TRACE"), None);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("patch".parse::<RequestMethod>(), Ok(RequestMethod::Patch));
        assert!("connect".parse::<RequestMethod>().is_err());
    }

    #[test]
    fn test_http_conversion() {
        for method in RequestMethod::ALL {
            assert_eq!(RequestMethod::from_http(&method.to_http()), Some(method));
        }
    }
}
