//! Cookie extraction and `Set-Cookie` building.
//!
//! # Example
//!
//! ```rust
//! use signpost_extract::{SameSite, SetCookie};
//!
//! let header = SetCookie::new("session", "abc123")
//!     .http_only(true)
//!     .same_site(SameSite::Strict)
//!     .path("/")
//!     .to_header_value();
//! assert_eq!(header, "session=abc123; Path=/; HttpOnly; SameSite=Strict");
//! ```

use http::header::COOKIE;
use http::HeaderMap;
use serde_json::{Map, Value};
use signpost_core::Schema;
use std::fmt;
use std::time::Duration;

use crate::error::{ExtractionError, ExtractionSource};
use crate::query::collect_repeated;

/// `Expires` value used when deleting a cookie.
const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Collects every `Cookie` header into a flat JSON object.
///
/// Pairs are split on `;`, whitespace and surrounding quotes are trimmed. A
/// name sent more than once collapses into an ordered list.
///
/// # Example
///
/// ```rust
/// use http::{header::COOKIE, HeaderMap, HeaderValue};
/// use serde_json::json;
/// use signpost_extract::raw_cookies;
///
/// let mut headers = HeaderMap::new();
/// headers.append(COOKIE, HeaderValue::from_static("a=1; theme=dark"));
/// headers.append(COOKIE, HeaderValue::from_static("a=2"));
///
/// assert_eq!(raw_cookies(&headers), json!({"a": ["1", "2"], "theme": "dark"}));
/// ```
#[must_use]
pub fn raw_cookies(headers: &HeaderMap) -> Value {
    let pairs = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().trim_matches('"').to_string()))
        });

    Value::Object(collect_repeated(pairs))
}

/// Validates raw cookies against the declared shape.
///
/// With no declared shape the result is an empty object.
pub fn parse_cookies(raw: &Value, shape: Option<&Schema>) -> Result<Value, ExtractionError> {
    match shape {
        Some(schema) => schema
            .parse_coerced(raw)
            .map_err(|e| ExtractionError::invalid(ExtractionSource::Cookies, e)),
        None => Ok(Value::Object(Map::new())),
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Sent with cross-site requests.
    None,
    /// Sent with same-site requests and top-level navigations.
    #[default]
    Lax,
    /// Only sent with same-site requests.
    Strict,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Lax => write!(f, "Lax"),
            Self::Strict => write!(f, "Strict"),
        }
    }
}

/// Builder for a `Set-Cookie` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    max_age: Option<Duration>,
    expires: Option<String>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    /// Creates a cookie with the given name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            max_age: None,
            expires: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// Creates a cookie that tells the client to drop `name`.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age_secs(0).expires(EPOCH)
    }

    /// Sets `Domain`.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets `Path`.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets `Max-Age`.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.max_age = Some(duration);
        self
    }

    /// Sets `Max-Age` in seconds.
    #[must_use]
    pub fn max_age_secs(self, seconds: u64) -> Self {
        self.max_age(Duration::from_secs(seconds))
    }

    /// Sets `Expires` (HTTP date).
    #[must_use]
    pub fn expires(mut self, date: impl Into<String>) -> Self {
        self.expires = Some(date.into());
        self
    }

    /// Sets `Secure`.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets `HttpOnly`.
    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Sets `SameSite`.
    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true if this cookie deletes rather than sets.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.max_age == Some(Duration::ZERO)
    }

    /// Renders the `Set-Cookie` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.name, self.value)];

        if let Some(ref domain) = self.domain {
            parts.push(format!("Domain={domain}"));
        }
        if let Some(ref path) = self.path {
            parts.push(format!("Path={path}"));
        }
        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={}", max_age.as_secs()));
        }
        if let Some(ref expires) = self.expires {
            parts.push(format!("Expires={expires}"));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        if let Some(same_site) = self.same_site {
            parts.push(format!("SameSite={same_site}"));
        }

        parts.join("; ")
    }
}
