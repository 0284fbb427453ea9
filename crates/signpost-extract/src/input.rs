//! Parse-once extraction of every declared request input.

use bytes::Bytes;
use http::request::Parts;
use serde_json::Value;
use signpost_core::{BodyShape, RequestMethod, RouteSpec};
use signpost_router::RouteParams;

use crate::body::{body_text, parse_body};
use crate::cookie::{parse_cookies, raw_cookies};
use crate::error::ExtractionError;
use crate::query::{parse_query, raw_query};

/// Validated inputs for one request, shared read-only by every step.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    /// Route parameters from the dispatch layer.
    pub params: RouteParams,
    /// Query fields after validation.
    pub query: Value,
    /// Cookie fields after validation.
    pub cookies: Value,
    /// Validated body, when the method carries one and a shape is declared.
    pub body: Option<Value>,
    /// Raw body text, when the method carries one.
    ///
    /// Without a declared body shape, invalid UTF-8 is replaced rather than
    /// rejected.
    pub raw_body: Option<String>,
}

impl ParsedInput {
    /// Parses query, cookies and body of a request against `spec`.
    ///
    /// The body is read only for POST, PUT and PATCH, and decoded only when
    /// a body shape is declared.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bytes::Bytes;
    /// use serde_json::json;
    /// use signpost_core::{RouteSpec, Schema};
    /// use signpost_extract::ParsedInput;
    /// use signpost_router::RouteParams;
    ///
    /// let spec = RouteSpec::new()
    ///     .with_query(Schema::object([("q", Schema::string())]))
    ///     .unwrap();
    /// let (parts, ()) = http::Request::get("/search?q=rust").body(()).unwrap().into_parts();
    ///
    /// let input = ParsedInput::extract(&parts, &Bytes::new(), RouteParams::new(), &spec).unwrap();
    /// assert_eq!(input.query, json!({"q": "rust"}));
    /// assert_eq!(input.body, None);
    /// ```
    pub fn extract(
        parts: &Parts,
        body: &Bytes,
        params: RouteParams,
        spec: &RouteSpec,
    ) -> Result<Self, ExtractionError> {
        let raw = raw_query(parts.uri.query())?;
        let query = parse_query(&raw, spec.query_schema().as_ref())?;

        let raw = raw_cookies(&parts.headers);
        let cookies = parse_cookies(&raw, spec.cookie_schema().as_ref())?;

        let carries_body = RequestMethod::from_http(&parts.method).is_some_and(RequestMethod::has_body);
        let (body, raw_body) = match spec.body() {
            _ if !carries_body => (None, None),
            BodyShape::Ignore => (None, Some(String::from_utf8_lossy(body).into_owned())),
            shape => {
                let text = body_text(body)?;
                let parsed = parse_body(&text, shape)?;
                (parsed, Some(text))
            }
        };

        tracing::trace!(
            query_fields = spec.query().len(),
            cookie_fields = spec.cookies().len(),
            has_body = body.is_some(),
            "request input parsed"
        );

        Ok(Self {
            params,
            query,
            cookies,
            body,
            raw_body,
        })
    }
}
