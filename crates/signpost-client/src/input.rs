//! Per-call input bundles.

use http::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

use crate::route::ApiRoute;

/// Transport overrides for a single call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Extra request headers.
    pub headers: HeaderMap,
    /// Timeout for this call only.
    pub timeout: Option<Duration>,
    /// Origin for this call only. Takes precedence over every other origin.
    pub origin: Option<String>,
}

impl CallOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the origin.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Everything one call to route `R` needs.
///
/// A missing query or body is simply not sent.
pub struct RequestInput<R: ApiRoute> {
    /// Route parameters.
    pub params: R::Params,
    /// Query values.
    pub query: Option<R::Query>,
    /// Request body. Ignored for methods without a body.
    pub body: Option<R::Body>,
    /// Transport overrides.
    pub options: CallOptions,
}

impl<R: ApiRoute> RequestInput<R> {
    /// Input with route parameters only.
    pub fn new(params: R::Params) -> Self {
        Self {
            params,
            query: None,
            body: None,
            options: CallOptions::default(),
        }
    }

    /// Sets the query.
    #[must_use]
    pub fn with_query(mut self, query: R::Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: R::Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the transport overrides.
    #[must_use]
    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }
}

impl<R: ApiRoute> Default for RequestInput<R>
where
    R::Params: Default,
{
    fn default() -> Self {
        Self::new(R::Params::default())
    }
}
