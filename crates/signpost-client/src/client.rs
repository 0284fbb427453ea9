//! The request runtime.

use http::header::ACCEPT;
use http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use signpost_config::ClientSection;
use signpost_core::Envelope;
use signpost_router::build_path;
use std::time::Duration;
use url::Url;

use crate::error::{RequestError, RequestErrorKind, RequestResult, Settled};
use crate::input::RequestInput;
use crate::origin::{resolve_origin, server_side_origin, ExecutionSide};
use crate::route::{ApiRoute, IntoRouteParams};

/// Executes calls against generated routes.
///
/// Each call makes exactly one request. There are no retries.
///
/// ```rust,no_run
/// use signpost_client::{ApiClient, ApiRoute, Empty, RequestInput, RequestMethod, RouteParams};
///
/// struct GetUser;
///
/// impl ApiRoute for GetUser {
///     const METHOD: RequestMethod = RequestMethod::Get;
///     const TEMPLATE: &'static str = "/api/users/:id";
///     type Params = RouteParams;
///     type Query = Empty;
///     type Body = Empty;
///     type Response = serde_json::Value;
/// }
///
/// # async fn run() -> Result<(), signpost_client::RequestError> {
/// let client = ApiClient::new().with_origin("http://localhost:3000");
/// let user = client
///     .request(RequestInput::<GetUser>::new(RouteParams::new().with("id", "42")))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    origin: Option<String>,
    server_origin: Option<String>,
    page_origin: Option<String>,
    side: ExecutionSide,
    timeout: Option<Duration>,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    /// A client with no origins configured.
    pub fn new() -> Self {
        Self::with_http_client(Client::new())
    }

    /// A client that sends through `http`.
    pub fn with_http_client(http: Client) -> Self {
        Self {
            http,
            origin: None,
            server_origin: None,
            page_origin: None,
            side: ExecutionSide::default(),
            timeout: None,
        }
    }

    /// A client configured from the `[client]` section.
    ///
    /// Without an explicit `server_origin` the server-side origin is derived
    /// with [`server_side_origin`].
    pub fn from_config(section: &ClientSection) -> Self {
        let server_origin = section
            .server_origin
            .clone()
            .unwrap_or_else(|| server_side_origin(section.port));
        Self {
            origin: section.origin.clone(),
            server_origin: Some(server_origin),
            timeout: section.timeout_ms.map(Duration::from_millis),
            ..Self::new()
        }
    }

    /// Sets the configured origin if `base_url` is given.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url {
            self.origin = Some(url.to_string());
        }
        self
    }

    /// Sets the configured origin.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Sets the origin used for server-side calls.
    #[must_use]
    pub fn with_server_origin(mut self, origin: impl Into<String>) -> Self {
        self.server_origin = Some(origin.into());
        self
    }

    /// Sets the page origin used for client-side calls.
    #[must_use]
    pub fn with_page_origin(mut self, origin: impl Into<String>) -> Self {
        self.page_origin = Some(origin.into());
        self
    }

    /// Overrides the execution side.
    #[must_use]
    pub fn with_side(mut self, side: ExecutionSide) -> Self {
        self.side = side;
        self
    }

    /// Sets the default timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Execution side.
    pub fn side(&self) -> ExecutionSide {
        self.side
    }

    /// Builds the full URL for a call, query string included.
    ///
    /// # Errors
    ///
    /// Returns `network-error` if no origin applies or it is not a URL, and
    /// `unknown` if the parameters do not fit the template or the query is
    /// not a map.
    pub fn build_url<R: ApiRoute>(&self, input: &RequestInput<R>) -> RequestResult<Url> {
        let path = build_path(R::TEMPLATE, &input.params.to_route_params())
            .map_err(|e| RequestError::new(RequestErrorKind::Unknown, e.to_string()))?;

        let origin = resolve_origin(
            input.options.origin.as_deref(),
            self.origin.as_deref(),
            self.side,
            self.server_origin.as_deref(),
            self.page_origin.as_deref(),
        )
        .ok_or_else(|| RequestError::network(format!("no origin configured for {}", R::TEMPLATE)))?;

        let mut url = Url::parse(origin)
            .and_then(|base| base.join(&path))
            .map_err(|e| RequestError::network(format!("invalid origin '{origin}': {e}")))?;

        if let Some(query) = &input.query {
            let pairs = query_pairs(query)?;
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }
        Ok(url)
    }

    /// Calls route `R` and returns the response data.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] classified by status, or `network-error`
    /// when no response was obtained.
    pub async fn request<R: ApiRoute>(&self, input: RequestInput<R>) -> RequestResult<R::Response> {
        let value = self.fetch(&input).await?;
        decode::<R>(value)
    }

    /// Like [`request`](Self::request), but never returns `Err`.
    pub async fn request_settled<R: ApiRoute>(&self, input: RequestInput<R>) -> Settled<R::Response> {
        self.request(input).await.into()
    }

    /// Sends the request and returns the unwrapped JSON data.
    pub(crate) async fn fetch<R: ApiRoute>(&self, input: &RequestInput<R>) -> RequestResult<Value> {
        let url = self.build_url(input)?;
        tracing::debug!(method = %R::METHOD, url = %url, route = R::TEMPLATE, "sending request");

        let mut builder = self
            .http
            .request(R::METHOD.to_http(), url)
            .header(ACCEPT, "application/json")
            .headers(input.options.headers.clone());

        if let Some(timeout) = input.options.timeout.or(self.timeout) {
            builder = builder.timeout(timeout);
        }
        if R::METHOD.has_body() {
            if let Some(body) = &input.body {
                builder = builder.json(body);
            }
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let result = interpret(status, &text);
        if let Err(e) = &result {
            tracing::debug!(route = R::TEMPLATE, kind = %e.kind, "request failed");
        }
        result
    }
}

/// Turns a status and body into data or a classified error.
fn interpret(status: StatusCode, text: &str) -> RequestResult<Value> {
    let parsed = serde_json::from_str::<Value>(text).ok();

    if !status.is_success() {
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| (!text.is_empty()).then(|| text.to_string()))
            .unwrap_or_else(|| status.to_string());
        return Err(RequestError::new(RequestErrorKind::from_status(status), message).with_data(parsed));
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let Some(value) = parsed else {
        return Err(RequestError::new(
            RequestErrorKind::Unknown,
            "response body is not JSON",
        ));
    };

    match Envelope::<Value>::deserialize(&value) {
        Ok(Envelope::Ok { data }) => Ok(data),
        Ok(Envelope::Error { message }) => {
            Err(RequestError::new(RequestErrorKind::ServerError, message).with_data(Some(value)))
        }
        Err(_) => Ok(value),
    }
}

pub(crate) fn decode<R: ApiRoute>(value: Value) -> RequestResult<R::Response> {
    serde_json::from_value(value).map_err(|e| {
        RequestError::new(
            RequestErrorKind::Unknown,
            format!("unexpected response for {}: {e}", R::TEMPLATE),
        )
    })
}

/// Flattens a query value into string pairs. Lists repeat the key, nulls are
/// skipped.
fn query_pairs<Q: Serialize>(query: &Q) -> RequestResult<Vec<(String, String)>> {
    let value = serde_json::to_value(query)
        .map_err(|e| RequestError::new(RequestErrorKind::Unknown, e.to_string()))?;

    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(RequestError::new(
                RequestErrorKind::Unknown,
                format!("query must be a map, got {other}"),
            ))
        }
    };

    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(text) = scalar_text(item) {
                        pairs.push((key.clone(), text));
                    }
                }
            }
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key, text));
                }
            }
        }
    }
    Ok(pairs)
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
