//! Test client for in-memory HTTP testing.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use http::Method;
use signpost_middleware::RouteTable;
use std::sync::Arc;

/// A test client that dispatches requests straight into a [`RouteTable`].
///
/// No socket is opened. Requests go through the full route pipeline: parsing,
/// steps, terminal handler and response finalization.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use signpost_middleware::{api, RouteTable, Scope};
/// use signpost_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let mut table = RouteTable::new();
/// table
///     .route("/ping", api().get(|_scope: Scope| async { json!("pong") }).unwrap())
///     .unwrap();
///
/// let client = TestClient::new(table);
/// let response = client.get("/ping").send().await;
/// assert_eq!(response.status_code(), 200);
/// # });
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    table: Arc<RouteTable>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client over a route table.
    pub fn new(table: RouteTable) -> Self {
        Self::from_shared(Arc::new(table))
    }

    /// Creates a client over a shared route table.
    pub fn from_shared(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            default_headers: Vec::new(),
        }
    }

    /// Adds a default header that will be included in all requests.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a request builder for any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
        }
    }

    /// Sends a built request.
    pub async fn send_request(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let request = request.into_http_request()?;
        let response = self.table.dispatch(request).await;
        Ok(TestResponse::from_response(response).await)
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Adds a header to the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Authorization header with a Bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Adds a cookie to the request.
    pub fn cookie(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.cookie(name, value);
        self
    }

    /// Sets the request body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built. Use
    /// [`try_send`](Self::try_send) to handle that case.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request and returns a Result.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send_request(request).await
    }
}
