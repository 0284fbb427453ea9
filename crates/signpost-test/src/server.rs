//! A loopback HTTP server for exercising real HTTP clients.

use crate::error::TestError;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use signpost_extract::response::error_envelope;
use signpost_extract::Response;
use signpost_middleware::RouteTable;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Serves a [`RouteTable`] on `127.0.0.1` with an ephemeral port.
///
/// The server stops when dropped.
///
/// ```rust
/// use serde_json::json;
/// use signpost_middleware::{api, RouteTable, Scope};
/// use signpost_test::TestServer;
///
/// # tokio_test::block_on(async {
/// let mut table = RouteTable::new();
/// table
///     .route("/ping", api().get(|_scope: Scope| async { json!("pong") }).unwrap())
///     .unwrap();
///
/// let server = TestServer::start(table).await.unwrap();
/// assert!(server.url("/ping").starts_with("http://127.0.0.1:"));
/// # });
/// ```
#[derive(Debug)]
pub struct TestServer {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_loop: JoinHandle<()>,
}

impl TestServer {
    /// Binds and starts serving `table`.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Bind`] if the listener cannot be bound.
    pub async fn start(table: RouteTable) -> Result<Self, TestError> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let (shutdown, rx) = watch::channel(false);
        let table = Arc::new(table);

        let accept_loop = tokio::spawn(accept(listener, table, rx));
        tracing::debug!(%addr, "test server listening");

        Ok(Self {
            addr,
            shutdown,
            accept_loop,
        })
    }

    /// The bound address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The origin, e.g. `http://127.0.0.1:41234`.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.origin())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        self.accept_loop.abort();
    }
}

async fn accept(listener: TcpListener, table: Arc<RouteTable>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, remote) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                let table = Arc::clone(&table);
                let mut shutdown = shutdown.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: http::Request<Incoming>| {
                        let table = Arc::clone(&table);
                        async move { Ok::<_, Infallible>(serve(&table, req).await) }
                    });
                    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                    tokio::select! {
                        result = conn => {
                            if let Err(e) = result {
                                tracing::debug!(%remote, error = %e, "connection error");
                            }
                        }
                        _ = shutdown.changed() => {}
                    }
                });
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn serve(table: &RouteTable, request: http::Request<Incoming>) -> Response {
    let (parts, body) = request.into_parts();
    match body.collect().await {
        Ok(collected) => {
            let request = http::Request::from_parts(parts, Full::new(collected.to_bytes()));
            table.dispatch(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "failed to read request body");
            error_envelope(StatusCode::BAD_REQUEST, "Failed to read request body")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use signpost_core::{HandlerError, Schema};
    use signpost_middleware::{api, Scope};

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table
            .route(
                "/items/:id",
                api()
                    .params(["id"])
                    .get(|scope: Scope| async move {
                        match scope.param("id") {
                            Some("missing") => Err(HandlerError::not_found()),
                            id => Ok(json!({ "id": id })),
                        }
                    })
                    .unwrap(),
            )
            .unwrap()
            .route(
                "/items",
                api()
                    .body(Schema::object([("name", Schema::string())]))
                    .post(|scope: Scope| async move { scope.body().cloned().unwrap_or_default() })
                    .unwrap(),
            )
            .unwrap();
        table
    }

    #[tokio::test]
    async fn test_serves_over_loopback() {
        let server = TestServer::start(table()).await.unwrap();
        let body: Value = reqwest::get(server.url("/items/9"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"status": "ok", "data": {"id": "9"}}));
    }

    #[tokio::test]
    async fn test_post_body_and_errors() {
        let server = TestServer::start(table()).await.unwrap();
        let client = reqwest::Client::new();

        let created: Value = client
            .post(server.url("/items"))
            .json(&json!({"name": "lamp", "extra": true}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(created["data"], json!({"name": "lamp"}));

        let missing = client.get(server.url("/items/missing")).send().await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
