//! Client calls against a live loopback server.
//!
//! The route markers below are written the way the generator emits them.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use signpost_client::{
    ApiClient, ApiRoute, CallOptions, Empty, IntoRouteParams, MutationState, QueryClient,
    RequestErrorKind, RequestInput, RequestMethod, RouteParams, Settled,
};
use signpost_core::{HandlerError, Schema};
use signpost_extract::response::error_envelope;
use signpost_middleware::{api, RouteTable, Scope};
use signpost_test::TestServer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
struct NoParams {}

impl IntoRouteParams for NoParams {
    fn to_route_params(&self) -> RouteParams {
        RouteParams::new()
    }
}

#[derive(Debug, Clone, Default)]
struct FileParams {
    owner: String,
    path: Vec<String>,
}

impl IntoRouteParams for FileParams {
    fn to_route_params(&self) -> RouteParams {
        RouteParams::new()
            .with("owner", self.owner.clone())
            .with("path", self.path.clone())
    }
}

#[derive(Debug, Serialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct SearchResponse {
    query: String,
}

#[derive(Debug, Serialize)]
struct ItemBody {
    name: String,
}

macro_rules! route {
    ($marker:ident, $method:ident, $template:literal, $params:ty, $query:ty, $body:ty, $response:ty) => {
        struct $marker;

        impl ApiRoute for $marker {
            const METHOD: RequestMethod = RequestMethod::$method;
            const TEMPLATE: &'static str = $template;
            type Params = $params;
            type Query = $query;
            type Body = $body;
            type Response = $response;
        }
    };
}

route!(Search, Get, "/api/search", NoParams, SearchQuery, Empty, SearchResponse);
route!(Files, Get, "/api/files/:owner/*path", FileParams, Empty, Empty, Value);
route!(CreateItem, Post, "/api/items", NoParams, Empty, ItemBody, Value);
route!(DeleteItems, Delete, "/api/items", NoParams, Empty, ItemBody, Value);
route!(Missing, Get, "/api/missing", NoParams, Empty, Empty, Value);
route!(Gone, Get, "/api/gone", NoParams, Empty, Empty, Value);
route!(Private, Get, "/api/private", NoParams, Empty, Empty, Value);
route!(Broken, Get, "/api/broken", NoParams, Empty, Empty, Value);
route!(Counter, Get, "/api/counter", NoParams, Empty, Empty, Value);

struct Fixture {
    server: TestServer,
    hits: Arc<AtomicUsize>,
}

impl Fixture {
    fn client(&self) -> ApiClient {
        ApiClient::new().with_origin(self.server.origin())
    }
}

async fn fixture() -> Fixture {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let mut table = RouteTable::new();
    table
        .route(
            "/api/search",
            api()
                .query(Schema::object([("q", Schema::string())]))
                .get(|scope: Scope| async move { json!({ "query": scope.query()["q"] }) })
                .unwrap(),
        )
        .unwrap()
        .route(
            "/api/files/:owner/*path",
            api()
                .params(["owner"])
                .catch_all_param("path")
                .get(|scope: Scope| async move {
                    json!({
                        "owner": scope.param("owner"),
                        "path": scope.catch_all("path"),
                    })
                })
                .unwrap(),
        )
        .unwrap()
        .route(
            "/api/items",
            api()
                .body(Schema::object([("name", Schema::string())]))
                .post(|scope: Scope| async move {
                    json!({ "created": scope.body().cloned().unwrap_or(Value::Null) })
                })
                .unwrap(),
        )
        .unwrap()
        .route(
            "/api/items",
            api()
                .delete(|scope: Scope| async move {
                    json!({ "had_body": scope.headers().contains_key(http::header::CONTENT_TYPE) })
                })
                .unwrap(),
        )
        .unwrap()
        .route(
            "/api/gone",
            api()
                .get(|_scope: Scope| async {
                    http::Response::builder()
                        .status(StatusCode::NOT_FOUND)
                        .body(Full::new(Bytes::from_static(b"<h1>gone</h1>")))
                        .unwrap()
                })
                .unwrap(),
        )
        .unwrap()
        .route(
            "/api/private",
            api()
                .get(|_scope: Scope| async {
                    error_envelope(StatusCode::UNAUTHORIZED, "Sign in first")
                })
                .unwrap(),
        )
        .unwrap()
        .route(
            "/api/broken",
            api()
                .get(|_scope: Scope| async { Err::<Value, _>(HandlerError::internal("database down")) })
                .unwrap(),
        )
        .unwrap()
        .route(
            "/api/counter",
            api()
                .get(move |_scope: Scope| {
                    let counter = Arc::clone(&counter);
                    async move {
                        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        json!({ "n": n })
                    }
                })
                .unwrap(),
        )
        .unwrap();

    let server = TestServer::start(table).await.unwrap();
    Fixture { server, hits }
}

#[tokio::test]
async fn test_query_round_trip() {
    let fx = fixture().await;
    let data = fx
        .client()
        .request(RequestInput::<Search>::new(NoParams {}).with_query(SearchQuery {
            q: Some("test".into()),
        }))
        .await
        .unwrap();
    assert_eq!(data, SearchResponse { query: "test".into() });
}

#[tokio::test]
async fn test_missing_query_field_is_bad_request() {
    let fx = fixture().await;
    let err = fx
        .client()
        .request(RequestInput::<Search>::new(NoParams {}).with_query(SearchQuery { q: None }))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RequestErrorKind::BadRequest);
    assert_eq!(err.data.unwrap()["status"], "error");
}

#[tokio::test]
async fn test_params_and_catch_all() {
    let fx = fixture().await;
    let params = FileParams {
        owner: "ada".into(),
        path: vec!["src".into(), "lib.rs".into()],
    };
    let data = fx
        .client()
        .request(RequestInput::<Files>::new(params))
        .await
        .unwrap();
    assert_eq!(data, json!({"owner": "ada", "path": ["src", "lib.rs"]}));
}

#[tokio::test]
async fn test_body_only_sent_for_body_methods() {
    let fx = fixture().await;
    let client = fx.client();

    let created = client
        .request(RequestInput::<CreateItem>::new(NoParams {}).with_body(ItemBody {
            name: "widget".into(),
        }))
        .await
        .unwrap();
    assert_eq!(created, json!({"created": {"name": "widget"}}));

    let deleted = client
        .request(RequestInput::<DeleteItems>::new(NoParams {}).with_body(ItemBody {
            name: "ignored".into(),
        }))
        .await
        .unwrap();
    assert_eq!(deleted, json!({"had_body": false}));
}

#[tokio::test]
async fn test_non_json_404_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .client()
        .request(RequestInput::<Gone>::new(NoParams {}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RequestErrorKind::NotFound);
    assert_eq!(err.message, "<h1>gone</h1>");
    assert!(err.data.is_none());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .client()
        .request(RequestInput::<Missing>::new(NoParams {}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RequestErrorKind::NotFound);
    assert_eq!(err.message, "Not found");
}

#[tokio::test]
async fn test_failure_kinds() {
    let fx = fixture().await;
    let client = fx.client();

    let err = client
        .request(RequestInput::<Private>::new(NoParams {}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RequestErrorKind::Unauthorized);
    assert_eq!(err.message, "Sign in first");

    let err = client
        .request(RequestInput::<Broken>::new(NoParams {}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RequestErrorKind::ServerError);
    assert_eq!(err.message, "database down");
}

#[tokio::test]
async fn test_settled_never_errors() {
    let fx = fixture().await;
    let settled = fx
        .client()
        .request_settled(RequestInput::<Private>::new(NoParams {}))
        .await;
    assert!(matches!(settled, Settled::Error(ref e) if e.kind == RequestErrorKind::Unauthorized));
}

#[tokio::test]
async fn test_network_error_when_nothing_listens() {
    let fx = fixture().await;
    let origin = fx.server.origin();
    drop(fx);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let err = ApiClient::new()
        .with_origin(origin)
        .request(
            RequestInput::<Missing>::new(NoParams {})
                .with_options(CallOptions::new().with_timeout(Duration::from_secs(2))),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, RequestErrorKind::NetworkError);
}

#[tokio::test]
async fn test_query_cache_shares_requests() {
    let fx = fixture().await;
    let cache = QueryClient::new(fx.client());

    let (a, b) = tokio::join!(
        cache.query(RequestInput::<Counter>::new(NoParams {})),
        cache.query(RequestInput::<Counter>::new(NoParams {})),
    );
    assert_eq!(a.unwrap(), json!({"n": 1}));
    assert_eq!(b.unwrap(), json!({"n": 1}));
    assert_eq!(fx.hits.load(Ordering::SeqCst), 1);

    let cached = cache
        .query(RequestInput::<Counter>::new(NoParams {}))
        .await
        .unwrap();
    assert_eq!(cached, json!({"n": 1}));
    assert_eq!(fx.hits.load(Ordering::SeqCst), 1);

    let key = cache.key_for(&RequestInput::<Counter>::new(NoParams {})).unwrap();
    assert_eq!(cache.cached(&key), Some(json!({"n": 1})));
    assert!(cache.invalidate(&key));

    let fresh = cache
        .query(RequestInput::<Counter>::new(NoParams {}))
        .await
        .unwrap();
    assert_eq!(fresh, json!({"n": 2}));
}

#[tokio::test]
async fn test_query_errors_are_not_cached() {
    let fx = fixture().await;
    let cache = QueryClient::new(fx.client());

    let err = cache
        .query(RequestInput::<Broken>::new(NoParams {}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RequestErrorKind::ServerError);

    let key = cache.key_for(&RequestInput::<Broken>::new(NoParams {})).unwrap();
    assert_eq!(cache.cached(&key), None);
}

#[tokio::test]
async fn test_mutation_state_is_tracked_by_template() {
    let fx = fixture().await;
    let cache = QueryClient::new(fx.client());

    cache
        .mutate(RequestInput::<CreateItem>::new(NoParams {}).with_body(ItemBody {
            name: "widget".into(),
        }))
        .await
        .unwrap();
    assert_eq!(
        cache.mutation_state("/api/items"),
        MutationState::Success(json!({"created": {"name": "widget"}}))
    );

    cache
        .mutate(RequestInput::<Broken>::new(NoParams {}))
        .await
        .unwrap_err();
    assert!(matches!(
        cache.mutation_state("/api/broken"),
        MutationState::Failed(ref e) if e.kind == RequestErrorKind::ServerError
    ));
}
