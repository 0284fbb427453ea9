//! End-to-end chain tests.
//!
//! Each test builds a chain, terminates it and drives a real request through
//! the finalizer, checking the status, the envelope and the applied header
//! and cookie writes.

use bytes::Bytes;
use http::header::{LOCATION, SET_COOKIE};
use http::{Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use proptest::prelude::*;
use serde_json::{json, Value};
use signpost_core::{BuildError, HandlerError, Schema, SpecSection};
use signpost_extract::response::{error_envelope, json_response};
use signpost_extract::{Request, Response, SetCookie};
use signpost_middleware::{api, Chain, Json, Scope, StepOutcome};
use signpost_router::RouteParams;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builds a request with an optional cookie header and body.
fn make_request(method: &str, uri: &str, cookie: Option<&str>, body: &str) -> Request {
    let mut builder = HttpRequest::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_query_round_trip() {
    let handler = api()
        .query(Schema::object([("q", Schema::string())]))
        .get(|scope: Scope| async move { json!({ "query": scope.query()["q"] }) })
        .unwrap();

    let response = handler
        .handle(make_request("GET", "/search?q=test", None, ""), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"status": "ok", "data": {"query": "test"}})
    );

    let response = handler
        .handle(make_request("GET", "/search", None, ""), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("'q'"));
}

#[tokio::test]
async fn test_body_is_validated_for_post() {
    let handler = api()
        .body(Schema::object([
            ("name", Schema::string()),
            ("tags", Schema::array(Schema::string()).optional()),
        ]))
        .post(|scope: Scope| async move {
            let body = scope.body().cloned().unwrap_or(Value::Null);
            Ok::<_, HandlerError>(body)
        })
        .unwrap();

    let response = handler
        .handle(
            make_request("POST", "/items", None, r#"{"name":"widget","tags":["a"]}"#),
            RouteParams::new(),
        )
        .await;
    assert_eq!(
        body_json(response).await["data"],
        json!({"name": "widget", "tags": ["a"]})
    );

    let response = handler
        .handle(make_request("POST", "/items", None, r#"{"name":1}"#), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = handler
        .handle(make_request("POST", "/items", None, "{not json"), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().starts_with("malformed body"));
}

#[tokio::test]
async fn test_binary_body_without_shape_is_accepted() {
    let handler = api()
        .post(|scope: Scope| async move {
            json!({ "ok": true, "parsed": scope.body().is_some(), "raw": scope.raw_body().is_some() })
        })
        .unwrap();

    let request = HttpRequest::builder()
        .method("POST")
        .uri("/webhook")
        .body(Full::new(Bytes::from_static(&[0xff, 0xfe, 0x00])))
        .unwrap();
    let response = handler.handle(request, RouteParams::new()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"],
        json!({"ok": true, "parsed": false, "raw": true})
    );
}

#[tokio::test]
async fn test_context_flows_through_steps() {
    let handler = api()
        .cookies(Schema::object([("token", Schema::string())]))
        .step("auth", |scope: Scope| async move {
            json!({ "user": scope.cookie("token").map(str::to_uppercase) })
        })
        .step("role", |scope: Scope| async move {
            let user: String = scope.context_as("user")?;
            Ok::<_, HandlerError>(json!({ "role": format!("{user}-admin") }))
        })
        .get(|scope: Scope| async move { scope.context().to_value() })
        .unwrap();

    let response = handler
        .handle(make_request("GET", "/", Some("token=ada"), ""), RouteParams::new())
        .await;
    assert_eq!(
        body_json(response).await["data"],
        json!({"user": "ADA", "role": "ADA-admin"})
    );
}

#[tokio::test]
async fn test_short_circuit_stops_chain_and_keeps_writes() {
    let later_steps = Arc::new(AtomicUsize::new(0));
    let terminal_calls = Arc::new(AtomicUsize::new(0));

    let later = Arc::clone(&later_steps);
    let terminal = Arc::clone(&terminal_calls);
    let handler = api()
        .step("trace", |scope: Scope| async move {
            scope.set_header("x-trace", "t-1")?;
            scope.set_cookie(SetCookie::new("seen", "1").path("/"));
            Ok::<_, HandlerError>(())
        })
        .step("guard", |_scope: Scope| async {
            error_envelope(StatusCode::UNAUTHORIZED, "Unauthorized")
        })
        .step("after", move |_scope: Scope| {
            let later = Arc::clone(&later);
            async move {
                later.fetch_add(1, Ordering::SeqCst);
            }
        })
        .get(move |_scope: Scope| {
            let terminal = Arc::clone(&terminal);
            async move {
                terminal.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

    let response = handler
        .handle(make_request("GET", "/", None, ""), RouteParams::new())
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-trace"], "t-1");
    assert_eq!(set_cookies(&response), vec!["seen=1; Path=/".to_string()]);
    assert_eq!(later_steps.load(Ordering::SeqCst), 0);
    assert_eq!(terminal_calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        body_json(response).await,
        json!({"status": "error", "message": "Unauthorized"})
    );
}

#[tokio::test]
async fn test_delete_after_set_wins() {
    let handler = api()
        .step("login", |scope: Scope| async move {
            scope.set_cookie(SetCookie::new("session", "abc"));
        })
        .post(|scope: Scope| async move {
            scope.delete_cookie("session");
        })
        .unwrap();

    let response = handler
        .handle(make_request("POST", "/", None, ""), RouteParams::new())
        .await;
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("session=;"));
    assert!(cookies[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn test_nested_chain_runs_as_one_step() {
    let inner_ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&inner_ran);

    let auth = Chain::new()
        .cookies(Schema::object([("token", Schema::string())]))
        .step("load-user", |scope: Scope| async move {
            json!({ "user": scope.cookie("token") })
        })
        .step("count", move |_scope: Scope| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                json!({ "checked": true })
            }
        });

    let handler = api()
        .use_chain(&auth)
        .query(Schema::object([("q", Schema::string().optional())]))
        .get(|scope: Scope| async move { scope.context().to_value() })
        .unwrap();

    assert!(handler.spec().cookies().contains_key("token"));
    assert!(handler.spec().query().contains_key("q"));

    let response = handler
        .handle(make_request("GET", "/", Some("token=t9"), ""), RouteParams::new())
        .await;
    assert_eq!(
        body_json(response).await["data"],
        json!({"user": "t9", "checked": true})
    );
    assert_eq!(inner_ran.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_nested_short_circuit_skips_outer_steps() {
    let outer_after = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&outer_after);

    let guard = Chain::new()
        .step("mark", |scope: Scope| async move {
            scope.append_header("x-step", "inner")?;
            Ok::<_, HandlerError>(json!({ "partial": 1 }))
        })
        .step("deny", |_scope: Scope| async {
            StepOutcome::Respond(json_response(StatusCode::FORBIDDEN, &json!({"denied": true})))
        });

    let handler = api()
        .use_chain(&guard)
        .step("after", move |_scope: Scope| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .get(|_scope: Scope| async {})
        .unwrap();

    let response = handler
        .handle(make_request("GET", "/", None, ""), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()["x-step"], "inner");
    assert_eq!(outer_after.load(Ordering::SeqCst), 0);
    assert_eq!(body_json(response).await, json!({"denied": true}));
}

#[tokio::test]
async fn test_nested_required_context() {
    let needs_user = Chain::new()
        .requires_context(["user"])
        .step("greet", |scope: Scope| async move {
            let user: String = scope.context_as("user")?;
            Ok::<_, HandlerError>(json!({ "greeting": format!("hi {user}") }))
        });

    let satisfied = api()
        .step("user", |_scope: Scope| async { json!({ "user": "ada" }) })
        .use_chain(&needs_user)
        .get(|scope: Scope| async move { scope.context_as::<Value>("greeting") })
        .unwrap();
    let response = satisfied
        .handle(make_request("GET", "/", None, ""), RouteParams::new())
        .await;
    assert_eq!(body_json(response).await["data"], json!("hi ada"));

    let unsatisfied = api()
        .use_chain(&needs_user)
        .get(|_scope: Scope| async {})
        .unwrap();
    let response = unsatisfied
        .handle(make_request("GET", "/", None, ""), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("user"));
}

#[test]
fn test_conflicting_chains_fail_to_build() {
    let a = Chain::new().query(Schema::object([("page", Schema::integer())]));
    let b = Chain::new().query(Schema::object([("page", Schema::string())]));

    let err = a.use_chain(&b).get(|_scope: Scope| async {}).unwrap_err();
    assert_eq!(
        err,
        BuildError::FieldConflict {
            section: SpecSection::Query,
            field: "page".into(),
        }
    );
    assert!(err.to_string().contains("conflicting query field 'page'"));
}

#[tokio::test]
async fn test_custom_parse_error_responder() {
    let handler = api()
        .query(Schema::object([("page", Schema::integer())]))
        .on_parse_error(|error| {
            json_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                &json!({ "problem": error.source().to_string() }),
            )
        })
        .get(|_scope: Scope| async {})
        .unwrap();

    let response = handler
        .handle(make_request("GET", "/?page=x", None, ""), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await, json!({"problem": "query"}));
}

#[tokio::test]
async fn test_redirect_error() {
    let handler = api()
        .step("remember", |scope: Scope| async move {
            scope.set_cookie(SetCookie::new("return_to", "/account"));
        })
        .get(|_scope: Scope| async { Err::<(), _>(HandlerError::redirect("/login")) })
        .unwrap();

    let response = handler
        .handle(make_request("GET", "/account", None, ""), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[LOCATION], "/login");
    assert_eq!(set_cookies(&response), vec!["return_to=/account".to_string()]);
}

#[tokio::test]
async fn test_panic_becomes_500() {
    let handler = api()
        .get(|_scope: Scope| async {
            if true {
                panic!("boom");
            }
        })
        .unwrap();

    let response = handler
        .handle(make_request("GET", "/", None, ""), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"status": "error", "message": "boom"})
    );
}

#[tokio::test]
async fn test_raw_response_passes_through() {
    let handler = api()
        .step("header", |scope: Scope| async move {
            scope.set_header("cache-control", "no-store")?;
            Ok::<_, HandlerError>(())
        })
        .get(|_scope: Scope| async {
            json_response(StatusCode::CREATED, &json!({"created": true}))
        })
        .unwrap();

    let response = handler
        .handle(make_request("GET", "/", None, ""), RouteParams::new())
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["cache-control"], "no-store");
    assert_eq!(body_json(response).await, json!({"created": true}));
}

#[tokio::test]
async fn test_typed_json_reply() {
    #[derive(serde::Serialize)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    let handler = api()
        .get(|_scope: Scope| async { Json(Item { id: 1, name: "one" }) })
        .unwrap();
    let response = handler
        .handle(make_request("GET", "/", None, ""), RouteParams::new())
        .await;
    assert_eq!(
        body_json(response).await,
        json!({"status": "ok", "data": {"id": 1, "name": "one"}})
    );
}

proptest! {
    #[test]
    fn prop_steps_extend_context_in_order(values in prop::collection::vec(0_i64..1000, 1..8)) {
        let mut chain = api();
        for (index, value) in values.iter().copied().enumerate() {
            chain = chain.step(format!("step-{index}"), move |_scope: Scope| async move {
                json!({ format!("k{index}"): value, "last": index })
            });
        }
        let handler = chain
            .get(|scope: Scope| async move { scope.context().to_value() })
            .unwrap();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let data = runtime.block_on(async {
            let response = handler
                .handle(make_request("GET", "/", None, ""), RouteParams::new())
                .await;
            body_json(response).await["data"].clone()
        });

        for (index, value) in values.iter().enumerate() {
            prop_assert_eq!(&data[format!("k{index}")], &json!(value));
        }
        prop_assert_eq!(&data["last"], &json!(values.len() - 1));
    }
}
