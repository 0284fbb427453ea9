//! # Signpost Test
//!
//! Test utilities for signpost route tables.
//!
//! - [`TestClient`] dispatches requests into a [`RouteTable`] in memory. No
//!   port is bound.
//! - [`TestServer`] serves a table on a loopback port so that real HTTP
//!   clients, including the `signpost-client` runtime, can be tested end to
//!   end.
//! - [`TestResponse`] buffers the response and offers JSON, envelope and
//!   cookie helpers.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use signpost_core::Schema;
//! use signpost_middleware::{api, RouteTable, Scope};
//! use signpost_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let mut table = RouteTable::new();
//! table
//!     .route(
//!         "/search",
//!         api()
//!             .query(Schema::object([("q", Schema::string())]))
//!             .get(|scope: Scope| async move { json!({ "query": scope.query()["q"] }) })
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let client = TestClient::new(table);
//! client
//!     .get("/search?q=test")
//!     .send()
//!     .await
//!     .assert_ok_data(&json!({"query": "test"}));
//! # });
//! ```
//!
//! [`RouteTable`]: signpost_middleware::RouteTable

#![doc(html_root_url = "https://docs.rs/signpost-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;
mod server;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
pub use server::TestServer;
