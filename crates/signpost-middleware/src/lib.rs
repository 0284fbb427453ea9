//! # Signpost Middleware
//!
//! Composable route chains and the request finalizer.
//!
//! A route is built by chaining declarations and steps onto a [`Chain`] and
//! ending with a method terminal such as [`Chain::get`]. The result is a
//! [`RouteHandler`] that turns one HTTP request into one response.
//!
//! ## Request lifecycle
//!
//! ```text
//! Request → parse query/cookies/body → step 1 → step 2 → ... → terminal
//!               │                        │                        │
//!               └─ parse error (400)     └─ short-circuit         └─ data / response / error
//!                                                                    ↓
//! Response ← header and cookie writes applied ←──────────────────────┘
//! ```
//!
//! | Outcome          | Response                                     |
//! |------------------|----------------------------------------------|
//! | parse failure    | custom responder, else 400 error envelope    |
//! | short-circuit    | the step's response                          |
//! | terminal value   | `{"status":"ok","data":..}`                  |
//! | terminal response| sent as-is                                   |
//! | redirect error   | redirect with `Location`                     |
//! | other error      | error envelope with the error's status       |
//! | panic            | 500 error envelope                           |
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use signpost_core::Schema;
//! use signpost_middleware::{api, Scope};
//!
//! let handler = api()
//!     .query(Schema::object([("q", Schema::string())]))
//!     .get(|scope: Scope| async move { json!({ "query": scope.query()["q"] }) })
//!     .unwrap();
//!
//! assert!(handler.spec().query().contains_key("q"));
//! ```

#![doc(html_root_url = "https://docs.rs/signpost-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod finalize;
pub mod reply;
pub mod scope;
pub mod step;
pub mod table;

pub use chain::{Chain, ParseErrorResponder};
pub use finalize::RouteHandler;
pub use reply::{IntoReply, Json, Reply};
pub use scope::{MutationLog, Scope};
pub use step::{BoxFuture, FnStep, IntoStepOutcome, Step, StepOutcome};
pub use table::RouteTable;

/// Starts a new route chain.
#[must_use]
pub fn api() -> Chain {
    Chain::new()
}
