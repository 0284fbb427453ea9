//! # Signpost
//!
//! **Typed file-based API routes with generated clients**
//!
//! Signpost has two halves that meet at the route template:
//!
//! - **Server**: a route is a [`Chain`](middleware::Chain) that declares its
//!   query, cookie, body and parameter shapes, runs validated steps that
//!   build up a request context, and ends in one handler per HTTP method.
//!   Every result is wrapped in the `{"status": "ok" | "error"}` envelope.
//! - **Client**: [`codegen`] walks the `app/` directory, finds every
//!   `route.rs`, and writes `signpost_client.rs` with one marker type per
//!   route and method. [`client::ApiClient`] executes those markers.
//!
//! ## Quick Start
//!
//! ```rust
//! use signpost::prelude::*;
//! use serde_json::json;
//!
//! let search = api()
//!     .query(Schema::object([("q", Schema::string())]))
//!     .get(|scope: Scope| async move { json!({ "query": scope.query()["q"] }) })
//!     .unwrap();
//!
//! let mut table = RouteTable::new();
//! table.route("/api/search", search).unwrap();
//! ```
//!
//! ## Request pipeline
//!
//! ```text
//! Request → parse once (query, cookies, body) → step → step → … → handler
//!                                                 │                  │
//!                                          short-circuit        envelope
//!                                                 ↓                  ↓
//! Response ← header and cookie writes applied ←──┴──────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/signpost/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use signpost_core as core;

// Re-export route templates
pub use signpost_router as router;

// Re-export request parsing and response builders
pub use signpost_extract as extract;

// Re-export chain builder and finalizer
pub use signpost_middleware as middleware;

// Re-export discovery and generation
pub use signpost_codegen as codegen;

// Re-export client runtime
pub use signpost_client as client;

// Re-export configuration
pub use signpost_config as config;

// Re-export logging setup
pub use signpost_telemetry as telemetry;

/// A client configured from the `[client]` section of the configuration.
pub fn client_from_config(config: &signpost_config::SignpostConfig) -> signpost_client::ApiClient {
    signpost_client::ApiClient::from_config(&config.client)
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use signpost::prelude::*;
/// ```
pub mod prelude {
    pub use signpost_core::{
        BuildError, Context, Envelope, HandlerError, HandlerResult, RequestMethod, RouteSpec,
        Schema,
    };

    pub use signpost_middleware::{
        api, Chain, IntoReply, Json, RouteHandler, RouteTable, Scope, Step, StepOutcome,
    };

    pub use signpost_extract::{Request, Response, SameSite, SetCookie};

    pub use signpost_router::{RouteParams, RouteTemplate};

    pub use signpost_client::{
        ApiClient, ApiRoute, CallOptions, Empty, QueryClient, RequestError, RequestErrorKind,
        RequestInput,
    };

    pub use signpost_config::{ConfigLoader, SignpostConfig};
}
