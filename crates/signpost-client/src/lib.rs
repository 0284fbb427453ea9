//! Typed request runtime for signpost generated clients.
//!
//! The generated `signpost_client.rs` describes every route as a marker type
//! implementing [`ApiRoute`]. This crate executes those descriptions:
//!
//! - [`ApiClient`] builds the URL from the route template, resolves the
//!   origin, sends one request with `reqwest` and unwraps the response
//!   envelope;
//! - [`RequestError`] classifies failures by [`RequestErrorKind`], so callers
//!   branch on the kind instead of the message;
//! - [`QueryClient`] adds a read cache with request sharing and mutation
//!   state tracking.
//!
//! # Origin resolution
//!
//! 1. [`CallOptions::origin`] on the call;
//! 2. the configured origin ([`ApiClient::with_origin`]);
//! 3. on the server, the server origin ([`server_side_origin`] by default
//!    when built from configuration);
//! 4. in a page, the page origin.

#![warn(missing_docs)]

mod client;
mod error;
mod input;
mod origin;
mod query;
mod route;

pub use client::ApiClient;
pub use error::{RequestError, RequestErrorKind, RequestResult, Settled};
pub use input::{CallOptions, RequestInput};
pub use origin::{server_side_origin, ExecutionSide};
pub use query::{MutationState, QueryClient};
pub use route::{ApiRoute, Empty, IntoRouteParams};

pub use signpost_core::RequestMethod;
pub use signpost_router::RouteParams;
