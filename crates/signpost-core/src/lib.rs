//! # Signpost Core
//!
//! Core types shared by every signpost crate.
//!
//! - [`Schema`] - Value-level validator used for query, cookie and body shapes
//! - [`RouteSpec`] - Declared route requirements with conflict-checked merging
//! - [`Context`] - Persistent, ordered request-scoped context
//! - [`RequestMethod`] - The HTTP methods a route file may export
//! - [`Envelope`] - The `{status, data | message}` wire envelope
//! - [`HandlerError`] / [`BuildError`] - Request-time and build-time errors
//!
//! ## Example
//!
//! ```
//! use signpost_core::{RouteSpec, Schema};
//!
//! let auth = RouteSpec::new()
//!     .with_cookies(Schema::object([("token", Schema::string())]))
//!     .unwrap();
//! let page = RouteSpec::new()
//!     .with_query(Schema::object([("q", Schema::string())]))
//!     .unwrap();
//!
//! let merged = auth.merge(&page).unwrap();
//! assert!(merged.query().contains_key("q"));
//! assert!(merged.cookies().contains_key("token"));
//! ```

#![doc(html_root_url = "https://docs.rs/signpost-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod envelope;
mod error;
mod method;
pub mod schema;
mod spec;

pub use context::Context;
pub use envelope::Envelope;
pub use error::{BuildError, HandlerError, HandlerResult, SpecSection};
pub use method::{ParseMethodError, RequestMethod};
pub use schema::{Schema, ValidationError, ValidationIssue};
pub use spec::{BodyShape, FieldShapes, ParamKind, RouteSpec};
