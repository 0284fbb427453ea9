//! # Signpost Extract
//!
//! Parse-once extraction of request inputs and the response builders used by
//! the request finalizer.
//!
//! ## Inputs
//!
//! | Input   | Source            | Raw form                              | Validation         |
//! |---------|-------------------|---------------------------------------|--------------------|
//! | query   | URL query string  | flat object, repeats become lists     | coerced            |
//! | cookies | `Cookie` headers  | flat object, repeats become lists     | coerced            |
//! | body    | request body      | JSON text, empty means `{}`           | strict             |
//!
//! [`ParsedInput::extract`] runs all three against a
//! [`RouteSpec`](signpost_core::RouteSpec) and fails with an
//! [`ExtractionError`] on the first problem.
//!
//! ## Responses
//!
//! The [`response`] module renders the `{status, data | message}` envelope
//! and redirects. [`SetCookie`] renders `Set-Cookie` headers.

#![doc(html_root_url = "https://docs.rs/signpost-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod cookie;
mod error;
mod input;
mod query;
pub mod response;
mod types;

pub use body::{body_text, parse_body};
pub use cookie::{parse_cookies, raw_cookies, SameSite, SetCookie};
pub use error::{ExtractionError, ExtractionErrorKind, ExtractionSource};
pub use input::ParsedInput;
pub use query::{parse_query, raw_query};
pub use types::{Request, Response};

pub use signpost_router::RouteParams;
