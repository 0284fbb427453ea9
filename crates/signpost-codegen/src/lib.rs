//! Route discovery and typed client generation for signpost.
//!
//! This crate walks a project's `app/` (or `src/app/`) directory, finds every
//! `route.rs` handler file, reads which HTTP methods it exports without
//! compiling it, and writes a `signpost_client.rs` module next to the routes.
//!
//! # Directory conventions
//!
//! | Directory name | URL segment | Parameter        |
//! |----------------|-------------|------------------|
//! | `users`        | `users`     | none             |
//! | `[id]`         | `:id`       | one value        |
//! | `[...slug]`    | `*slug`     | list of values   |
//! | `(admin)`      | (omitted)   | none             |
//!
//! # Generated code
//!
//! For every route the generated module carries a `Params` struct, copies of
//! any `{Method}Query`, `{Method}Body` and `{Method}Response` shape items, and
//! one marker type per method implementing `signpost_client::ApiRoute`. The
//! per-method `api_get`, `api_post`, ... functions are generic over those
//! markers, so calling a route with the wrong method fails to compile.
//!
//! # Example
//!
//! ```rust,no_run
//! use signpost_codegen::{build, BuildOptions, BuildOutcome};
//!
//! let options = BuildOptions::new(".").with_base_path("/api");
//! match build(&options)? {
//!     BuildOutcome::Generated { file, routes, .. } => {
//!         println!("wrote {} routes to {}", routes, file.display());
//!     }
//!     BuildOutcome::NoAppDir => println!("nothing to do"),
//! }
//! # Ok::<(), signpost_codegen::CodegenError>(())
//! ```

#![warn(missing_docs)]

mod build;
mod discover;
mod error;
mod exports;
mod generate;
mod segment;
mod source;
mod watch;

pub use build::{
    build, ensure_gitignore, find_app_dir, BuildOptions, BuildOutcome, GitignoreStatus,
    CLIENT_FILE_NAME, GITIGNORE_BLOCK,
};
pub use discover::{discover, ApiPath, Diagnostic, Discovery, RouteTree, HANDLER_FILE};
pub use error::CodegenError;
pub use exports::{scan_exports, HandlerExports, ShapeItem, ShapeKind};
pub use generate::{generate, validate_base_url, GenerateOptions};
pub use segment::{RouteSegment, SegmentKind};
pub use source::{FsSource, MemorySource, RouteSource, SourceEntry};
pub use watch::{dev, PassQueue};
