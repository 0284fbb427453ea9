//! Route templates and path matching for signpost.
//!
//! Route templates use `:name` for a single dynamic segment and `*name` for a
//! catch-all that captures one or more segments as a list. The same template
//! type is used on both sides of the wire:
//!
//! - the server matches incoming paths with [`RouteTree`];
//! - the generated client builds request paths with [`RouteTemplate::build`].
//!
//! # Example
//!
//! ```rust
//! use signpost_router::{RouteParams, RouteTemplate, RouteTree};
//!
//! let mut tree = RouteTree::new();
//! tree.insert(&"/repos/:owner/*path".parse::<RouteTemplate>().unwrap(), "browse");
//!
//! let m = tree.find("/repos/ada/src/lib.rs").unwrap();
//! assert_eq!(*m.value, "browse");
//! assert_eq!(m.params.get_one("owner"), Some("ada"));
//!
//! let back = m.template.build(&m.params).unwrap();
//! assert_eq!(back, "/repos/ada/src/lib.rs");
//! ```
//!
//! # Tree layout
//!
//! ```text
//!                 (root)
//!                   │
//!                "repos"
//!                   │
//!                 (:)        one unnamed child per dynamic kind
//!                   │
//!                 (*)  ──►  leaf: "/repos/:owner/*path"
//! ```

mod error;
mod params;
mod template;
mod tree;

pub use error::TemplateError;
pub use params::{ParamValue, RouteParams};
pub use template::{build_path, RouteTemplate, Segment};
pub use tree::{RouteTree, TreeMatch};
