//! Route discovery over a directory tree.
//!
//! Discovery runs in two passes:
//!
//! 1. [`RouteTree::scan`] walks the tree in sorted name order and keeps only
//!    directories that have a handler file themselves or somewhere below.
//! 2. [`discover`] flattens every node with a handler file into an
//!    [`ApiPath`], reading its exports statically.
//!
//! ```text
//! app/
//! ├── (shop)/
//! │   └── items/
//! │       ├── route.rs            → /items
//! │       └── [id]/route.rs       → /items/:id
//! ├── docs/[...slug]/route.rs     → /docs/*slug
//! └── empty/                      → pruned
//! ```

use indexmap::IndexMap;
use signpost_core::{ParamKind, RequestMethod};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::CodegenError;
use crate::exports::{scan_exports, ShapeItem, ShapeKind};
use crate::segment::{RouteSegment, SegmentKind};
use crate::source::RouteSource;

/// File name that marks a directory as a route.
pub const HANDLER_FILE: &str = "route.rs";

/// One discovered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    /// Handler file.
    pub file: PathBuf,
    /// Logical URL template.
    pub url: String,
    /// Implemented methods, in [`RequestMethod::ALL`] order.
    pub methods: Vec<RequestMethod>,
    /// Route parameters in path order.
    pub params: IndexMap<String, ParamKind>,
    /// Shape items found in the handler file.
    pub shapes: Vec<ShapeItem>,
}

impl ApiPath {
    /// True if the handler file exports `method`.
    pub fn has_method(&self, method: RequestMethod) -> bool {
        self.methods.contains(&method)
    }

    /// The shape item for `method` and `kind`, if the file declares one.
    pub fn shape(&self, method: RequestMethod, kind: ShapeKind) -> Option<&ShapeItem> {
        self.shapes
            .iter()
            .find(|shape| shape.method == method && shape.kind == kind)
    }
}

/// A non-fatal discovery finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A parameter name appears twice in one route.
    DuplicateParam {
        /// Parameter name.
        name: String,
        /// Route URL.
        url: String,
        /// Handler file.
        file: PathBuf,
    },
    /// A handler file exports no method.
    NoHandlerMethods {
        /// Route URL.
        url: String,
        /// Handler file.
        file: PathBuf,
    },
    /// A handler file could not be read or parsed.
    InvalidHandler {
        /// Handler file.
        file: PathBuf,
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateParam { name, url, file } => write!(
                f,
                "Ignored duplicate param: {name} in route: {url} in file: {}",
                file.display()
            ),
            Self::NoHandlerMethods { url, file } => write!(
                f,
                "No handler methods found for route: {url} in file: {}",
                file.display()
            ),
            Self::InvalidHandler { file, reason } => {
                write!(f, "Skipped handler file {}: {reason}", file.display())
            }
        }
    }
}

/// Result of one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Routes in discovery order.
    pub paths: Vec<ApiPath>,
    /// Warnings, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

/// A directory that holds a handler file or has a descendant that does.
#[derive(Debug, Clone)]
struct RouteNode {
    dir: PathBuf,
    segment: RouteSegment,
    parent: Option<usize>,
    has_handler: bool,
}

/// Pruned directory tree. Nodes are stored in pre-order and refer to their
/// parent by index.
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
}

impl RouteTree {
    /// Scans `root`, giving it the static segment `root_segment`.
    pub fn scan(
        source: &impl RouteSource,
        root: &Path,
        root_segment: RouteSegment,
    ) -> Result<Self, CodegenError> {
        let mut tree = Self::default();
        tree.visit(source, root, root_segment, None)?;
        Ok(tree)
    }

    /// Number of retained directories.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if nothing below the root has a handler.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if the node was retained.
    fn visit(
        &mut self,
        source: &impl RouteSource,
        dir: &Path,
        segment: RouteSegment,
        parent: Option<usize>,
    ) -> Result<bool, CodegenError> {
        let mut entries = source
            .list_dir(dir)
            .map_err(|e| CodegenError::io(dir, e))?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let index = self.nodes.len();
        self.nodes.push(RouteNode {
            dir: dir.to_path_buf(),
            segment,
            parent,
            has_handler: entries.iter().any(|e| !e.is_dir && e.name == HANDLER_FILE),
        });

        let mut has_children = false;
        for entry in entries.iter().filter(|e| e.is_dir) {
            let child = dir.join(&entry.name);
            let segment = RouteSegment::classify(&entry.name);
            has_children |= self.visit(source, &child, segment, Some(index))?;
        }

        if self.nodes[index].has_handler || has_children {
            return Ok(true);
        }

        // Every descendant was pruned already, so this node is the last one.
        self.nodes.truncate(index);
        Ok(false)
    }

    /// Segments from the root down to `index`.
    fn chain(&self, index: usize) -> Vec<&RouteSegment> {
        let mut chain = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            chain.push(&self.nodes[i].segment);
            current = self.nodes[i].parent;
        }
        chain.reverse();
        chain
    }
}

/// Discovers every route below `app_dir`.
///
/// `base_path` becomes the first URL segment, with any trailing slash
/// removed. Warnings are logged and returned in [`Discovery::diagnostics`].
///
/// ```rust
/// use signpost_codegen::{discover, MemorySource};
/// use std::path::Path;
///
/// let source = MemorySource::new()
///     .with_file("app/(shop)/items/[id]/route.rs", "pub async fn GET() {}")
///     .with_dir("app/empty");
///
/// let found = discover(&source, Path::new("app"), "/api/").unwrap();
/// assert_eq!(found.paths[0].url, "/api/items/:id");
/// ```
///
/// # Errors
///
/// Returns [`CodegenError::Io`] if a directory cannot be listed.
pub fn discover(
    source: &impl RouteSource,
    app_dir: &Path,
    base_path: &str,
) -> Result<Discovery, CodegenError> {
    let root = RouteSegment::literal(base_path.trim_end_matches('/'));
    let tree = RouteTree::scan(source, app_dir, root)?;

    let mut discovery = Discovery::default();
    for (index, node) in tree.nodes.iter().enumerate() {
        if !node.has_handler {
            continue;
        }
        let file = node.dir.join(HANDLER_FILE);
        let chain = tree.chain(index);
        let url = route_url(&chain);

        let mut params = IndexMap::new();
        for segment in &chain {
            let Some(kind) = segment.param_kind() else {
                continue;
            };
            if params.contains_key(&segment.value) {
                discovery.warn(Diagnostic::DuplicateParam {
                    name: segment.value.clone(),
                    url: url.clone(),
                    file: file.clone(),
                });
                continue;
            }
            params.insert(segment.value.clone(), kind);
        }

        let exports = match source.read_file(&file) {
            Ok(text) => scan_exports(&text).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        let exports = match exports {
            Ok(exports) => exports,
            Err(reason) => {
                discovery.warn(Diagnostic::InvalidHandler { file, reason });
                continue;
            }
        };

        if exports.methods.is_empty() {
            discovery.warn(Diagnostic::NoHandlerMethods { url, file });
            continue;
        }

        tracing::debug!(url = %url, methods = exports.methods.len(), "discovered route");
        discovery.paths.push(ApiPath {
            file,
            url,
            methods: exports.methods,
            params,
            shapes: exports.shapes,
        });
    }

    Ok(discovery)
}

impl Discovery {
    fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

fn route_url(chain: &[&RouteSegment]) -> String {
    let url = chain
        .iter()
        .filter(|segment| segment.kind != SegmentKind::Group)
        .filter_map(|segment| segment.template_part())
        .collect::<Vec<_>>()
        .join("/");

    if url.is_empty() {
        "/".to_string()
    } else if url.starts_with('/') {
        url
    } else {
        format!("/{url}")
    }
}
