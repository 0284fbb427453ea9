//! Static inspection of handler files.
//!
//! A handler file is parsed with `syn` and never compiled or executed. Two
//! things are collected from its top level:
//!
//! - public items named after an HTTP method token (`pub async fn GET`,
//!   `pub static POST`, `pub use handlers::update as PATCH`);
//! - public shape items named `{Method}Query`, `{Method}Body` or
//!   `{Method}Response`, kept as source text so the generator can copy them.

use proc_macro2::LineColumn;
use quote::ToTokens;
use signpost_core::RequestMethod;
use syn::spanned::Spanned;
use syn::{Item, UseTree, Visibility};

/// Which part of a route a shape item describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Query string.
    Query,
    /// Request body.
    Body,
    /// Response data.
    Response,
}

impl ShapeKind {
    const ALL: [Self; 3] = [Self::Query, Self::Body, Self::Response];

    /// Name suffix, e.g. `"Query"`.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Body => "Body",
            Self::Response => "Response",
        }
    }
}

/// A type item copied from a handler file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeItem {
    /// Item name, e.g. `GetQuery`.
    pub name: String,
    /// Method the shape belongs to.
    pub method: RequestMethod,
    /// What the shape describes.
    pub kind: ShapeKind,
    /// Item source text, attributes included.
    pub source: String,
}

/// What a handler file exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerExports {
    /// Implemented methods, in [`RequestMethod::ALL`] order.
    pub methods: Vec<RequestMethod>,
    /// Shape items, in file order.
    pub shapes: Vec<ShapeItem>,
}

/// Parses `source` and collects method exports and shape items.
///
/// ```rust
/// use signpost_codegen::scan_exports;
/// use signpost_core::RequestMethod;
///
/// let exports = scan_exports(r#"
///     pub async fn GET() {}
///     pub use crate::shared::update as PATCH;
///     fn POST() {}
/// "#).unwrap();
///
/// assert_eq!(exports.methods, [RequestMethod::Get, RequestMethod::Patch]);
/// ```
///
/// # Errors
///
/// Returns the `syn` error if the file is not valid Rust.
pub fn scan_exports(source: &str) -> syn::Result<HandlerExports> {
    let file = syn::parse_file(source)?;
    let lines = LineIndex::new(source);

    let mut names = Vec::new();
    let mut shapes = Vec::new();

    for item in &file.items {
        match item {
            Item::Fn(f) if is_pub(&f.vis) => names.push(f.sig.ident.to_string()),
            Item::Static(s) if is_pub(&s.vis) => names.push(s.ident.to_string()),
            Item::Const(c) if is_pub(&c.vis) => names.push(c.ident.to_string()),
            Item::Use(u) if is_pub(&u.vis) => collect_use_names(&u.tree, &mut names),
            Item::Struct(s) if is_pub(&s.vis) => {
                push_shape(&mut shapes, &s.ident, item, source, &lines);
            }
            Item::Enum(e) if is_pub(&e.vis) => {
                push_shape(&mut shapes, &e.ident, item, source, &lines);
            }
            Item::Type(t) if is_pub(&t.vis) => {
                push_shape(&mut shapes, &t.ident, item, source, &lines);
            }
            _ => {}
        }
    }

    let methods = RequestMethod::ALL
        .into_iter()
        .filter(|m| names.iter().any(|n| n == m.as_str()))
        .collect();

    Ok(HandlerExports { methods, shapes })
}

fn is_pub(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

fn collect_use_names(tree: &UseTree, names: &mut Vec<String>) {
    match tree {
        UseTree::Path(path) => collect_use_names(&path.tree, names),
        UseTree::Name(name) => names.push(name.ident.to_string()),
        UseTree::Rename(rename) => names.push(rename.rename.to_string()),
        UseTree::Group(group) => {
            for tree in &group.items {
                collect_use_names(tree, names);
            }
        }
        UseTree::Glob(_) => {}
    }
}

fn push_shape(
    shapes: &mut Vec<ShapeItem>,
    ident: &syn::Ident,
    item: &Item,
    source: &str,
    lines: &LineIndex,
) {
    let name = ident.to_string();
    let Some((method, kind)) = shape_role(&name) else {
        return;
    };

    let span = item.span();
    let text = lines
        .slice(source, span.start(), span.end())
        .map(str::to_string)
        .unwrap_or_else(|| item.to_token_stream().to_string());

    shapes.push(ShapeItem {
        name,
        method,
        kind,
        source: text,
    });
}

/// Splits `GetQuery` into (`Get`, `Query`).
fn shape_role(name: &str) -> Option<(RequestMethod, ShapeKind)> {
    RequestMethod::ALL.into_iter().find_map(|method| {
        let rest = name.strip_prefix(&method_camel(method))?;
        ShapeKind::ALL
            .into_iter()
            .find(|kind| rest == kind.suffix())
            .map(|kind| (method, kind))
    })
}

/// `Get`, `Post`, `Options`, ...
pub(crate) fn method_camel(method: RequestMethod) -> String {
    let token = method.as_str();
    let mut out = String::with_capacity(token.len());
    out.push_str(&token[..1]);
    out.push_str(&token[1..].to_ascii_lowercase());
    out
}

/// Maps span line/column pairs back to byte offsets.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn offset(&self, source: &str, at: LineColumn) -> Option<usize> {
        let start = *self.starts.get(at.line.checked_sub(1)?)?;
        let line = &source[start..];
        let within = line
            .char_indices()
            .nth(at.column)
            .map_or(line.len(), |(i, _)| i);
        Some(start + within)
    }

    fn slice<'a>(&self, source: &'a str, start: LineColumn, end: LineColumn) -> Option<&'a str> {
        let from = self.offset(source, start)?;
        let to = self.offset(source, end)?;
        (from < to).then(|| &source[from..to])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports_of_every_form() {
        let exports = scan_exports(
            r"
            pub async fn GET() {}
            pub static POST: u8 = 0;
            pub const PUT: u8 = 0;
            pub use crate::handlers::{remove as DELETE, HEAD};
            fn OPTIONS() {}
            pub fn get() {}
            ",
        )
        .unwrap();

        assert_eq!(
            exports.methods,
            vec![
                RequestMethod::Get,
                RequestMethod::Post,
                RequestMethod::Put,
                RequestMethod::Delete,
                RequestMethod::Head,
            ]
        );
    }

    #[test]
    fn test_no_methods() {
        let exports = scan_exports("pub fn helper() {}").unwrap();
        assert!(exports.methods.is_empty());
    }

    #[test]
    fn test_invalid_source() {
        assert!(scan_exports("pub fn GET( {").is_err());
    }

    #[test]
    fn test_shape_items_are_copied_verbatim() {
        let source = "use serde::Deserialize;\n\n/// Search input.\n#[derive(Deserialize)]\npub struct GetQuery {\n    pub q: String,\n}\n\npub type PostBody = Vec<u32>;\nstruct GetBody;\npub struct Getter;\n\npub async fn GET() {}\n";
        let exports = scan_exports(source).unwrap();

        assert_eq!(exports.shapes.len(), 2);
        let query = &exports.shapes[0];
        assert_eq!(query.name, "GetQuery");
        assert_eq!(query.method, RequestMethod::Get);
        assert_eq!(query.kind, ShapeKind::Query);
        assert_eq!(
            query.source,
            "/// Search input.\n#[derive(Deserialize)]\npub struct GetQuery {\n    pub q: String,\n}"
        );

        let body = &exports.shapes[1];
        assert_eq!(body.name, "PostBody");
        assert_eq!(body.kind, ShapeKind::Body);
        assert_eq!(body.source, "pub type PostBody = Vec<u32>;");
    }

    #[test]
    fn test_shape_role() {
        assert_eq!(
            shape_role("OptionsResponse"),
            Some((RequestMethod::Options, ShapeKind::Response))
        );
        assert_eq!(shape_role("GetQueryExtra"), None);
        assert_eq!(shape_role("Query"), None);
    }

    #[test]
    fn test_method_camel() {
        assert_eq!(method_camel(RequestMethod::Delete), "Delete");
        assert_eq!(method_camel(RequestMethod::Get), "Get");
    }
}
