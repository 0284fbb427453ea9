//! Client source generation.
//!
//! The generated `signpost_client.rs` has this layout:
//!
//! ```text
//! BASE_URL                 fixed origin, if configured
//! client()                 ApiClient using BASE_URL
//! route_N                  Params + shape items copied from the handler file
//! routes_{method}          one marker type per route implementing ApiRoute
//! api_{method}             request function per method
//! api_{method}_query       cached reads (query_cache, non-mutating methods)
//! api_{method}_mutation    tracked writes (query_cache, every method)
//! ```

use indexmap::IndexMap;
use signpost_core::{ParamKind, RequestMethod};
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::discover::ApiPath;
use crate::error::CodegenError;
use crate::exports::ShapeKind;

/// Generation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Fixed absolute origin for generated calls.
    pub base_url: Option<String>,
    /// Emit query and mutation wrappers.
    pub query_cache: bool,
}

/// Checks a configured base URL.
///
/// # Errors
///
/// Rejects a trailing slash, and anything that is not an absolute URL with a
/// host.
pub fn validate_base_url(base_url: &str) -> Result<(), CodegenError> {
    if base_url.ends_with('/') {
        return Err(CodegenError::BaseUrlTrailingSlash);
    }
    match url::Url::parse(base_url) {
        Ok(parsed) if parsed.has_host() => Ok(()),
        _ => Err(CodegenError::BaseUrlInvalid),
    }
}

/// Generates the client source for `paths`.
///
/// # Errors
///
/// Returns an error if the configured base URL is invalid.
pub fn generate(paths: &[ApiPath], options: &GenerateOptions) -> Result<String, CodegenError> {
    if let Some(base_url) = &options.base_url {
        validate_base_url(base_url)?;
    }

    let markers = marker_names(paths);
    let mut by_method: IndexMap<RequestMethod, Vec<usize>> = IndexMap::new();
    for method in RequestMethod::ALL {
        let routes: Vec<usize> = paths
            .iter()
            .enumerate()
            .filter(|(_, path)| path.has_method(method))
            .map(|(index, _)| index)
            .collect();
        if !routes.is_empty() {
            by_method.insert(method, routes);
        }
    }

    let mut out = String::new();
    write_header(&mut out, options);

    for (index, path) in paths.iter().enumerate() {
        write_route_module(&mut out, index, path);
    }

    for (method, routes) in &by_method {
        write_method_module(&mut out, *method, routes, paths, &markers);
    }

    for method in by_method.keys() {
        write_functions(&mut out, *method, options.query_cache);
    }

    Ok(out)
}

fn write_header(out: &mut String, options: &GenerateOptions) {
    out.push_str("// @generated by signpost. Do not edit this file, it is auto-generated.\n");
    out.push_str("// All changes will be lost.\n\n");
    out.push_str("#![allow(dead_code, unused_imports, clippy::all)]\n\n");

    out.push_str("/// Fixed origin for every call, if one was configured.\n");
    match &options.base_url {
        Some(url) => {
            let _ = writeln!(out, "pub const BASE_URL: Option<&str> = Some({url:?});");
        }
        None => out.push_str("pub const BASE_URL: Option<&str> = None;\n"),
    }
    out.push('\n');
    out.push_str("/// A client that uses [`BASE_URL`] when it is set.\n");
    out.push_str("pub fn client() -> signpost_client::ApiClient {\n");
    out.push_str("    signpost_client::ApiClient::new().with_base_url(BASE_URL)\n");
    out.push_str("}\n");
}

fn write_route_module(out: &mut String, index: usize, path: &ApiPath) {
    let _ = writeln!(out, "\n/// `{}` from `{}`", path.url, path.file.display());
    let _ = writeln!(out, "pub mod route_{index} {{");
    out.push_str("    use serde::{Deserialize, Serialize};\n\n");

    out.push_str("    #[derive(Debug, Clone, Default, PartialEq, Eq)]\n");
    if path.params.is_empty() {
        out.push_str("    pub struct Params {}\n\n");
    } else {
        out.push_str("    pub struct Params {\n");
        for (name, kind) in &path.params {
            let ty = match kind {
                ParamKind::Single => "String",
                ParamKind::CatchAll => "Vec<String>",
            };
            let _ = writeln!(out, "        pub {}: {ty},", field_ident(name));
        }
        out.push_str("    }\n\n");
    }

    out.push_str("    impl signpost_client::IntoRouteParams for Params {\n");
    out.push_str("        fn to_route_params(&self) -> signpost_client::RouteParams {\n");
    out.push_str("            signpost_client::RouteParams::new()");
    for name in path.params.keys() {
        let _ = write!(
            out,
            "\n                .with({name:?}, self.{}.clone())",
            field_ident(name)
        );
    }
    out.push_str("\n        }\n    }\n");

    for shape in &path.shapes {
        out.push('\n');
        out.push_str(&shape.source);
        out.push('\n');
    }

    out.push_str("}\n");
}

fn write_method_module(
    out: &mut String,
    method: RequestMethod,
    routes: &[usize],
    paths: &[ApiPath],
    markers: &[String],
) {
    let lower = method.as_str().to_ascii_lowercase();
    let variant = crate::exports::method_camel(method);

    let _ = writeln!(out, "\n/// Routes that implement {method}.");
    let _ = writeln!(out, "pub mod routes_{lower} {{");
    out.push_str("    mod sealed {\n        pub trait Sealed {}\n    }\n\n");
    let _ = writeln!(out, "    /// A route that accepts {method}.");
    out.push_str("    pub trait Route: signpost_client::ApiRoute + sealed::Sealed {}\n");

    for &index in routes {
        let path = &paths[index];
        let marker = &markers[index];
        let shape = |kind: ShapeKind, fallback: &str| {
            path.shape(method, kind).map_or_else(
                || fallback.to_string(),
                |item| format!("super::route_{index}::{}", item.name),
            )
        };

        let _ = writeln!(out, "\n    /// `{method} {}`", path.url);
        out.push_str("    #[derive(Debug, Clone, Copy, Default)]\n");
        let _ = writeln!(out, "    pub struct {marker};\n");
        let _ = writeln!(out, "    impl sealed::Sealed for {marker} {{}}");
        let _ = writeln!(out, "    impl Route for {marker} {{}}\n");
        let _ = writeln!(out, "    impl signpost_client::ApiRoute for {marker} {{");
        let _ = writeln!(
            out,
            "        const METHOD: signpost_client::RequestMethod = signpost_client::RequestMethod::{variant};"
        );
        let _ = writeln!(out, "        const TEMPLATE: &'static str = {:?};", path.url);
        let _ = writeln!(out, "        type Params = super::route_{index}::Params;");
        let _ = writeln!(
            out,
            "        type Query = {};",
            shape(ShapeKind::Query, "signpost_client::Empty")
        );
        let _ = writeln!(
            out,
            "        type Body = {};",
            shape(ShapeKind::Body, "signpost_client::Empty")
        );
        let _ = writeln!(
            out,
            "        type Response = {};",
            shape(ShapeKind::Response, "serde_json::Value")
        );
        out.push_str("    }\n");
    }

    out.push_str("\n    /// Every template in this module.\n");
    out.push_str("    pub const TEMPLATES: &[&str] = &[\n");
    for &index in routes {
        let _ = writeln!(out, "        {:?},", paths[index].url);
    }
    out.push_str("    ];\n}\n");
}

fn write_functions(out: &mut String, method: RequestMethod, query_cache: bool) {
    let lower = method.as_str().to_ascii_lowercase();

    let _ = writeln!(out, "\n/// Calls a {method} route.");
    let _ = writeln!(out, "pub async fn api_{lower}<R: routes_{lower}::Route>(");
    out.push_str("    client: &signpost_client::ApiClient,\n");
    out.push_str("    input: signpost_client::RequestInput<R>,\n");
    out.push_str(") -> Result<R::Response, signpost_client::RequestError> {\n");
    out.push_str("    client.request(input).await\n}\n");

    if !query_cache {
        return;
    }

    if !method.is_mutation() {
        let _ = writeln!(
            out,
            "\n/// Reads a {method} route through the cache, keyed by the built URL."
        );
        let _ = writeln!(out, "pub async fn api_{lower}_query<R: routes_{lower}::Route>(");
        out.push_str("    cache: &signpost_client::QueryClient,\n");
        out.push_str("    input: signpost_client::RequestInput<R>,\n");
        out.push_str(") -> Result<R::Response, signpost_client::RequestError> {\n");
        out.push_str("    cache.query(input).await\n}\n");
    }

    let _ = writeln!(
        out,
        "\n/// Runs a {method} route as a mutation, tracked under its template."
    );
    let _ = writeln!(out, "pub async fn api_{lower}_mutation<R: routes_{lower}::Route>(");
    out.push_str("    cache: &signpost_client::QueryClient,\n");
    out.push_str("    input: signpost_client::RequestInput<R>,\n");
    out.push_str(") -> Result<R::Response, signpost_client::RequestError> {\n");
    out.push_str("    cache.mutate(input).await\n}\n");
}

/// Marker type names, one per path. Clashes get the route index appended.
fn marker_names(paths: &[ApiPath]) -> Vec<String> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let name = marker_name(&path.url);
            if seen.insert(name.clone()) {
                name
            } else {
                let name = format!("{name}{index}");
                seen.insert(name.clone());
                name
            }
        })
        .collect()
}

/// `/users/:id/*rest` → `UsersByIdAllRest`, `/` → `Root`.
pub(crate) fn marker_name(url: &str) -> String {
    let name: String = url
        .split('/')
        .filter(|part| !part.is_empty())
        .map(|part| {
            if let Some(param) = part.strip_prefix(':') {
                format!("By{}", upper_camel(param))
            } else if let Some(param) = part.strip_prefix('*') {
                format!("All{}", upper_camel(param))
            } else {
                upper_camel(part)
            }
        })
        .collect();

    match name.chars().next() {
        None => "Root".to_string(),
        Some(first) if first.is_ascii_digit() => format!("Route{name}"),
        Some(_) => name,
    }
}

fn upper_camel(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

/// A field name for a route parameter.
fn field_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if syn::parse_str::<syn::Ident>(&ident).is_err() {
        ident.insert_str(0, "r#");
    }
    ident
}
