//! Method and path dispatch over terminated chains.

use http::header::ALLOW;
use http::{HeaderValue, StatusCode};
use indexmap::IndexMap;
use signpost_core::RequestMethod;
use signpost_extract::response::error_envelope;
use signpost_extract::{Request, Response};
use signpost_router::{RouteTemplate, RouteTree, TemplateError};

use crate::finalize::RouteHandler;

type MethodMap = IndexMap<RequestMethod, RouteHandler>;

/// Route templates mapped to per-method handlers.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use signpost_middleware::{Chain, RouteTable, Scope};
///
/// let mut table = RouteTable::new();
/// table
///     .route(
///         "/users/:id",
///         Chain::new()
///             .params(["id"])
///             .get(|scope: Scope| async move { json!({ "id": scope.param("id") }) })
///             .unwrap(),
///     )
///     .unwrap();
///
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    tree: RouteTree<MethodMap>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `template` for the handler's method.
    ///
    /// A second handler for the same template and method replaces the first.
    pub fn route(&mut self, template: &str, handler: RouteHandler) -> Result<&mut Self, TemplateError> {
        let template = RouteTemplate::parse(template)?;

        for name in handler.spec().params().keys() {
            if !template.param_names().any(|p| p == name) {
                tracing::warn!(
                    template = template.as_str(),
                    param = name.as_str(),
                    "declared param does not appear in route template"
                );
            }
        }

        let methods = self.tree.entry(&template, IndexMap::new);
        if methods.insert(handler.method(), handler).is_some() {
            tracing::debug!(template = template.as_str(), "replaced existing handler");
        }
        Ok(self)
    }

    /// Number of distinct templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Dispatches a request.
    ///
    /// Unknown paths get a 404 envelope. Known paths without a handler for
    /// the method get a 405 envelope with an `Allow` header.
    pub async fn dispatch(&self, request: Request) -> Response {
        let Some(found) = self.tree.find(request.uri().path()) else {
            return error_envelope(StatusCode::NOT_FOUND, "Not found");
        };

        let handler = RequestMethod::from_http(request.method())
            .and_then(|method| found.value.get(&method));

        match handler {
            Some(handler) => handler.handle(request, found.params).await,
            None => {
                let allow = found
                    .value
                    .keys()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut response =
                    error_envelope(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }
        }
    }
}
