//! The contract between generated route markers and the runtime.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use signpost_core::RequestMethod;
use signpost_router::RouteParams;

/// Converts a typed parameter struct into template parameters.
pub trait IntoRouteParams {
    /// Parameter values keyed by template name.
    fn to_route_params(&self) -> RouteParams;
}

impl IntoRouteParams for RouteParams {
    fn to_route_params(&self) -> RouteParams {
        self.clone()
    }
}

/// One method of one route, as described by the generated client.
///
/// Generated code declares a marker type per route and method:
///
/// ```rust
/// use signpost_client::{ApiRoute, Empty, RequestMethod, RouteParams};
///
/// struct GetUser;
///
/// impl ApiRoute for GetUser {
///     const METHOD: RequestMethod = RequestMethod::Get;
///     const TEMPLATE: &'static str = "/users/:id";
///     type Params = RouteParams;
///     type Query = Empty;
///     type Body = Empty;
///     type Response = serde_json::Value;
/// }
/// ```
pub trait ApiRoute: Send + Sync + 'static {
    /// HTTP method.
    const METHOD: RequestMethod;
    /// Route template, e.g. `/users/:id`.
    const TEMPLATE: &'static str;
    /// Route parameters.
    type Params: IntoRouteParams + Send + Sync;
    /// Query string shape.
    type Query: Serialize + Send + Sync;
    /// Request body shape.
    type Body: Serialize + Send + Sync;
    /// Data inside an `ok` envelope.
    type Response: DeserializeOwned + Send;
}

/// Shape of a route part that carries nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_serializes_to_empty_object() {
        assert_eq!(serde_json::to_string(&Empty {}).unwrap(), "{}");
    }

    #[test]
    fn test_route_params_pass_through() {
        let params = RouteParams::new().with("id", "7");
        assert_eq!(params.to_route_params(), params);
    }
}
