//! The chain builder.
//!
//! A [`Chain`] is an immutable value: every builder call returns a new chain
//! and leaves the receiver untouched, so a shared fragment (say, an auth
//! chain) can be extended by many routes.
//!
//! Conflicting declarations do not panic. The first [`BuildError`] is kept
//! and reported by the terminal call.

use signpost_core::{BuildError, HandlerError, RequestMethod, RouteSpec, Schema};
use signpost_extract::{ExtractionError, Response};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::finalize::{RouteHandler, TerminalFn};
use crate::reply::IntoReply;
use crate::scope::Scope;
use crate::step::{run_steps, BoxFuture, FnStep, Step, StepOutcome, StepsEnd};

/// Responder used when input parsing or validation fails.
pub type ParseErrorResponder = Arc<dyn Fn(&ExtractionError) -> Response + Send + Sync>;

/// A route definition under construction.
///
/// # Example
///
/// ```rust
/// use serde_json::{json, Value};
/// use signpost_core::{HandlerError, Schema};
/// use signpost_middleware::{Chain, Scope};
///
/// let auth = Chain::new()
///     .cookies(Schema::object([("token", Schema::string())]))
///     .step("auth", |scope: Scope| async move {
///         let token = scope.cookie("token").unwrap_or_default().to_string();
///         Ok::<_, HandlerError>(json!({ "user": token }))
///     });
///
/// let search = Chain::new()
///     .use_chain(&auth)
///     .query(Schema::object([("q", Schema::string())]))
///     .get(|scope: Scope| async move {
///         let user: String = scope.context_as("user")?;
///         Ok::<_, HandlerError>(json!({ "user": user, "q": scope.query()["q"] }))
///     })
///     .unwrap();
///
/// assert!(search.spec().cookies().contains_key("token"));
/// ```
#[derive(Clone)]
pub struct Chain {
    spec: Result<RouteSpec, BuildError>,
    steps: Arc<[Arc<dyn Step>]>,
    required_context: Arc<[String]>,
    parse_error: Option<ParseErrorResponder>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("spec", &self.spec)
            .field(
                "steps",
                &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("required_context", &self.required_context)
            .field("parse_error", &self.parse_error.is_some())
            .finish()
    }
}

impl Chain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            spec: Ok(RouteSpec::new()),
            steps: Arc::from(Vec::new()),
            required_context: Arc::from(Vec::new()),
            parse_error: None,
        }
    }

    /// Returns the accumulated spec, or the first build error.
    pub fn route_spec(&self) -> Result<&RouteSpec, &BuildError> {
        self.spec.as_ref()
    }

    /// Declares single-segment route parameters.
    pub fn params<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map_spec(|spec| spec.with_params(names))
    }

    /// Declares a catch-all route parameter.
    pub fn catch_all_param(&self, name: impl Into<String>) -> Self {
        self.map_spec(|spec| spec.with_catch_all(name))
    }

    /// Declares query fields. `schema` must be an object schema.
    pub fn query(&self, schema: Schema) -> Self {
        self.map_spec(|spec| spec.with_query(schema))
    }

    /// Declares cookie fields. `schema` must be an object schema.
    pub fn cookies(&self, schema: Schema) -> Self {
        self.map_spec(|spec| spec.with_cookies(schema))
    }

    /// Declares the request body.
    pub fn body(&self, schema: Schema) -> Self {
        self.map_spec(|spec| spec.with_body(schema))
    }

    /// Appends a step.
    pub fn use_step(&self, step: impl Step) -> Self {
        self.push_step(Arc::new(step))
    }

    /// Appends a step built from an async closure.
    ///
    /// The closure may return `()`, a JSON object, a `Map`, a [`Response`],
    /// a [`StepOutcome`], or an `Option`/`Result` of those.
    pub fn step<F, Fut, R>(&self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: crate::step::IntoStepOutcome,
    {
        self.use_step(FnStep::new(name, f))
    }

    /// Composes another chain as a single step.
    ///
    /// Specs are merged with the usual conflict rules. The other chain's
    /// steps run as one block; its short-circuit or its final context is all
    /// this chain sees. Its parse-error responder is ignored.
    pub fn use_chain(&self, other: &Chain) -> Self {
        let merged = self.merge_spec(other);
        let nested = NestedChain {
            steps: Arc::clone(&other.steps),
            required_context: Arc::clone(&other.required_context),
        };
        Self {
            spec: merged,
            ..self.push_step(Arc::new(nested))
        }
    }

    /// Merges another chain's declarations without its steps.
    pub fn extend(&self, other: &Chain) -> Self {
        Self {
            spec: self.merge_spec(other),
            ..self.clone()
        }
    }

    /// Declares context keys this chain expects an outer chain to provide.
    ///
    /// Checked when the chain runs nested. A top-level chain with required
    /// context cannot be terminated.
    pub fn requires_context<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut required = self.required_context.to_vec();
        for key in keys {
            let key = key.into();
            if !required.contains(&key) {
                required.push(key);
            }
        }
        Self {
            required_context: Arc::from(required),
            ..self.clone()
        }
    }

    /// Replaces the default 400 envelope sent when input parsing fails.
    pub fn on_parse_error<F>(&self, responder: F) -> Self
    where
        F: Fn(&ExtractionError) -> Response + Send + Sync + 'static,
    {
        Self {
            parse_error: Some(Arc::new(responder)),
            ..self.clone()
        }
    }

    /// Terminates the chain into a handler for `method`.
    pub fn route<H, Fut, R>(&self, method: RequestMethod, handler: H) -> Result<RouteHandler, BuildError>
    where
        H: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        let spec = self.spec.clone()?;
        if !self.required_context.is_empty() {
            return Err(BuildError::UnsatisfiedContext {
                keys: self.required_context.to_vec(),
            });
        }

        let terminal: TerminalFn = Arc::new(move |scope: Scope| {
            let fut = handler(scope);
            Box::pin(async move { fut.await.into_reply() })
        });

        Ok(RouteHandler::new(
            method,
            spec,
            Arc::clone(&self.steps),
            terminal,
            self.parse_error.clone(),
        ))
    }

    /// Terminates the chain into a GET handler.
    pub fn get<H, Fut, R>(&self, handler: H) -> Result<RouteHandler, BuildError>
    where
        H: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Get, handler)
    }

    /// Terminates the chain into a POST handler.
    pub fn post<H, Fut, R>(&self, handler: H) -> Result<RouteHandler, BuildError>
    where
        H: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Post, handler)
    }

    /// Terminates the chain into a PUT handler.
    pub fn put<H, Fut, R>(&self, handler: H) -> Result<RouteHandler, BuildError>
    where
        H: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Put, handler)
    }

    /// Terminates the chain into a PATCH handler.
    pub fn patch<H, Fut, R>(&self, handler: H) -> Result<RouteHandler, BuildError>
    where
        H: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Patch, handler)
    }

    /// Terminates the chain into a DELETE handler.
    pub fn delete<H, Fut, R>(&self, handler: H) -> Result<RouteHandler, BuildError>
    where
        H: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Delete, handler)
    }

    /// Terminates the chain into a HEAD handler.
    pub fn head<H, Fut, R>(&self, handler: H) -> Result<RouteHandler, BuildError>
    where
        H: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Head, handler)
    }

    /// Terminates the chain into an OPTIONS handler.
    pub fn options<H, Fut, R>(&self, handler: H) -> Result<RouteHandler, BuildError>
    where
        H: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply,
    {
        self.route(RequestMethod::Options, handler)
    }

    fn map_spec(
        &self,
        f: impl FnOnce(&RouteSpec) -> Result<RouteSpec, BuildError>,
    ) -> Self {
        Self {
            spec: self.spec.as_ref().map_err(Clone::clone).and_then(f),
            ..self.clone()
        }
    }

    fn merge_spec(&self, other: &Chain) -> Result<RouteSpec, BuildError> {
        let mine = self.spec.as_ref().map_err(Clone::clone)?;
        let theirs = other.spec.as_ref().map_err(Clone::clone)?;
        mine.merge(theirs)
    }

    fn push_step(&self, step: Arc<dyn Step>) -> Self {
        let mut steps = self.steps.to_vec();
        steps.push(step);
        Self {
            steps: Arc::from(steps),
            ..self.clone()
        }
    }
}

/// Another chain's steps running as one atomic block.
struct NestedChain {
    steps: Arc<[Arc<dyn Step>]>,
    required_context: Arc<[String]>,
}

impl Step for NestedChain {
    fn name(&self) -> &str {
        "nested-chain"
    }

    fn run(&self, scope: Scope) -> BoxFuture<'_, Result<StepOutcome, HandlerError>> {
        Box::pin(async move {
            let missing = scope.context().missing_keys(&self.required_context);
            if !missing.is_empty() {
                return Err(HandlerError::internal(format!(
                    "nested chain requires context that is not available: {}",
                    missing.join(", ")
                )));
            }

            match run_steps(&self.steps, scope).await? {
                StepsEnd::Responded(response) => Ok(StepOutcome::Respond(response)),
                StepsEnd::Exhausted(scope) => Ok(StepOutcome::Extend(scope.context().to_map())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use signpost_core::SpecSection;

    #[test]
    fn test_builder_does_not_mutate_receiver() {
        let base = Chain::new().query(Schema::object([("a", Schema::string())]));
        let extended = base.query(Schema::object([("b", Schema::string())]));

        assert_eq!(base.route_spec().unwrap().query().len(), 1);
        assert_eq!(extended.route_spec().unwrap().query().len(), 2);
    }

    #[test]
    fn test_conflict_reported_at_termination() {
        let chain = Chain::new()
            .query(Schema::object([("a", Schema::string())]))
            .query(Schema::object([("a", Schema::integer())]));

        let err = chain.get(|_scope: Scope| async { json!(null) }).unwrap_err();
        assert_eq!(
            err,
            BuildError::FieldConflict {
                section: SpecSection::Query,
                field: "a".into(),
            }
        );
    }

    #[test]
    fn test_first_error_sticks() {
        let chain = Chain::new()
            .query(Schema::string())
            .cookies(Schema::integer());
        assert_eq!(
            chain.route_spec().unwrap_err(),
            &BuildError::NotAnObject {
                section: SpecSection::Query
            }
        );
    }

    #[test]
    fn test_use_chain_merges_specs() {
        let auth = Chain::new().cookies(Schema::object([("token", Schema::string())]));
        let chain = Chain::new()
            .query(Schema::object([("q", Schema::string())]))
            .use_chain(&auth);

        let spec = chain.route_spec().unwrap();
        assert!(spec.cookies().contains_key("token"));
        assert!(spec.query().contains_key("q"));
        assert_eq!(chain.steps.len(), 1);
    }

    #[test]
    fn test_extend_adds_no_steps() {
        let fragment = Chain::new()
            .body(Schema::object([("name", Schema::string())]))
            .step("noop", |_scope: Scope| async {});
        let chain = Chain::new().extend(&fragment);

        assert!(chain.steps.is_empty());
        assert!(!chain.route_spec().unwrap().body().is_ignored());
    }

    #[test]
    fn test_top_level_required_context_fails() {
        let chain = Chain::new().requires_context(["user"]);
        let err = chain.get(|_scope: Scope| async {}).unwrap_err();
        assert_eq!(
            err,
            BuildError::UnsatisfiedContext {
                keys: vec!["user".into()]
            }
        );
    }

    #[test]
    fn test_param_conflict() {
        let chain = Chain::new().params(["slug"]).catch_all_param("slug");
        assert_eq!(
            chain.route_spec().unwrap_err(),
            &BuildError::ParamConflict {
                name: "slug".into()
            }
        );
    }
}
