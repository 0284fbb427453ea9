//! Context steps.
//!
//! A step receives the request [`Scope`] and either answers the request, adds
//! to the context, or does nothing. Steps run strictly in declaration order.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use signpost_core::HandlerError;
//! use signpost_middleware::{Chain, Scope};
//!
//! let authed = Chain::new().step("auth", |scope: Scope| async move {
//!     let token = scope.cookie("token").ok_or_else(HandlerError::not_found)?;
//!     Ok::<_, HandlerError>(json!({ "user": token.to_uppercase() }))
//! });
//! # let _ = authed;
//! ```

use serde_json::{Map, Value};
use signpost_core::HandlerError;
use signpost_extract::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::scope::Scope;

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a step decided.
#[derive(Debug)]
pub enum StepOutcome {
    /// Send this response now. No later step and no terminal handler runs.
    Respond(Response),
    /// Merge these fields into the context for later steps.
    Extend(Map<String, Value>),
    /// Leave the context unchanged.
    Continue,
}

/// One unit of chain behavior.
pub trait Step: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Runs the step against the current scope.
    fn run(&self, scope: Scope) -> BoxFuture<'_, Result<StepOutcome, HandlerError>>;
}

/// Conversion from a step closure's return value into a [`StepOutcome`].
pub trait IntoStepOutcome {
    /// Performs the conversion.
    fn into_step_outcome(self) -> Result<StepOutcome, HandlerError>;
}

impl IntoStepOutcome for StepOutcome {
    fn into_step_outcome(self) -> Result<StepOutcome, HandlerError> {
        Ok(self)
    }
}

impl IntoStepOutcome for () {
    fn into_step_outcome(self) -> Result<StepOutcome, HandlerError> {
        Ok(StepOutcome::Continue)
    }
}

impl IntoStepOutcome for Response {
    fn into_step_outcome(self) -> Result<StepOutcome, HandlerError> {
        Ok(StepOutcome::Respond(self))
    }
}

impl IntoStepOutcome for Map<String, Value> {
    fn into_step_outcome(self) -> Result<StepOutcome, HandlerError> {
        Ok(StepOutcome::Extend(self))
    }
}

impl IntoStepOutcome for Value {
    fn into_step_outcome(self) -> Result<StepOutcome, HandlerError> {
        match self {
            Value::Object(map) => Ok(StepOutcome::Extend(map)),
            Value::Null => Ok(StepOutcome::Continue),
            other => Err(HandlerError::internal(format!(
                "step returned a non-object context value: {other}"
            ))),
        }
    }
}

impl<T: IntoStepOutcome> IntoStepOutcome for Option<T> {
    fn into_step_outcome(self) -> Result<StepOutcome, HandlerError> {
        self.map_or(Ok(StepOutcome::Continue), IntoStepOutcome::into_step_outcome)
    }
}

impl<T, E> IntoStepOutcome for Result<T, E>
where
    T: IntoStepOutcome,
    E: Into<HandlerError>,
{
    fn into_step_outcome(self) -> Result<StepOutcome, HandlerError> {
        match self {
            Ok(value) => value.into_step_outcome(),
            Err(error) => Err(error.into()),
        }
    }
}

/// A step built from an async closure.
pub struct FnStep<F> {
    name: String,
    f: F,
}

impl<F> FnStep<F> {
    /// Wraps `f` under `name`.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F, Fut, R> Step for FnStep<F>
where
    F: Fn(Scope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoStepOutcome,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, scope: Scope) -> BoxFuture<'_, Result<StepOutcome, HandlerError>> {
        let fut = (self.f)(scope);
        Box::pin(async move { fut.await.into_step_outcome() })
    }
}

/// How a step sequence ended.
pub(crate) enum StepsEnd {
    /// A step answered the request.
    Responded(Response),
    /// Every step ran; the scope carries the final context.
    Exhausted(Scope),
}

/// Runs `steps` in order, threading the growing context.
pub(crate) async fn run_steps(
    steps: &[Arc<dyn Step>],
    mut scope: Scope,
) -> Result<StepsEnd, HandlerError> {
    for step in steps {
        tracing::trace!(step = step.name(), "running step");
        match step.run(scope.clone()).await? {
            StepOutcome::Respond(response) => {
                tracing::debug!(step = step.name(), status = %response.status(), "step short-circuited");
                return Ok(StepsEnd::Responded(response));
            }
            StepOutcome::Extend(additions) => {
                let context = scope.context().merge(additions);
                scope = scope.with_context(context);
            }
            StepOutcome::Continue => {}
        }
    }
    Ok(StepsEnd::Exhausted(scope))
}
