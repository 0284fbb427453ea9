//! The request finalizer.
//!
//! A [`RouteHandler`] is a terminated chain. For each request it:
//!
//! 1. parses query, cookies and body once against the merged spec,
//! 2. runs the steps in order, stopping at the first short-circuit,
//! 3. runs the terminal handler with the final context,
//! 4. renders the outcome and applies every recorded header and cookie write.
//!
//! Errors never escape as panics or transport failures. Every path ends in a
//! response.

use futures_util::FutureExt;
use http::StatusCode;
use http_body_util::BodyExt;
use signpost_core::{HandlerError, RequestMethod, RouteSpec};
use signpost_extract::response::{error_envelope, handler_error_response, ok_envelope};
use signpost_extract::{ExtractionError, ParsedInput, Request, Response};
use signpost_router::RouteParams;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;

use crate::chain::ParseErrorResponder;
use crate::reply::Reply;
use crate::scope::{MutationLog, Scope};
use crate::step::{run_steps, BoxFuture, Step, StepsEnd};

/// Type-erased terminal handler.
pub(crate) type TerminalFn =
    Arc<dyn Fn(Scope) -> BoxFuture<'static, Result<Reply, HandlerError>> + Send + Sync>;

/// Where a request ended up.
enum Outcome {
    ParseFailed(ExtractionError),
    ShortCircuited(Response),
    Replied(Reply),
    Failed(HandlerError),
}

/// A terminated chain, ready to serve requests for one method.
#[derive(Clone)]
pub struct RouteHandler {
    method: RequestMethod,
    spec: Arc<RouteSpec>,
    steps: Arc<[Arc<dyn Step>]>,
    terminal: TerminalFn,
    parse_error: Option<ParseErrorResponder>,
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("method", &self.method)
            .field("spec", &self.spec)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

impl RouteHandler {
    pub(crate) fn new(
        method: RequestMethod,
        spec: RouteSpec,
        steps: Arc<[Arc<dyn Step>]>,
        terminal: TerminalFn,
        parse_error: Option<ParseErrorResponder>,
    ) -> Self {
        Self {
            method,
            spec: Arc::new(spec),
            steps,
            terminal,
            parse_error,
        }
    }

    /// Method this handler serves.
    #[must_use]
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// Merged spec of the chain.
    #[must_use]
    pub fn spec(&self) -> &RouteSpec {
        &self.spec
    }

    /// Serves one request.
    ///
    /// `params` are the route parameters the dispatch layer matched.
    pub async fn handle(&self, request: Request, params: RouteParams) -> Response {
        let span = tracing::info_span!(
            "request",
            request_id = %uuid::Uuid::now_v7(),
            method = %request.method(),
            path = %request.uri().path(),
        );

        async move {
            let (parts, body) = request.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            let log = Arc::new(MutationLog::default());
            let run = self.run(parts, body, params, Arc::clone(&log));
            let outcome = match AssertUnwindSafe(run).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(panic = %message, "handler panicked");
                    Outcome::Failed(HandlerError::internal(message))
                }
            };

            let mut response = self.render(outcome);
            log.apply(&mut response);
            tracing::debug!(status = %response.status(), "request finished");
            response
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        parts: http::request::Parts,
        body: bytes::Bytes,
        params: RouteParams,
        log: Arc<MutationLog>,
    ) -> Outcome {
        let input = match ParsedInput::extract(&parts, &body, params, &self.spec) {
            Ok(input) => input,
            Err(error) => return Outcome::ParseFailed(error),
        };

        let scope = Scope::new(input, parts, log);
        match run_steps(&self.steps, scope).await {
            Ok(StepsEnd::Responded(response)) => Outcome::ShortCircuited(response),
            Ok(StepsEnd::Exhausted(scope)) => match (self.terminal)(scope).await {
                Ok(reply) => Outcome::Replied(reply),
                Err(error) => Outcome::Failed(error),
            },
            Err(error) => Outcome::Failed(error),
        }
    }

    fn render(&self, outcome: Outcome) -> Response {
        match outcome {
            Outcome::ParseFailed(error) => {
                tracing::debug!(error = %error, "request input rejected");
                match &self.parse_error {
                    Some(responder) => responder(&error),
                    None => error_envelope(StatusCode::BAD_REQUEST, error.message()),
                }
            }
            Outcome::ShortCircuited(response) | Outcome::Replied(Reply::Raw(response)) => response,
            Outcome::Replied(Reply::Data(data)) => ok_envelope(data),
            Outcome::Failed(error) => {
                if error.status_code().is_server_error() {
                    tracing::warn!(error = %error, "request failed");
                }
                handler_error_response(&error)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::new()
    }
}
