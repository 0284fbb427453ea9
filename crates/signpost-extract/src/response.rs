//! Response builders for the JSON envelope and redirects.
//!
//! | Builder                 | Status              | Body                               |
//! |-------------------------|---------------------|------------------------------------|
//! | [`ok_envelope`]         | 200                 | `{"status":"ok","data":..}`        |
//! | [`error_envelope`]      | given               | `{"status":"error","message":..}`  |
//! | [`redirect`]            | given (3xx)         | empty, with `Location`             |
//! | [`handler_error_response`] | per variant      | envelope or redirect               |

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use serde_json::Value;
use signpost_core::{Envelope, HandlerError};

use crate::types::Response;

const JSON: &str = "application/json";

/// Serializes `body` as JSON with the given status.
///
/// A value that fails to serialize yields a 500 error envelope.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => raw_json(status, bytes),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response body");
            raw_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"status":"error","message":"failed to serialize response"}"#.to_vec(),
            )
        }
    }
}

/// Wraps `data` as `{"status":"ok","data":data}` with status 200.
pub fn ok_envelope(data: Value) -> Response {
    json_response(StatusCode::OK, &Envelope::ok(data))
}

/// Builds `{"status":"error","message":message}` with `status`.
pub fn error_envelope(status: StatusCode, message: &str) -> Response {
    json_response(status, &Envelope::<Value>::error(message))
}

/// Builds a redirect to `location`.
///
/// A location that is not a valid header value yields a 500 error envelope.
pub fn redirect(location: &str, status: StatusCode) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = status;
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(_) => error_envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            "invalid redirect location",
        ),
    }
}

/// Maps a [`HandlerError`] to its response.
pub fn handler_error_response(error: &HandlerError) -> Response {
    match error {
        HandlerError::Redirect { location, status } => redirect(location, *status),
        other => error_envelope(other.status_code(), &other.message()),
    }
}

fn raw_json(status: StatusCode, bytes: Vec<u8>) -> Response {
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    response
}
