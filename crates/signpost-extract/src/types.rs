//! HTTP message types shared by the extraction and middleware layers.

use bytes::Bytes;
use http_body_util::Full;

/// The request type handlers receive: an `http::Request` with a fully
/// buffered body.
pub type Request = http::Request<Full<Bytes>>;

/// The response type handlers produce.
pub type Response = http::Response<Full<Bytes>>;
