//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use signpost_extract::Response;

/// A buffered response with helper methods for assertions.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Buffers a handler response.
    pub async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Creates a test response from raw parts.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true if the status is successful (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a reference to the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Every `Set-Cookie` header, in order.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// The `Set-Cookie` header for `name`, if one was sent.
    #[must_use]
    pub fn set_cookie(&self, name: &str) -> Option<&str> {
        let prefix = format!("{name}=");
        self.set_cookies()
            .into_iter()
            .find(|cookie| cookie.starts_with(&prefix))
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body does not decode as `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// Deserializes the body as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}",
            expected, self.status
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(
            actual, expected,
            "Header '{name}': expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts that the body is an ok envelope carrying `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or is a different envelope.
    pub fn assert_ok_data(&self, expected: &serde_json::Value) -> &Self {
        let body = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body is not JSON: {e}"));
        assert_eq!(body["status"], "ok", "Expected ok envelope, got {body}");
        assert_eq!(&body["data"], expected);
        self
    }

    /// Asserts that the body is an error envelope with `expected` as message.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or is a different envelope.
    pub fn assert_error_message(&self, expected: &str) -> &Self {
        let body = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body is not JSON: {e}"));
        assert_eq!(body["status"], "error", "Expected error envelope, got {body}");
        assert_eq!(body["message"], expected);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response() -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1; Path=/"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("b=; Max-Age=0"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::new(
            StatusCode::OK,
            headers,
            Bytes::from(r#"{"status":"ok","data":{"id":3}}"#),
        )
    }

    #[test]
    fn test_set_cookies() {
        let response = response();
        assert_eq!(response.set_cookies(), vec!["a=1; Path=/", "b=; Max-Age=0"]);
        assert_eq!(response.set_cookie("b"), Some("b=; Max-Age=0"));
        assert_eq!(response.set_cookie("c"), None);
    }

    #[test]
    fn test_json_helpers() {
        let response = response();
        assert_eq!(response.json_value().unwrap()["data"]["id"], 3);
        response
            .assert_status(StatusCode::OK)
            .assert_header("content-type", "application/json")
            .assert_ok_data(&json!({"id": 3}));
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let response = TestResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from_static(&[0xff, 0xfe]),
        );
        assert!(matches!(response.text(), Err(TestError::BodyRead(_))));
    }
}
