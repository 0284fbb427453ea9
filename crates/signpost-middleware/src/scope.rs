//! The per-request handle passed to steps and terminal handlers.

use http::header::SET_COOKIE;
use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use signpost_core::{Context, HandlerError};
use signpost_extract::{ParsedInput, Response, SetCookie};
use signpost_router::RouteParams;
use std::fmt;
use std::sync::Arc;

/// Header and cookie writes collected during one request.
///
/// Headers are replayed in the order they were written. Cookies are keyed by
/// name and the last write for a name wins, whether it was a set or a delete.
#[derive(Debug, Default)]
pub struct MutationLog {
    inner: Mutex<LogEntries>,
}

#[derive(Debug, Default)]
struct LogEntries {
    headers: Vec<HeaderWrite>,
    cookies: IndexMap<String, SetCookie>,
}

#[derive(Debug)]
enum HeaderWrite {
    Set(HeaderName, HeaderValue),
    Append(HeaderName, HeaderValue),
}

impl MutationLog {
    fn push_header(&self, write: HeaderWrite) {
        self.inner.lock().headers.push(write);
    }

    fn push_cookie(&self, cookie: SetCookie) {
        let mut inner = self.inner.lock();
        inner.cookies.shift_remove(cookie.name());
        inner.cookies.insert(cookie.name().to_string(), cookie);
    }

    /// Returns the pending cookie writes in application order.
    pub fn cookies(&self) -> Vec<SetCookie> {
        self.inner.lock().cookies.values().cloned().collect()
    }

    /// Applies every recorded write to `response`.
    pub fn apply(&self, response: &mut Response) {
        let inner = self.inner.lock();
        let headers = response.headers_mut();

        for write in &inner.headers {
            match write {
                HeaderWrite::Set(name, value) => {
                    headers.insert(name.clone(), value.clone());
                }
                HeaderWrite::Append(name, value) => {
                    headers.append(name.clone(), value.clone());
                }
            }
        }

        for cookie in inner.cookies.values() {
            match HeaderValue::from_str(&cookie.to_header_value()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(_) => {
                    tracing::warn!(cookie = cookie.name(), "dropping cookie with invalid header value");
                }
            }
        }
    }
}

/// Access to one request's parsed input, context and response mutations.
///
/// Cloning is cheap. All clones share the same mutation log, so writes made
/// by any step, nested chains included, reach the final response.
#[derive(Clone)]
pub struct Scope {
    input: Arc<ParsedInput>,
    head: Arc<Parts>,
    context: Context,
    log: Arc<MutationLog>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("method", &self.head.method)
            .field("uri", &self.head.uri)
            .field("input", &self.input)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Scope {
    pub(crate) fn new(input: ParsedInput, head: Parts, log: Arc<MutationLog>) -> Self {
        Self {
            input: Arc::new(input),
            head: Arc::new(head),
            context: Context::new(),
            log,
        }
    }

    pub(crate) fn with_context(&self, context: Context) -> Self {
        Self {
            input: Arc::clone(&self.input),
            head: Arc::clone(&self.head),
            context,
            log: Arc::clone(&self.log),
        }
    }

    /// Route parameters.
    #[must_use]
    pub fn params(&self) -> &RouteParams {
        &self.input.params
    }

    /// A single route parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.input.params.get_one(name)
    }

    /// A catch-all route parameter.
    #[must_use]
    pub fn catch_all(&self, name: &str) -> Option<&[String]> {
        self.input.params.get_many(name)
    }

    /// Validated query fields.
    #[must_use]
    pub fn query(&self) -> &Value {
        &self.input.query
    }

    /// Deserializes the validated query.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        decode("query", &self.input.query)
    }

    /// Validated cookie fields.
    #[must_use]
    pub fn cookies(&self) -> &Value {
        &self.input.cookies
    }

    /// A single validated cookie, if it is a string.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.input.cookies.get(name).and_then(Value::as_str)
    }

    /// Deserializes the validated cookies.
    pub fn cookies_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        decode("cookies", &self.input.cookies)
    }

    /// Validated body, if the route reads one.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.input.body.as_ref()
    }

    /// Deserializes the validated body.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        decode("body", self.input.body.as_ref().unwrap_or(&Value::Null))
    }

    /// Raw body text, for methods that carry a body.
    #[must_use]
    pub fn raw_body(&self) -> Option<&str> {
        self.input.raw_body.as_deref()
    }

    /// Context accumulated so far.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Deserializes one context entry.
    pub fn context_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, HandlerError> {
        self.context.get_as(key)
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// Request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Sets a response header, replacing earlier values.
    pub fn set_header<K, V>(&self, name: K, value: V) -> Result<(), HandlerError>
    where
        K: TryInto<HeaderName>,
        <K as TryInto<HeaderName>>::Error: fmt::Display,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: fmt::Display,
    {
        let (name, value) = header_pair(name, value)?;
        self.log.push_header(HeaderWrite::Set(name, value));
        Ok(())
    }

    /// Appends a response header.
    pub fn append_header<K, V>(&self, name: K, value: V) -> Result<(), HandlerError>
    where
        K: TryInto<HeaderName>,
        <K as TryInto<HeaderName>>::Error: fmt::Display,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: fmt::Display,
    {
        let (name, value) = header_pair(name, value)?;
        self.log.push_header(HeaderWrite::Append(name, value));
        Ok(())
    }

    /// Records a cookie to set on the response.
    pub fn set_cookie(&self, cookie: SetCookie) {
        self.log.push_cookie(cookie);
    }

    /// Records a cookie deletion.
    pub fn delete_cookie(&self, name: impl Into<String>) {
        self.log.push_cookie(SetCookie::removal(name));
    }

    /// Records a deletion for a cookie that was set with a `Path` and
    /// optionally a `Domain`. Both must match for the client to drop it.
    pub fn delete_cookie_at(&self, name: impl Into<String>, path: &str, domain: Option<&str>) {
        let mut cookie = SetCookie::removal(name).path(path);
        if let Some(domain) = domain {
            cookie = cookie.domain(domain);
        }
        self.log.push_cookie(cookie);
    }
}

fn header_pair<K, V>(name: K, value: V) -> Result<(HeaderName, HeaderValue), HandlerError>
where
    K: TryInto<HeaderName>,
    <K as TryInto<HeaderName>>::Error: fmt::Display,
    V: TryInto<HeaderValue>,
    <V as TryInto<HeaderValue>>::Error: fmt::Display,
{
    let name = name
        .try_into()
        .map_err(|e| HandlerError::internal(format!("invalid header name: {e}")))?;
    let value = value
        .try_into()
        .map_err(|e| HandlerError::internal(format!("invalid header value: {e}")))?;
    Ok((name, value))
}

fn decode<T: DeserializeOwned>(section: &str, value: &Value) -> Result<T, HandlerError> {
    serde_json::from_value(value.clone())
        .map_err(|e| HandlerError::bad_request(format!("invalid {section}: {e}")))
}
