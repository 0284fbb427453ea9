//! Route parameter storage.
//!
//! Parameters are kept as ordered (name, value) pairs inline for the common
//! case of a handful of params. A value is either a single string or, for a
//! catch-all segment, an ordered list of strings.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;

/// Maximum number of parameters stored inline.
const INLINE_PARAMS: usize = 4;

/// The value bound to one route parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Value of a `:name` segment.
    One(String),
    /// Values of a `*name` segment, in path order.
    Many(Vec<String>),
}

impl ParamValue {
    /// Returns the single value, if this is a `One`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(_) => None,
        }
    }

    /// Returns the list, if this is a `Many`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::One(_) => None,
            Self::Many(values) => Some(values),
        }
    }

    /// Converts to a JSON string or array.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::One(value) => Value::String(value.clone()),
            Self::Many(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParamValue {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.iter().map(|v| (*v).to_string()).collect())
    }
}

/// Route parameters extracted from a path or supplied to build one.
///
/// # Example
///
/// ```rust
/// use signpost_router::RouteParams;
///
/// let mut params = RouteParams::new();
/// params.push("owner", "ada");
/// params.push("path", ["src", "lib.rs"]);
///
/// assert_eq!(params.get_one("owner"), Some("ada"));
/// assert_eq!(params.get_many("path").map(<[String]>::len), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteParams {
    inner: SmallVec<[(String, ParamValue); INLINE_PARAMS]>,
}

impl RouteParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parameter set with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Sets a parameter, replacing any previous value under the same name.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.inner.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.inner.push((name, value));
        }
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Returns the value for a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.inner.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns a single-segment value.
    #[must_use]
    pub fn get_one(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    /// Returns a catch-all value.
    #[must_use]
    pub fn get_many(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(ParamValue::as_list)
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.inner
                .iter()
                .map(|(n, v)| (n.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl<N: Into<String>, V: Into<ParamValue>> FromIterator<(N, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}

impl Serialize for RouteParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.inner.len()))?;
        for (name, value) in &self.inner {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
