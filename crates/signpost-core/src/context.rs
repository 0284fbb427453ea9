//! Request-scoped context accumulated by chain steps.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::HandlerError;

/// Ordered, persistent key-value context.
///
/// Each merge produces a new context; earlier snapshots stay unchanged. Later
/// entries override earlier ones with the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Arc<IndexMap<String, Value>>,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a new context with `additions` merged over this one.
    #[must_use]
    pub fn merge(&self, additions: Map<String, Value>) -> Self {
        if additions.is_empty() {
            return self.clone();
        }
        let mut entries = (*self.entries).clone();
        for (key, value) in additions {
            entries.insert(key, value);
        }
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns a new context with a single entry set.
    #[must_use]
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(key.into(), value.into());
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Returns the keys in `required` that this context lacks.
    #[must_use]
    pub fn missing_keys(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|key| !self.entries.contains_key(key.as_str()))
            .cloned()
            .collect()
    }

    /// Deserializes the entry under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Internal`] if the key is missing or has the
    /// wrong shape. Context is produced by the route's own steps, so a miss is
    /// a server bug rather than bad input.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, HandlerError> {
        let value = self
            .entries
            .get(key)
            .ok_or_else(|| HandlerError::internal(format!("missing context key '{key}'")))?;
        serde_json::from_value(value.clone()).map_err(|e| {
            HandlerError::internal(format!("context key '{key}' has unexpected shape: {e}"))
        })
    }

    /// Deserializes the whole context into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Internal`] if the context does not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(self.to_value())
            .map_err(|e| HandlerError::internal(format!("context has unexpected shape: {e}")))
    }

    /// Copies the entries into a JSON map.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Converts the context to a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        Self::new().merge(map)
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}
