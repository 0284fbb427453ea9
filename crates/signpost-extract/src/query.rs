//! Query string extraction.

use serde_json::{Map, Value};
use signpost_core::Schema;

use crate::error::{ExtractionError, ExtractionSource};

/// Decodes a query string into a flat JSON object.
///
/// Values stay strings. A key that appears more than once becomes an array
/// of its values in order of appearance.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use signpost_extract::raw_query;
///
/// let value = raw_query(Some("tag=a&tag=b&page=2")).unwrap();
/// assert_eq!(value, json!({"tag": ["a", "b"], "page": "2"}));
/// ```
pub fn raw_query(query: Option<&str>) -> Result<Value, ExtractionError> {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return Ok(Value::Object(Map::new()));
    };

    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|e| ExtractionError::malformed(ExtractionSource::Query, e.to_string()))?;

    Ok(Value::Object(collect_repeated(pairs)))
}

/// Validates a raw query object against the declared shape.
///
/// With no declared shape the result is an empty object.
pub fn parse_query(raw: &Value, shape: Option<&Schema>) -> Result<Value, ExtractionError> {
    match shape {
        Some(schema) => schema
            .parse_coerced(raw)
            .map_err(|e| ExtractionError::invalid(ExtractionSource::Query, e)),
        None => Ok(Value::Object(Map::new())),
    }
}

/// Folds (name, value) pairs into an object, turning repeats into arrays.
pub(crate) fn collect_repeated(pairs: impl IntoIterator<Item = (String, String)>) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in pairs {
        let value = Value::String(value);
        match map.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(name, value);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_query() {
        assert_eq!(raw_query(None).unwrap(), json!({}));
        assert_eq!(raw_query(Some("")).unwrap(), json!({}));
    }

    #[test]
    fn test_decodes_percent_and_plus() {
        let value = raw_query(Some("q=hello+world&x=%2Fa")).unwrap();
        assert_eq!(value, json!({"q": "hello world", "x": "/a"}));
    }

    #[test]
    fn test_parse_query_coerces() {
        let schema = Schema::object([
            ("page", Schema::integer()),
            ("q", Schema::string()),
        ]);
        let raw = raw_query(Some("page=3&q=a&q=b&extra=1")).unwrap();
        let parsed = parse_query(&raw, Some(&schema)).unwrap();
        // Repeated keys collapse to the last value for scalar fields.
        assert_eq!(parsed, json!({"page": 3, "q": "b"}));
    }

    #[test]
    fn test_parse_query_without_shape() {
        let raw = raw_query(Some("a=1")).unwrap();
        assert_eq!(parse_query(&raw, None).unwrap(), json!({}));
    }

    #[test]
    fn test_missing_required_field() {
        let schema = Schema::object([("q", Schema::string())]);
        let err = parse_query(&json!({}), Some(&schema)).unwrap_err();
        assert_eq!(err.source(), ExtractionSource::Query);
        assert!(err.to_string().contains("missing required property 'q'"));
    }
}
