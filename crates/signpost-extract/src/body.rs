//! JSON body extraction.

use bytes::Bytes;
use serde_json::{Map, Value};
use signpost_core::BodyShape;

use crate::error::{ExtractionError, ExtractionSource};

/// Decodes the raw body as UTF-8 text.
pub fn body_text(bytes: &Bytes) -> Result<String, ExtractionError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ExtractionError::malformed(ExtractionSource::Body, e.to_string()))
}

/// Parses and validates a JSON body.
///
/// Whitespace-only text is treated as `{}`. Returns `None` when the shape
/// is [`BodyShape::Ignore`].
pub fn parse_body(text: &str, shape: &BodyShape) -> Result<Option<Value>, ExtractionError> {
    let Some(schema) = shape.schema() else {
        return Ok(None);
    };

    let raw = if text.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(text)
            .map_err(|e| ExtractionError::malformed(ExtractionSource::Body, e.to_string()))?
    };

    schema
        .parse(&raw)
        .map(Some)
        .map_err(|e| ExtractionError::invalid(ExtractionSource::Body, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionErrorKind;
    use serde_json::json;
    use signpost_core::Schema;

    fn shape() -> BodyShape {
        BodyShape::from_schema(Schema::object([
            ("title", Schema::string()),
            ("done", Schema::boolean().optional()),
        ]))
    }

    #[test]
    fn test_ignored_shape() {
        assert_eq!(parse_body("{not json", &BodyShape::Ignore).unwrap(), None);
    }

    #[test]
    fn test_valid_body() {
        let parsed = parse_body(r#"{"title":"x","done":true,"extra":1}"#, &shape()).unwrap();
        assert_eq!(parsed, Some(json!({"title": "x", "done": true})));
    }

    #[test]
    fn test_empty_body_is_empty_object() {
        let optional = BodyShape::from_schema(Schema::object([("a", Schema::string().optional())]));
        assert_eq!(parse_body("  ", &optional).unwrap(), Some(json!({})));

        let err = parse_body("", &shape()).unwrap_err();
        assert_eq!(err.kind(), ExtractionErrorKind::Invalid);
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_body("{\"title\":", &shape()).unwrap_err();
        assert_eq!(err.kind(), ExtractionErrorKind::Malformed);
        assert_eq!(err.source(), ExtractionSource::Body);
    }

    #[test]
    fn test_body_text_rejects_invalid_utf8() {
        let err = body_text(&Bytes::from_static(&[0xff, 0xfe])).unwrap_err();
        assert_eq!(err.kind(), ExtractionErrorKind::Malformed);
    }
}
