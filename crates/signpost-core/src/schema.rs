//! Value-level schema validation.
//!
//! A [`Schema`] describes the accepted shape of a query string, a cookie jar or
//! a request body. Validation is "parse or fail": a successful parse returns a
//! normalized [`serde_json::Value`] (unknown object keys stripped, absent
//! optional fields omitted), a failed parse returns every issue found.
//!
//! Schemas are plain values and compare structurally, which is what route spec
//! merging uses to decide whether two declarations of the same field agree.
//!
//! # Coercion
//!
//! Query strings and cookies only ever carry strings. [`Schema::parse_coerced`]
//! accepts those raw values and converts them where the schema asks for
//! something else:
//!
//! | Schema      | Raw input            | Result                    |
//! |-------------|----------------------|---------------------------|
//! | `integer`   | `"42"`               | `42`                      |
//! | `boolean`   | `"true"` / `"0"`     | `true` / `false`          |
//! | `string`    | `["a", "b"]`         | `"b"` (last value wins)   |
//! | `array`     | `"a"`                | `["a"]`                   |
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use signpost_core::Schema;
//!
//! let schema = Schema::object([
//!     ("page", Schema::integer().minimum_int(1)),
//!     ("tag", Schema::string().optional()),
//! ]);
//!
//! let parsed = schema.parse_coerced(&json!({ "page": "2", "extra": "x" })).unwrap();
//! assert_eq!(parsed, json!({ "page": 2 }));
//!
//! assert!(schema.parse(&json!({ "page": 0 })).is_err());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// A declared value shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    /// String value.
    String {
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
    },
    /// Integer value.
    Integer {
        /// Inclusive lower bound.
        minimum: Option<i64>,
        /// Inclusive upper bound.
        maximum: Option<i64>,
    },
    /// Floating point value.
    Number {
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
    },
    /// Boolean value.
    Boolean,
    /// Exactly this JSON value.
    Literal {
        /// The only accepted value.
        value: Value,
    },
    /// Homogeneous list.
    Array {
        /// Schema for every item.
        items: Box<Schema>,
        /// Minimum number of items.
        min_items: Option<usize>,
        /// Maximum number of items.
        max_items: Option<usize>,
    },
    /// Object with known properties. Unknown keys are stripped.
    Object {
        /// Properties in declaration order.
        properties: IndexMap<String, Schema>,
    },
    /// First matching variant wins.
    OneOf {
        /// Candidate schemas, tried in order.
        variants: Vec<Schema>,
    },
    /// The inner schema, or absent / null.
    Optional {
        /// Schema applied when a value is present.
        inner: Box<Schema>,
    },
    /// Anything, including absent.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Coerce,
}

impl Schema {
    /// Creates a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::String {
            min_length: None,
            max_length: None,
        }
    }

    /// Creates an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::Integer {
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::Number {
            minimum: None,
            maximum: None,
        }
    }

    /// Creates a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::Boolean
    }

    /// Creates a literal schema.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    /// Creates an object schema from `(name, schema)` pairs.
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        }
    }

    /// Creates a union schema.
    pub fn one_of(variants: impl IntoIterator<Item = Schema>) -> Self {
        Self::OneOf {
            variants: variants.into_iter().collect(),
        }
    }

    /// Creates a schema accepting any value.
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }

    /// Wraps this schema so the value may be absent or null.
    #[must_use]
    pub fn optional(self) -> Self {
        match self {
            already @ Self::Optional { .. } => already,
            other => Self::Optional {
                inner: Box::new(other),
            },
        }
    }

    /// Sets the minimum length for string schemas.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let Self::String { min_length, .. } = &mut self {
            *min_length = Some(len);
        }
        self
    }

    /// Sets the maximum length for string schemas.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let Self::String { max_length, .. } = &mut self {
            *max_length = Some(len);
        }
        self
    }

    /// Sets the minimum for integer schemas.
    #[must_use]
    pub fn minimum_int(mut self, min: i64) -> Self {
        if let Self::Integer { minimum, .. } = &mut self {
            *minimum = Some(min);
        }
        self
    }

    /// Sets the maximum for integer schemas.
    #[must_use]
    pub fn maximum_int(mut self, max: i64) -> Self {
        if let Self::Integer { maximum, .. } = &mut self {
            *maximum = Some(max);
        }
        self
    }

    /// Sets the minimum for number schemas.
    #[must_use]
    pub fn minimum(mut self, min: f64) -> Self {
        if let Self::Number { minimum, .. } = &mut self {
            *minimum = Some(min);
        }
        self
    }

    /// Sets the maximum for number schemas.
    #[must_use]
    pub fn maximum(mut self, max: f64) -> Self {
        if let Self::Number { maximum, .. } = &mut self {
            *maximum = Some(max);
        }
        self
    }

    /// Sets the minimum item count for array schemas.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let Self::Array { min_items, .. } = &mut self {
            *min_items = Some(min);
        }
        self
    }

    /// Sets the maximum item count for array schemas.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let Self::Array { max_items, .. } = &mut self {
            *max_items = Some(max);
        }
        self
    }

    /// Returns the properties of an object schema.
    #[must_use]
    pub fn properties(&self) -> Option<&IndexMap<String, Schema>> {
        match self {
            Self::Object { properties } => Some(properties),
            _ => None,
        }
    }

    /// Returns true when an absent value passes this schema.
    #[must_use]
    pub fn accepts_absent(&self) -> bool {
        matches!(self, Self::Optional { .. } | Self::Any)
    }

    /// Validates `value` without coercion and returns the normalized value.
    pub fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        self.run(value, Mode::Strict)
    }

    /// Validates string-typed input (query strings, cookies), coercing where
    /// the schema asks for numbers, booleans, scalars or lists.
    pub fn parse_coerced(&self, value: &Value) -> Result<Value, ValidationError> {
        self.run(value, Mode::Coerce)
    }

    /// Validates `value` without coercion, discarding the normalized value.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.parse(value).map(drop)
    }

    fn run(&self, value: &Value, mode: Mode) -> Result<Value, ValidationError> {
        let mut issues = Vec::new();
        let parsed = self.check(Some(value), "$", mode, &mut issues);
        if issues.is_empty() {
            Ok(parsed.unwrap_or(Value::Null))
        } else {
            Err(ValidationError { issues })
        }
    }

    // `None` in and out means "absent": an optional field that should be omitted.
    fn check(
        &self,
        value: Option<&Value>,
        path: &str,
        mode: Mode,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Value> {
        match self {
            Self::Optional { inner } => {
                return match value {
                    None | Some(Value::Null) => None,
                    Some(present) => inner.check(Some(present), path, mode, issues),
                };
            }
            Self::Any => return value.cloned(),
            _ => {}
        }

        let Some(mut value) = value else {
            issues.push(ValidationIssue::new(path, "required value is missing"));
            return None;
        };

        // A repeated query key arrives as a list; a scalar schema keeps the last one.
        if mode == Mode::Coerce && !matches!(self, Self::Array { .. } | Self::OneOf { .. }) {
            if let Value::Array(items) = value {
                match items.last() {
                    Some(last) => value = last,
                    None => {
                        issues.push(ValidationIssue::new(path, "required value is missing"));
                        return None;
                    }
                }
            }
        }

        match self {
            Self::String {
                min_length,
                max_length,
            } => {
                let s = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(_) | Value::Bool(_) if mode == Mode::Coerce => value.to_string(),
                    other => {
                        issues.push(type_issue(path, "string", other));
                        return None;
                    }
                };
                let len = s.chars().count();
                if let Some(min) = min_length {
                    if len < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("string length {len} is less than minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = max_length {
                    if len > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("string length {len} is greater than maximum {max}"),
                        ));
                    }
                }
                Some(Value::String(s))
            }

            Self::Integer { minimum, maximum } => {
                let parsed = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) if mode == Mode::Coerce => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                let Some(n) = parsed else {
                    issues.push(type_issue(path, "integer", value));
                    return None;
                };
                if let Some(min) = minimum {
                    if n < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("value {} is less than minimum {}", n, min),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("value {} is greater than maximum {}", n, max),
                        ));
                    }
                }
                Some(Value::from(n))
            }

            Self::Number { minimum, maximum } => {
                let parsed = match value {
                    Value::Number(n) => Some(n.clone()),
                    Value::String(s) if mode == Mode::Coerce => s
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64),
                    _ => None,
                };
                let Some(number) = parsed else {
                    issues.push(type_issue(path, "number", value));
                    return None;
                };
                let n = number.as_f64().unwrap_or(f64::NAN);
                if let Some(min) = minimum {
                    if n < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("value {} is less than minimum {}", n, min),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if n > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("value {} is greater than maximum {}", n, max),
                        ));
                    }
                }
                Some(Value::Number(number))
            }

            Self::Boolean => {
                let parsed = match value {
                    Value::Bool(b) => Some(*b),
                    Value::String(s) if mode == Mode::Coerce => match s.as_str() {
                        "true" | "1" => Some(true),
                        "false" | "0" => Some(false),
                        _ => None,
                    },
                    _ => None,
                };
                match parsed {
                    Some(b) => Some(Value::Bool(b)),
                    None => {
                        issues.push(type_issue(path, "boolean", value));
                        None
                    }
                }
            }

            Self::Literal { value: expected } => {
                let coerced_match = mode == Mode::Coerce
                    && !expected.is_string()
                    && value.as_str() == Some(expected.to_string().as_str());
                if value == expected || coerced_match {
                    Some(expected.clone())
                } else {
                    issues.push(ValidationIssue::new(
                        path,
                        format!("expected literal {}, got {}", expected, value),
                    ));
                    None
                }
            }

            Self::Array {
                items,
                min_items,
                max_items,
            } => {
                let wrapped;
                let elements: &[Value] = match value {
                    Value::Array(elements) => elements,
                    scalar if mode == Mode::Coerce => {
                        wrapped = [scalar.clone()];
                        &wrapped
                    }
                    other => {
                        issues.push(type_issue(path, "array", other));
                        return None;
                    }
                };
                if let Some(min) = min_items {
                    if elements.len() < *min {
                        issues.push(ValidationIssue::new(
                            path,
                            format!("array length {} is less than minimum {}", elements.len(), min),
                        ));
                    }
                }
                if let Some(max) = max_items {
                    if elements.len() > *max {
                        issues.push(ValidationIssue::new(
                            path,
                            format!(
                                "array length {} is greater than maximum {}",
                                elements.len(),
                                max
                            ),
                        ));
                    }
                }
                let parsed = elements
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        items
                            .check(Some(item), &format!("{}[{}]", path, idx), mode, issues)
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                Some(Value::Array(parsed))
            }

            Self::Object { properties } => {
                let Some(object) = value.as_object() else {
                    issues.push(type_issue(path, "object", value));
                    return None;
                };
                let mut parsed = Map::new();
                for (key, schema) in properties {
                    let field_path = format!("{}.{}", path, key);
                    let field = object.get(key);
                    if field.is_none() && !schema.accepts_absent() {
                        issues.push(ValidationIssue::new(
                            field_path,
                            format!("missing required property '{}'", key),
                        ));
                        continue;
                    }
                    if let Some(v) = schema.check(field, &field_path, mode, issues) {
                        parsed.insert(key.clone(), v);
                    }
                }
                Some(Value::Object(parsed))
            }

            Self::OneOf { variants } => {
                for variant in variants {
                    let mut scratch = Vec::new();
                    let parsed = variant.check(Some(value), path, mode, &mut scratch);
                    if scratch.is_empty() {
                        return parsed;
                    }
                }
                issues.push(ValidationIssue::new(
                    path,
                    format!("{} does not match any variant", value_type_name(value)),
                ));
                None
            }

            Self::Optional { .. } | Self::Any => unreachable!("handled above"),
        }
    }
}

fn type_issue(path: &str, expected: &str, got: &Value) -> ValidationIssue {
    ValidationIssue::new(
        path,
        format!("expected {}, got {}", expected, value_type_name(got)),
    )
}

/// Returns a human-readable name for a JSON value type.
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON path of the failing value, rooted at `$`.
    pub path: String,
    /// What went wrong.
    pub message: String,
}

impl ValidationIssue {
    /// Creates a new issue.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error at '{}': {}", self.path, self.message)
    }
}

/// Every issue found while parsing a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Creates an error with a single issue.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue::new(path, message)],
        }
    }

    /// Returns the issues in the order they were found.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
