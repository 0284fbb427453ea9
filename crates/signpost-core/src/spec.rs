//! Declared route requirements.
//!
//! A [`RouteSpec`] records what a route needs from a request: the names and
//! kinds of its path parameters, the query and cookie fields it reads and the
//! shape of its body. Specs are values; every `with_*` call and every
//! [`RouteSpec::merge`] returns a new spec and leaves the receiver untouched.
//!
//! # Merge rules
//!
//! | Part     | Rule                                                           |
//! |----------|----------------------------------------------------------------|
//! | params   | same name must have the same kind                              |
//! | query    | field union; a shared field must have an identical schema      |
//! | cookies  | field union; a shared field must have an identical schema      |
//! | body     | `Ignore` is the identity, object + object is a field union,    |
//! |          | anything else must be identical                                |
//!
//! Because every rule is a union guarded by equality, merging is associative.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BuildError, SpecSection};
use crate::schema::Schema;

/// Field name to schema, in declaration order.
pub type FieldShapes = IndexMap<String, Schema>;

/// Kind of a route parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// Single dynamic segment, arrives as a string.
    #[serde(rename = "string")]
    Single,
    /// Catch-all segment, arrives as a list of strings.
    #[serde(rename = "array")]
    CatchAll,
}

impl ParamKind {
    /// Returns `"string"` or `"array"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "string",
            Self::CatchAll => "array",
        }
    }
}

/// Declared body shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "shape", rename_all = "snake_case")]
pub enum BodyShape {
    /// No body is read.
    #[default]
    Ignore,
    /// An object body with these fields.
    Fields(FieldShapes),
    /// Any other schema (union, list, scalar).
    Other(Schema),
}

impl BodyShape {
    /// Normalizes a schema: object schemas become [`BodyShape::Fields`].
    #[must_use]
    pub fn from_schema(schema: Schema) -> Self {
        match schema {
            Schema::Object { properties } => Self::Fields(properties),
            other => Self::Other(other),
        }
    }

    /// Returns true when no body is declared.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignore)
    }

    /// Returns the schema the body is parsed with, if any.
    #[must_use]
    pub fn schema(&self) -> Option<Schema> {
        match self {
            Self::Ignore => None,
            Self::Fields(fields) => Some(Schema::Object {
                properties: fields.clone(),
            }),
            Self::Other(schema) => Some(schema.clone()),
        }
    }

    fn merge(&self, other: &Self) -> Result<Self, BuildError> {
        match (self, other) {
            (Self::Ignore, shape) | (shape, Self::Ignore) => Ok(shape.clone()),
            (Self::Fields(a), Self::Fields(b)) => {
                merge_fields(SpecSection::Body, a, b).map(Self::Fields)
            }
            (a, b) if a == b => Ok(a.clone()),
            _ => Err(BuildError::BodyConflict),
        }
    }
}

/// Requirements declared for one route.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteSpec {
    params: IndexMap<String, ParamKind>,
    query: FieldShapes,
    cookies: FieldShapes,
    body: BodyShape,
}

impl RouteSpec {
    /// Creates an empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared route parameters.
    #[must_use]
    pub fn params(&self) -> &IndexMap<String, ParamKind> {
        &self.params
    }

    /// Declared query fields.
    #[must_use]
    pub fn query(&self) -> &FieldShapes {
        &self.query
    }

    /// Declared cookie fields.
    #[must_use]
    pub fn cookies(&self) -> &FieldShapes {
        &self.cookies
    }

    /// Declared body shape.
    #[must_use]
    pub fn body(&self) -> &BodyShape {
        &self.body
    }

    /// Adds single-segment parameters.
    pub fn with_params<I, S>(&self, names: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        for name in names {
            insert_param(&mut next.params, name.into(), ParamKind::Single)?;
        }
        Ok(next)
    }

    /// Adds a catch-all parameter.
    pub fn with_catch_all(&self, name: impl Into<String>) -> Result<Self, BuildError> {
        let mut next = self.clone();
        insert_param(&mut next.params, name.into(), ParamKind::CatchAll)?;
        Ok(next)
    }

    /// Merges an object schema into the query shape.
    pub fn with_query(&self, schema: Schema) -> Result<Self, BuildError> {
        let fields = object_fields(SpecSection::Query, schema)?;
        Ok(Self {
            query: merge_fields(SpecSection::Query, &self.query, &fields)?,
            ..self.clone()
        })
    }

    /// Merges an object schema into the cookie shape.
    pub fn with_cookies(&self, schema: Schema) -> Result<Self, BuildError> {
        let fields = object_fields(SpecSection::Cookies, schema)?;
        Ok(Self {
            cookies: merge_fields(SpecSection::Cookies, &self.cookies, &fields)?,
            ..self.clone()
        })
    }

    /// Merges a schema into the body shape.
    pub fn with_body(&self, schema: Schema) -> Result<Self, BuildError> {
        Ok(Self {
            body: self.body.merge(&BodyShape::from_schema(schema))?,
            ..self.clone()
        })
    }

    /// Merges two specs. Fails on any conflicting declaration.
    pub fn merge(&self, other: &RouteSpec) -> Result<Self, BuildError> {
        let mut params = self.params.clone();
        for (name, kind) in &other.params {
            insert_param(&mut params, name.clone(), *kind)?;
        }
        Ok(Self {
            params,
            query: merge_fields(SpecSection::Query, &self.query, &other.query)?,
            cookies: merge_fields(SpecSection::Cookies, &self.cookies, &other.cookies)?,
            body: self.body.merge(&other.body)?,
        })
    }

    /// Query fields as an object schema, or `None` when nothing is declared.
    #[must_use]
    pub fn query_schema(&self) -> Option<Schema> {
        fields_schema(&self.query)
    }

    /// Cookie fields as an object schema, or `None` when nothing is declared.
    #[must_use]
    pub fn cookie_schema(&self) -> Option<Schema> {
        fields_schema(&self.cookies)
    }
}

fn fields_schema(fields: &FieldShapes) -> Option<Schema> {
    (!fields.is_empty()).then(|| Schema::Object {
        properties: fields.clone(),
    })
}

fn insert_param(
    params: &mut IndexMap<String, ParamKind>,
    name: String,
    kind: ParamKind,
) -> Result<(), BuildError> {
    match params.get(&name) {
        Some(existing) if *existing != kind => Err(BuildError::ParamConflict { name }),
        Some(_) => Ok(()),
        None => {
            params.insert(name, kind);
            Ok(())
        }
    }
}

fn object_fields(section: SpecSection, schema: Schema) -> Result<FieldShapes, BuildError> {
    match schema {
        Schema::Object { properties } => Ok(properties),
        _ => Err(BuildError::NotAnObject { section }),
    }
}

fn merge_fields(
    section: SpecSection,
    base: &FieldShapes,
    addition: &FieldShapes,
) -> Result<FieldShapes, BuildError> {
    let mut merged = base.clone();
    for (field, schema) in addition {
        match merged.get(field) {
            Some(existing) if existing != schema => {
                return Err(BuildError::FieldConflict {
                    section,
                    field: field.clone(),
                });
            }
            Some(_) => {}
            None => {
                merged.insert(field.clone(), schema.clone());
            }
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn query(fields: &[(&str, Schema)]) -> RouteSpec {
        RouteSpec::new()
            .with_query(Schema::object(fields.iter().cloned()))
            .unwrap()
    }

    #[test]
    fn test_identical_fields_merge() {
        let a = query(&[("q", Schema::string())]);
        let b = query(&[("q", Schema::string()), ("page", Schema::integer())]);
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.query().len(), 2);
        assert_eq!(merged.query().get_index(0).unwrap().0, "q");
    }

    #[test]
    fn test_conflicting_fields_are_rejected() {
        let a = query(&[("q", Schema::string())]);
        let b = query(&[("q", Schema::integer())]);
        let err = a.merge(&b).unwrap_err();
        assert_eq!(
            err,
            BuildError::FieldConflict {
                section: SpecSection::Query,
                field: "q".to_string()
            }
        );
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn test_with_query_requires_object() {
        let err = RouteSpec::new().with_query(Schema::string()).unwrap_err();
        assert_eq!(
            err,
            BuildError::NotAnObject {
                section: SpecSection::Query
            }
        );
    }

    #[test]
    fn test_params_must_agree_on_kind() {
        let spec = RouteSpec::new().with_params(["id"]).unwrap();
        assert!(spec.with_params(["id"]).is_ok());
        let err = spec.with_catch_all("id").unwrap_err();
        assert_eq!(err, BuildError::ParamConflict { name: "id".into() });
    }

    #[test]
    fn test_body_ignore_is_identity() {
        let body = RouteSpec::new()
            .with_body(Schema::object([("foo", Schema::literal("bar"))]))
            .unwrap();
        assert_eq!(RouteSpec::new().merge(&body).unwrap(), body);
        assert_eq!(body.merge(&RouteSpec::new()).unwrap(), body);
    }

    #[test]
    fn test_body_objects_merge_fields() {
        let spec = RouteSpec::new()
            .with_body(Schema::object([("a", Schema::string())]))
            .unwrap()
            .with_body(Schema::object([("b", Schema::integer())]))
            .unwrap();
        match spec.body() {
            BodyShape::Fields(fields) => {
                assert_eq!(fields.keys().collect::<Vec<_>>(), ["a", "b"]);
            }
            other => panic!("unexpected body shape: {other:?}"),
        }
    }

    #[test]
    fn test_body_non_object_shapes_must_be_identical() {
        let union = Schema::one_of([Schema::string(), Schema::integer()]);
        let spec = RouteSpec::new().with_body(union.clone()).unwrap();
        assert!(spec.with_body(union).is_ok());
        assert_eq!(
            spec.with_body(Schema::object([("a", Schema::string())]))
                .unwrap_err(),
            BuildError::BodyConflict
        );
    }

    #[test]
    fn test_with_calls_do_not_mutate_receiver() {
        let base = RouteSpec::new();
        let _ = base.with_params(["id"]).unwrap();
        assert!(base.params().is_empty());
    }

    #[test]
    fn test_param_kind_serializes_as_string_or_array() {
        let spec = RouteSpec::new()
            .with_params(["id"])
            .unwrap()
            .with_catch_all("rest")
            .unwrap();
        let json = serde_json::to_value(spec.params()).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "string", "rest": "array" }));
    }

    fn field_schema() -> impl Strategy<Value = Schema> {
        prop_oneof![
            Just(Schema::string()),
            Just(Schema::integer()),
            Just(Schema::boolean()),
        ]
    }

    fn spec_strategy() -> impl Strategy<Value = RouteSpec> {
        proptest::collection::vec((prop::sample::select(vec!["a", "b", "c", "d"]), field_schema()), 0..4)
            .prop_map(|fields| {
                let mut spec = RouteSpec::new();
                for (name, schema) in fields {
                    if let Ok(next) = spec.with_query(Schema::object([(name, schema)])) {
                        spec = next;
                    }
                }
                spec
            })
    }

    proptest! {
        #[test]
        fn prop_merge_is_associative(a in spec_strategy(), b in spec_strategy(), c in spec_strategy()) {
            let left = a.merge(&b).and_then(|ab| ab.merge(&c));
            let right = b.merge(&c).and_then(|bc| a.merge(&bc));
            match (left, right) {
                (Ok(l), Ok(r)) => prop_assert_eq!(l, r),
                (Err(_), Err(_)) => {}
                (l, r) => prop_assert!(false, "associativity broken: {:?} vs {:?}", l, r),
            }
        }
    }
}
