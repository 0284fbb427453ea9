//! Route templates.
//!
//! A template is a `/`-separated path where `:name` marks a single dynamic
//! segment and `*name` marks a catch-all that spans one or more segments.
//! At most one catch-all is allowed, in any position.

use std::fmt;
use std::str::FromStr;

use crate::error::TemplateError;
use crate::params::{ParamValue, RouteParams};

/// One segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Literal text.
    Static(String),
    /// `:name`
    Param(String),
    /// `*name`
    CatchAll(String),
}

impl Segment {
    /// Returns the parameter name for dynamic segments.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Static(_) => None,
            Self::Param(name) | Self::CatchAll(name) => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(text) => f.write_str(text),
            Self::Param(name) => write!(f, ":{name}"),
            Self::CatchAll(name) => write!(f, "*{name}"),
        }
    }
}

/// A parsed route template such as `/repos/:owner/*path`.
///
/// # Example
///
/// ```rust
/// use signpost_router::{RouteParams, RouteTemplate};
///
/// let template: RouteTemplate = "/:a/*b".parse().unwrap();
/// let params = RouteParams::new().with("a", "x").with("b", ["y", "z"]);
///
/// let path = template.build(&params).unwrap();
/// assert_eq!(path, "/x/y/z");
/// assert_eq!(template.matches(&path), Some(params));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty parameter name, a repeated parameter
    /// name, or more than one catch-all.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut seen_catch_all = false;

        for part in template.split('/').filter(|s| !s.is_empty()) {
            let segment = if let Some(name) = part.strip_prefix(':') {
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix('*') {
                if seen_catch_all {
                    return Err(TemplateError::multiple_catch_all(template));
                }
                seen_catch_all = true;
                Segment::CatchAll(name.to_string())
            } else {
                Segment::Static(part.to_string())
            };

            if let Some(name) = segment.param_name() {
                if name.is_empty() {
                    return Err(TemplateError::empty_name(template));
                }
                if segments
                    .iter()
                    .any(|s: &Segment| s.param_name() == Some(name))
                {
                    return Err(TemplateError::duplicate_param(template, name));
                }
            }
            segments.push(segment);
        }

        let raw = if segments.is_empty() {
            "/".to_string()
        } else {
            segments.iter().map(|s| format!("/{s}")).collect()
        };

        Ok(Self { raw, segments })
    }

    /// Returns the normalized template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns parameter names in path order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Returns true if the template has a catch-all segment.
    #[must_use]
    pub fn has_catch_all(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::CatchAll(_)))
    }

    /// Builds a concrete path by substituting parameters.
    ///
    /// Values are percent-encoded per segment. A catch-all list is joined
    /// with `/`. A single string supplied for a catch-all is treated as a
    /// one-element list.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is missing, a list is given for a
    /// single segment, or a catch-all list is empty.
    pub fn build(&self, params: &RouteParams) -> Result<String, TemplateError> {
        if self.segments.is_empty() {
            return Ok("/".to_string());
        }

        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Static(text) => {
                    path.push('/');
                    path.push_str(text);
                }
                Segment::Param(name) => match params.get(name) {
                    Some(ParamValue::One(value)) => {
                        path.push('/');
                        path.push_str(&urlencoding::encode(value));
                    }
                    Some(ParamValue::Many(_)) => {
                        return Err(TemplateError::wrong_kind(name));
                    }
                    None => return Err(TemplateError::missing_param(name)),
                },
                Segment::CatchAll(name) => match params.get(name) {
                    Some(ParamValue::One(value)) => {
                        path.push('/');
                        path.push_str(&urlencoding::encode(value));
                    }
                    Some(ParamValue::Many(values)) if values.is_empty() => {
                        return Err(TemplateError::empty_catch_all(name));
                    }
                    Some(ParamValue::Many(values)) => {
                        for value in values {
                            path.push('/');
                            path.push_str(&urlencoding::encode(value));
                        }
                    }
                    None => return Err(TemplateError::missing_param(name)),
                },
            }
        }
        Ok(path)
    }

    /// Matches a concrete path, returning decoded parameters on success.
    ///
    /// A catch-all absorbs however many segments remain once the fixed
    /// segments around it are accounted for, and always at least one.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = path
            .split('?')
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let fixed = self.segments.len() - usize::from(self.has_catch_all());
        let span = if self.has_catch_all() {
            parts.len().checked_sub(fixed).filter(|n| *n >= 1)?
        } else if parts.len() == fixed {
            0
        } else {
            return None;
        };

        let mut params = RouteParams::with_capacity(self.segments.len());
        let mut index = 0;
        for segment in &self.segments {
            match segment {
                Segment::Static(text) => {
                    if parts[index] != text.as_str() {
                        return None;
                    }
                    index += 1;
                }
                Segment::Param(name) => {
                    params.push(name.as_str(), decode(parts[index]));
                    index += 1;
                }
                Segment::CatchAll(name) => {
                    let values: Vec<String> =
                        parts[index..index + span].iter().map(|p| decode(p)).collect();
                    params.push(name.as_str(), values);
                    index += span;
                }
            }
        }
        Some(params)
    }
}

/// Percent-decodes a path segment, falling back to the raw text.
pub(crate) fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

impl FromStr for RouteTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parses `template` and builds a path from `params` in one step.
///
/// # Errors
///
/// See [`RouteTemplate::parse`] and [`RouteTemplate::build`].
pub fn build_path(template: &str, params: &RouteParams) -> Result<String, TemplateError> {
    RouteTemplate::parse(template)?.build(params)
}
