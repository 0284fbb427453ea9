//! Directory name classification.
//!
//! | Directory  | Kind       | Template |
//! |------------|------------|----------|
//! | `users`    | static     | `users`  |
//! | `[id]`     | param      | `:id`    |
//! | `[...rest]`| catch-all  | `*rest`  |
//! | `(admin)`  | group      | omitted  |

use regex::Regex;
use signpost_core::ParamKind;
use std::sync::OnceLock;

/// What a directory contributes to the logical URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Literal path text.
    Static,
    /// One dynamic segment.
    Param,
    /// Rest segment collecting the remaining path components.
    CatchAll,
    /// Organizational only.
    Group,
}

/// A classified directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteSegment {
    /// Classification.
    pub kind: SegmentKind,
    /// Literal text for static segments, the captured name otherwise.
    pub value: String,
}

impl RouteSegment {
    /// Creates a static segment.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Static,
            value: value.into(),
        }
    }

    /// Classifies a directory name.
    ///
    /// Rules are checked in order: catch-all, param, group, static.
    ///
    /// ```rust
    /// use signpost_codegen::{RouteSegment, SegmentKind};
    ///
    /// assert_eq!(RouteSegment::classify("[...slug]").kind, SegmentKind::CatchAll);
    /// assert_eq!(RouteSegment::classify("[id]").value, "id");
    /// assert_eq!(RouteSegment::classify("(marketing)").kind, SegmentKind::Group);
    /// assert_eq!(RouteSegment::classify("users").kind, SegmentKind::Static);
    /// ```
    pub fn classify(name: &str) -> Self {
        let (kind, value) = if let Some(name) = capture(catch_all_regex(), name) {
            (SegmentKind::CatchAll, name)
        } else if let Some(name) = capture(param_regex(), name) {
            (SegmentKind::Param, name)
        } else if let Some(name) = capture(group_regex(), name) {
            (SegmentKind::Group, name)
        } else {
            (SegmentKind::Static, name.to_string())
        };
        Self { kind, value }
    }

    /// Parameter kind for param and catch-all segments.
    pub fn param_kind(&self) -> Option<ParamKind> {
        match self.kind {
            SegmentKind::Param => Some(ParamKind::Single),
            SegmentKind::CatchAll => Some(ParamKind::CatchAll),
            SegmentKind::Static | SegmentKind::Group => None,
        }
    }

    /// Template text, or `None` for a group.
    pub fn template_part(&self) -> Option<String> {
        match self.kind {
            SegmentKind::Static => Some(self.value.clone()),
            SegmentKind::Param => Some(format!(":{}", self.value)),
            SegmentKind::CatchAll => Some(format!("*{}", self.value)),
            SegmentKind::Group => None,
        }
    }
}

fn capture(regex: &Regex, name: &str) -> Option<String> {
    regex
        .captures(name)
        .map(|caps| caps.get(1).map_or_else(String::new, |m| m.as_str().to_string()))
}

fn catch_all_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\.\.\.(.*)\]").expect("valid regex"))
}

// Checked after the catch-all rule, so a `[...name]` never reaches it.
fn param_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(.*)\]").expect("valid regex"))
}

fn group_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((.*)\)").expect("valid regex"))
}
