//! Template errors.

use thiserror::Error;

/// Errors from parsing a template or building a path from one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `:` or `*` segment had no name.
    #[error("empty parameter name in template '{template}'")]
    EmptyName {
        /// The offending template.
        template: String,
    },

    /// A parameter name appears twice.
    #[error("duplicate parameter '{name}' in template '{template}'")]
    DuplicateParam {
        /// The offending template.
        template: String,
        /// Repeated name.
        name: String,
    },

    /// More than one catch-all segment.
    #[error("template '{template}' has more than one catch-all segment")]
    MultipleCatchAll {
        /// The offending template.
        template: String,
    },

    /// A parameter required by the template was not supplied.
    #[error("missing route parameter '{name}'")]
    MissingParam {
        /// Parameter name.
        name: String,
    },

    /// A list was supplied for a single segment.
    #[error("route parameter '{name}' expects a single value")]
    WrongKind {
        /// Parameter name.
        name: String,
    },

    /// A catch-all was given an empty list.
    #[error("catch-all parameter '{name}' needs at least one value")]
    EmptyCatchAll {
        /// Parameter name.
        name: String,
    },
}

impl TemplateError {
    /// Creates an [`EmptyName`](Self::EmptyName) error.
    pub fn empty_name(template: impl Into<String>) -> Self {
        Self::EmptyName {
            template: template.into(),
        }
    }

    /// Creates a [`DuplicateParam`](Self::DuplicateParam) error.
    pub fn duplicate_param(template: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateParam {
            template: template.into(),
            name: name.into(),
        }
    }

    /// Creates a [`MultipleCatchAll`](Self::MultipleCatchAll) error.
    pub fn multiple_catch_all(template: impl Into<String>) -> Self {
        Self::MultipleCatchAll {
            template: template.into(),
        }
    }

    /// Creates a [`MissingParam`](Self::MissingParam) error.
    pub fn missing_param(name: impl Into<String>) -> Self {
        Self::MissingParam { name: name.into() }
    }

    /// Creates a [`WrongKind`](Self::WrongKind) error.
    pub fn wrong_kind(name: impl Into<String>) -> Self {
        Self::WrongKind { name: name.into() }
    }

    /// Creates an [`EmptyCatchAll`](Self::EmptyCatchAll) error.
    pub fn empty_catch_all(name: impl Into<String>) -> Self {
        Self::EmptyCatchAll { name: name.into() }
    }
}
