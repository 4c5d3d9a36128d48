//! Construction errors.
//!
//! Two failure families exist before any request is seen:
//!
//! - [`ConversionError`]: a legacy (version 2) document cannot be translated
//!   into the canonical model.
//! - [`BuildError`]: a canonical document is structurally invalid and no
//!   route table or validator can be built from it.
//!
//! Both are fatal at start-up. Per-request failures live in the validation
//! crate.

use http::Method;
use kanon_router::TemplateError;
use thiserror::Error;

use crate::schema::SchemaError;

/// Result type alias for document construction.
pub type BuildResult<T> = Result<T, BuildError>;

/// A legacy document cannot be converted.
///
/// Operation-scoped variants name the template and method they affect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The `swagger` field is not `2.0`.
    #[error("unsupported swagger version '{0}'")]
    UnsupportedVersion(String),

    /// A parameter uses a location the canonical model cannot express.
    #[error("{method} {path}: parameter '{name}' has unsupported location '{location}'")]
    UnsupportedLocation {
        /// Template of the affected path.
        path: String,
        /// Affected method.
        method: String,
        /// Parameter name.
        name: String,
        /// The location as written.
        location: String,
    },

    /// A parameter's type/format combination is malformed.
    #[error("{method} {path}: parameter '{name}' is malformed: {reason}")]
    MalformedParameter {
        /// Template of the affected path.
        path: String,
        /// Affected method.
        method: String,
        /// Parameter name.
        name: String,
        /// What is wrong.
        reason: String,
    },

    /// More than one `in: body` parameter.
    #[error("{method} {path}: more than one body parameter")]
    MultipleBodies {
        /// Template of the affected path.
        path: String,
        /// Affected method.
        method: String,
    },

    /// `in: body` and `in: formData` on the same operation.
    #[error("{method} {path}: body and formData parameters cannot be combined")]
    BodyAndFormData {
        /// Template of the affected path.
        path: String,
        /// Affected method.
        method: String,
    },

    /// A `$ref` to a parameter or response that does not exist.
    #[error("{method} {path}: dangling reference '{reference}'")]
    DanglingReference {
        /// Template of the affected path.
        path: String,
        /// Affected method.
        method: String,
        /// The reference as written.
        reference: String,
    },

    /// A response key is not a code, a range or `default`.
    #[error("{method} {path}: invalid status key '{key}'")]
    InvalidStatusKey {
        /// Template of the affected path.
        path: String,
        /// Affected method.
        method: String,
        /// The key as written.
        key: String,
    },

    /// A schema could not be mapped.
    #[error("{location}: {source}")]
    Schema {
        /// Where the schema appears.
        location: String,
        /// Underlying error.
        #[source]
        source: SchemaError,
    },
}

impl ConversionError {
    /// Creates a malformed-parameter error.
    pub fn malformed(
        path: impl Into<String>,
        method: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedParameter {
            path: path.into(),
            method: method.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a dangling-reference error.
    pub fn dangling(
        path: impl Into<String>,
        method: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self::DanglingReference {
            path: path.into(),
            method: method.into(),
            reference: reference.into(),
        }
    }

    /// Creates a schema-mapping error.
    pub fn schema(location: impl Into<String>, source: SchemaError) -> Self {
        Self::Schema {
            location: location.into(),
            source,
        }
    }
}

/// A canonical document is structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The document declares an `openapi` version this crate cannot read.
    #[error("unsupported openapi version '{0}'")]
    UnsupportedVersion(String),

    /// A path template does not compile.
    #[error("invalid path template: {0}")]
    InvalidTemplate(#[from] TemplateError),

    /// A path parameter names no placeholder of its template.
    #[error("{method} {path}: path parameter '{name}' has no matching placeholder")]
    PathParameterMismatch {
        /// Owning template.
        path: String,
        /// Owning method.
        method: Method,
        /// Parameter name.
        name: String,
    },

    /// A `$ref` names nothing in the registry.
    #[error("{location}: unresolved reference '{reference}'")]
    UnresolvedReference {
        /// Where the reference appears.
        location: String,
        /// The referenced name or pointer.
        reference: String,
    },

    /// A `pattern` keyword is not a valid regular expression.
    #[error("{location}: invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Where the schema appears.
        location: String,
        /// The pattern as written.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// Strict mode: a forbidden-additional object requires an undeclared name.
    #[error("{location}: required property '{name}' is not declared")]
    StrictRequired {
        /// Where the schema appears.
        location: String,
        /// The undeclared name.
        name: String,
    },

    /// A parameter's `in` is none of path, query, header, cookie.
    #[error("{location}: unknown parameter location '{found}'")]
    UnknownParameterLocation {
        /// Where the parameter appears.
        location: String,
        /// The location as written.
        found: String,
    },

    /// A response key is not a code, a range or `default`.
    #[error("{location}: invalid status key '{key}'")]
    InvalidStatusKey {
        /// Where the key appears.
        location: String,
        /// The key as written.
        key: String,
    },

    /// A schema could not be mapped.
    #[error("{location}: {source}")]
    Schema {
        /// Where the schema appears.
        location: String,
        /// Underlying error.
        #[source]
        source: SchemaError,
    },
}

impl BuildError {
    /// Creates an unresolved-reference error.
    pub fn unresolved(location: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            location: location.into(),
            reference: reference.into(),
        }
    }

    /// Creates an invalid-pattern error.
    pub fn invalid_pattern(
        location: impl Into<String>,
        pattern: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidPattern {
            location: location.into(),
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a schema-mapping error.
    pub fn schema(location: impl Into<String>, source: SchemaError) -> Self {
        Self::Schema {
            location: location.into(),
            source,
        }
    }
}
