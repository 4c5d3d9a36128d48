//! Sentinel error types.
//!
//! Per-call failures are [`RequestError`] (client fault, 4xx) and
//! [`ResponseError`] (handler fault, always 500). Both carry the
//! [`Violations`] found. Start-up failures are [`LoadError`].

use std::fmt;
use std::path::PathBuf;

use http::StatusCode;
use kanon_core::{BuildError, ConversionError};
use kanon_router::RouteError;
use serde_json::Value;
use thiserror::Error;

/// What kind of rule a value broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required parameter is absent.
    MissingRequiredParameter,
    /// A parameter is present but cannot be decoded for its schema.
    InvalidParameterValue,
    /// An object lacks a required property.
    MissingRequiredProperty,
    /// An object carries a property its schema forbids.
    UnexpectedProperty,
    /// The JSON kind does not match the schema type.
    InvalidType,
    /// A string or number does not satisfy its `format`.
    InvalidFormat,
    /// The value is not one of the `enum` literals.
    NotInEnum,
    /// A numeric, length, pattern or item-count keyword failed.
    ConstraintViolation,
    /// The body cannot be parsed for its media type.
    MalformedBody,
    /// A required request body is empty.
    MissingRequiredBody,
    /// The `Content-Type` is not declared for the operation.
    UnsupportedMediaType,
    /// A required response header is absent.
    MissingRequiredHeader,
}

impl ErrorKind {
    /// Stable snake-case name, used as a metrics label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingRequiredParameter => "missing_required_parameter",
            Self::InvalidParameterValue => "invalid_parameter_value",
            Self::MissingRequiredProperty => "missing_required_property",
            Self::UnexpectedProperty => "unexpected_property",
            Self::InvalidType => "invalid_type",
            Self::InvalidFormat => "invalid_format",
            Self::NotInEnum => "not_in_enum",
            Self::ConstraintViolation => "constraint_violation",
            Self::MalformedBody => "malformed_body",
            Self::MissingRequiredBody => "missing_required_body",
            Self::UnsupportedMediaType => "unsupported_media_type",
            Self::MissingRequiredHeader => "missing_required_header",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// What rule was broken.
    pub kind: ErrorKind,
    /// RFC 6901 pointer to the offending value (`/status`, `/query/baz`).
    /// The empty string points at the whole body.
    pub location: String,
    /// Human-readable description.
    pub message: String,
    /// The violated schema fragment, rendered as JSON.
    pub schema: Option<Value>,
}

impl ValidationError {
    /// Creates a violation without a schema fragment.
    pub fn new(kind: ErrorKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
            message: message.into(),
            schema: None,
        }
    }

    /// Attaches the violated schema fragment.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A non-empty, ordered list of violations.
///
/// Fail-fast validation yields exactly one entry; multi-error validation
/// yields every violation in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct Violations(Vec<ValidationError>);

impl Violations {
    /// Wraps a list. Returns `None` for an empty list.
    #[must_use]
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        (!errors.is_empty()).then_some(Self(errors))
    }

    /// The first violation found.
    #[must_use]
    pub fn first(&self) -> &ValidationError {
        &self.0[0]
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates in traversal order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Returns the underlying list.
    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl IntoIterator for Violations {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A request does not satisfy the contract. The client is at fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// The request does not resolve to an operation.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The request resolved but its parameters or body are invalid.
    #[error("invalid request for {operation}:\n{violations}")]
    Invalid {
        /// Operation key (`operationId` or `METHOD /template`).
        operation: String,
        /// What was wrong.
        violations: Violations,
    },
}

impl RequestError {
    /// HTTP status a server should answer with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Route(RouteError::RouteNotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Route(RouteError::MethodNotAllowed { .. }) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Invalid { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// The violations, if the request resolved.
    #[must_use]
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Route(_) => None,
            Self::Invalid { violations, .. } => Some(violations),
        }
    }
}

/// A response does not satisfy the contract. The handler is at fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseError {
    /// The originating request does not resolve to an operation.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The response body, headers or media type are invalid.
    #[error("invalid {status} response from {operation}:\n{violations}")]
    Invalid {
        /// Operation key (`operationId` or `METHOD /template`).
        operation: String,
        /// Status the handler produced.
        status: StatusCode,
        /// What was wrong.
        violations: Violations,
    },
}

impl ResponseError {
    /// Always `500 Internal Server Error`.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// The violations, if the request resolved.
    #[must_use]
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Route(_) => None,
            Self::Invalid { violations, .. } => Some(violations),
        }
    }
}

/// A contract document could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The URL could not be fetched.
    #[error("failed to fetch {url}")]
    Http {
        /// Requested URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The URL answered with a non-success status.
    #[error("fetching {url} returned {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Returned status.
        status: StatusCode,
    },

    /// The document is not valid JSON for its dialect.
    #[error("failed to parse JSON document {location}")]
    Json {
        /// File path or URL.
        location: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The document is not valid YAML for its dialect.
    #[error("failed to parse YAML document {location}")]
    Yaml {
        /// File path or URL.
        location: String,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The file extension is not `json`, `yaml` or `yml`.
    #[error("cannot tell the format of {location}: expected a .json, .yaml or .yml extension")]
    UnknownFormat {
        /// File path.
        location: String,
    },

    /// Neither a `swagger` nor an `openapi` root key was found.
    #[error("{location} declares neither 'swagger' nor 'openapi'")]
    UnknownDialect {
        /// File path or URL.
        location: String,
    },

    /// A legacy document could not be converted.
    #[error("failed to convert {location}")]
    Conversion {
        /// File path or URL.
        location: String,
        /// Underlying error.
        #[source]
        source: ConversionError,
    },

    /// The canonical document is structurally invalid.
    #[error("invalid document {location}")]
    Build {
        /// File path or URL.
        location: String,
        /// Underlying error.
        #[source]
        source: BuildError,
    },

    /// The configuration names no contract location.
    #[error("no contract location configured")]
    MissingLocation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::error::Error as _;

    fn violation(location: &str) -> ValidationError {
        ValidationError::new(ErrorKind::InvalidType, location, "expected integer, got string")
    }

    #[test]
    fn test_validation_error_display() {
        assert_eq!(
            violation("/status").to_string(),
            "/status: expected integer, got string"
        );
        assert_eq!(
            violation("").to_string(),
            "(root): expected integer, got string"
        );
    }

    #[test]
    fn test_violations_display_is_line_per_error() {
        let violations = Violations::from_vec(vec![violation("/a"), violation("/b")]).unwrap();
        assert_eq!(
            violations.to_string(),
            "/a: expected integer, got string\n/b: expected integer, got string"
        );
        assert_eq!(violations.first().location, "/a");
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_violations_reject_empty() {
        assert!(Violations::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_request_error_status_codes() {
        let not_found = RequestError::from(RouteError::RouteNotFound {
            method: Method::GET,
            path: "/unknown".to_string(),
        });
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert!(not_found.violations().is_none());

        let not_allowed = RequestError::from(RouteError::MethodNotAllowed {
            method: Method::DELETE,
            path: "/foo/1".to_string(),
            template: "/foo/{bar}".to_string(),
            allowed: vec![Method::POST],
        });
        assert_eq!(not_allowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);

        let invalid = RequestError::Invalid {
            operation: "POST /foo/{bar}".to_string(),
            violations: Violations::from_vec(vec![violation("/query/baz")]).unwrap(),
        };
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert!(invalid.to_string().contains("/query/baz"));
    }

    #[test]
    fn test_response_error_is_always_500() {
        let err = ResponseError::Invalid {
            operation: "getPet".to_string(),
            status: StatusCode::OK,
            violations: Violations::from_vec(vec![violation("/id")]).unwrap(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("invalid 200 OK response from getPet"));

        let err = ResponseError::from(RouteError::RouteNotFound {
            method: Method::GET,
            path: "/".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_load_error_keeps_source() {
        let err = LoadError::Conversion {
            location: "swagger.yaml".to_string(),
            source: ConversionError::UnsupportedVersion("1.2".to_string()),
        };
        assert_eq!(err.to_string(), "failed to convert swagger.yaml");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_kind_labels() {
        assert_eq!(ErrorKind::NotInEnum.as_str(), "not_in_enum");
        assert_eq!(ErrorKind::MissingRequiredHeader.to_string(), "missing_required_header");
    }
}
