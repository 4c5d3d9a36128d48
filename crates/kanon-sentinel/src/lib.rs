//! Kanon Sentinel - contract validation for HTTP exchanges
//!
//! This crate checks requests and responses against an OpenAPI contract:
//! it resolves each request to the operation that declares it, validates
//! parameters and bodies against the operation's schemas, and reports
//! violations with JSON-pointer locations.
//!
//! # Overview
//!
//! - [`DocumentLoader`] reads a contract (legacy or canonical, JSON or YAML)
//!   from a file or URL
//! - [`Sentinel`] compiles it once: route table, reference and pattern checks
//! - [`RequestValidator`] / [`ResponseValidator`] are cheap clones sharing
//!   that state, usable from any number of threads
//!
//! # Architecture
//!
//! ```text
//!                      ┌────────────────────────────┐
//!                      │  file / URL (v2 or v3)     │
//!                      └──────────┬─────────────────┘
//!                                 │ load + convert
//!                      ┌──────────▼─────────────────┐
//!                      │   Document                 │
//!                      └──────────┬─────────────────┘
//!                                 │ compile
//!      HTTP Request    ┌──────────▼─────────────────┐
//!          │           │   OperationResolver        │
//!          ▼           │   (method + path → op)     │
//!   RequestValidator ──┤                            │
//!   ResponseValidator ─┤   SchemaValidator          │
//!                      └────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use http::{Method, Request, StatusCode};
//! use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
//! use kanon_core::fixtures;
//! use kanon_sentinel::{ErrorKind, Sentinel, ValidationConfig};
//!
//! let sentinel = Sentinel::new(fixtures::foo_document(), ValidationConfig::default())?;
//! let (requests, responses) = sentinel.validators();
//!
//! let request = Request::builder()
//!     .method(Method::POST)
//!     .uri("/foo/100?baz=j@example.com")
//!     .header(CONTENT_TYPE, "application/json")
//!     .body(())
//!     .unwrap();
//! assert!(requests.validate(&request, br#"{"john": false, "betty": "Flinstone"}"#).is_ok());
//!
//! let mut headers = HeaderMap::new();
//! headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
//! let err = responses
//!     .validate(StatusCode::OK, br#"{"status": "string"}"#, &headers, &request)
//!     .unwrap_err();
//! assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
//! assert_eq!(err.violations().unwrap().first().kind, ErrorKind::InvalidType);
//! # Ok::<(), kanon_core::BuildError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod body;
pub mod config;
pub mod error;
mod format;
pub mod loader;
mod params;
pub mod resolver;
pub mod validation;

use std::ops::ControlFlow;
use std::sync::Arc;

use http::{HeaderMap, Method, Request, StatusCode};
use kanon_config::KanonConfig;
use kanon_core::{BuildError, Document, Operation, Response};
use kanon_router::RouteError;
use kanon_telemetry::{record_validation, record_violation, Outcome, Side};
use tracing::{debug, info, warn};

pub use config::ValidationConfig;
pub use error::{ErrorKind, LoadError, RequestError, ResponseError, ValidationError, Violations};
pub use loader::{Dialect, DocumentLoader};
pub use resolver::{OperationResolution, OperationResolver};
pub use validation::{Mode, SchemaValidator};

use crate::params::RequestParts;
use crate::validation::Collector;

#[derive(Debug)]
struct Inner {
    document: Document,
    resolver: OperationResolver,
    validator: SchemaValidator,
    config: ValidationConfig,
}

/// A compiled contract.
///
/// Construction performs every document check once; afterwards the
/// contract is immutable and shared by the validators it hands out.
#[derive(Debug, Clone)]
pub struct Sentinel {
    inner: Arc<Inner>,
}

impl Sentinel {
    /// Compiles `document`.
    ///
    /// Fails on invalid templates, path parameters without a placeholder,
    /// unresolved references, invalid patterns and, in strict mode, closed
    /// objects requiring undeclared properties.
    pub fn new(document: Document, config: ValidationConfig) -> Result<Self, BuildError> {
        let resolver = OperationResolver::new(&document)?;
        let mut validator = SchemaValidator::new(document.schemas().clone(), &config)?;

        for operation in document.operations() {
            prepare_operation(&mut validator, operation)?;
        }

        info!(
            title = document.title(),
            version = document.version(),
            operations = document.operations().count(),
            multi_error = config.multi_error,
            "contract compiled"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                document,
                resolver,
                validator,
                config,
            }),
        })
    }

    /// Loads, compiles and splits a contract in one step.
    pub async fn from_location(
        location: &str,
        dialect: Dialect,
        config: ValidationConfig,
    ) -> Result<(RequestValidator, ResponseValidator), LoadError> {
        let document = DocumentLoader::from_location(location, dialect).await?;
        let sentinel = Self::new(document, config).map_err(|source| LoadError::Build {
            location: location.to_string(),
            source,
        })?;
        Ok(sentinel.validators())
    }

    /// Like [`from_location`](Self::from_location), driven by a [`KanonConfig`].
    pub async fn from_config(
        config: &KanonConfig,
    ) -> Result<(RequestValidator, ResponseValidator), LoadError> {
        let location = config
            .contract
            .location
            .as_deref()
            .ok_or(LoadError::MissingLocation)?;
        Self::from_location(
            location,
            config.contract.dialect,
            ValidationConfig::from(&config.validation),
        )
        .await
    }

    /// The compiled document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// Active settings.
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.inner.config
    }

    /// Resolves a method and path to its operation.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<OperationResolution<'_>, RouteError> {
        self.inner
            .resolver
            .resolve(&self.inner.document, method, path)
    }

    /// Request and response validators sharing this contract.
    #[must_use]
    pub fn validators(&self) -> (RequestValidator, ResponseValidator) {
        (
            RequestValidator {
                inner: Arc::clone(&self.inner),
            },
            ResponseValidator {
                inner: Arc::clone(&self.inner),
            },
        )
    }
}

fn prepare_operation(validator: &mut SchemaValidator, operation: &Operation) -> Result<(), BuildError> {
    let key = format!("{} {}", operation.method, operation.path);

    for param in &operation.parameters {
        let location = format!("{key} {} parameter '{}'", param.location, param.name);
        validator.prepare(&param.schema, &location)?;
    }
    if let Some(body) = &operation.request_body {
        for (media, declared) in &body.content {
            if let Some(schema) = &declared.schema {
                validator.prepare(schema, &format!("{key} request body {media}"))?;
            }
        }
    }
    for (status, response) in &operation.responses {
        for (media, declared) in &response.content {
            if let Some(schema) = &declared.schema {
                validator.prepare(schema, &format!("{key} {status} response {media}"))?;
            }
        }
        for (name, header) in &response.headers {
            validator.prepare(&header.schema, &format!("{key} {status} response header {name}"))?;
        }
    }
    Ok(())
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
}

fn record(side: Side, violations: &Violations) {
    record_validation(side, Outcome::Invalid);
    for violation in violations {
        record_violation(side, violation.kind.as_str());
    }
}

/// Validates incoming requests.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    inner: Arc<Inner>,
}

impl RequestValidator {
    /// Checks a request and its raw body.
    ///
    /// Returns the first violation in fail-fast mode, or all of them.
    pub fn validate<B>(&self, request: &Request<B>, body: &[u8]) -> Result<(), RequestError> {
        let inner = &*self.inner;
        if !inner.config.validate_requests {
            record_validation(Side::Request, Outcome::Skipped);
            return Ok(());
        }

        let method = request.method();
        let path = request.uri().path();
        let resolution = match inner.resolver.resolve(&inner.document, method, path) {
            Ok(resolution) => resolution,
            Err(e) => {
                record_validation(Side::Request, Outcome::Unroutable);
                info!(http.method = %method, http.path = path, error = %e, "request not routable");
                return Err(e.into());
            }
        };
        let operation = resolution.operation;

        let parts = RequestParts::new(&resolution.path_params, request.uri().query(), request.headers());
        let mut out = Collector::new(inner.config.mode());
        let _ = check_request(inner, operation, &parts, content_type(request.headers()), body, &mut out);

        let operation_id = operation.key();
        match out.finish() {
            Ok(()) => {
                record_validation(Side::Request, Outcome::Valid);
                debug!(operation_id = %operation_id, http.method = %method, http.path = path, "request valid");
                Ok(())
            }
            Err(violations) => {
                record(Side::Request, &violations);
                info!(
                    operation_id = %operation_id,
                    http.method = %method,
                    http.path = path,
                    violations = violations.len(),
                    first = %violations.first(),
                    "request rejected"
                );
                Err(RequestError::Invalid {
                    operation: operation_id,
                    violations,
                })
            }
        }
    }
}

fn check_request(
    inner: &Inner,
    operation: &Operation,
    parts: &RequestParts<'_>,
    content_type: Option<&str>,
    body: &[u8],
    out: &mut Collector,
) -> ControlFlow<()> {
    params::check(&inner.validator, &operation.parameters, parts, out)?;

    let Some(declared) = &operation.request_body else {
        return ControlFlow::Continue(());
    };
    if body.is_empty() {
        if declared.required {
            out.report(ValidationError::new(
                ErrorKind::MissingRequiredBody,
                "",
                "request body is required",
            ))?;
        }
        return ControlFlow::Continue(());
    }
    body::check(&inner.validator, &declared.content, content_type, body, out)
}

/// Validates handler responses.
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    inner: Arc<Inner>,
}

impl ResponseValidator {
    /// Checks a response against the operation `request` resolves to.
    ///
    /// A status the operation does not declare (and no `default`) passes.
    pub fn validate<B>(
        &self,
        status: StatusCode,
        body: &[u8],
        headers: &HeaderMap,
        request: &Request<B>,
    ) -> Result<(), ResponseError> {
        let inner = &*self.inner;
        if !inner.config.validate_responses {
            record_validation(Side::Response, Outcome::Skipped);
            return Ok(());
        }

        let method = request.method();
        let path = request.uri().path();
        let resolution = match inner.resolver.resolve(&inner.document, method, path) {
            Ok(resolution) => resolution,
            Err(e) => {
                record_validation(Side::Response, Outcome::Unroutable);
                warn!(http.method = %method, http.path = path, error = %e, "response for unroutable request");
                return Err(e.into());
            }
        };
        let operation = resolution.operation;
        let operation_id = operation.key();

        let Some(declared) = operation.response_for(status) else {
            record_validation(Side::Response, Outcome::Valid);
            debug!(operation_id = %operation_id, http.status_code = status.as_u16(), "status not declared, response accepted");
            return Ok(());
        };

        let mut out = Collector::new(inner.config.mode());
        let _ = check_response(inner, declared, headers, body, &mut out);

        match out.finish() {
            Ok(()) => {
                record_validation(Side::Response, Outcome::Valid);
                debug!(operation_id = %operation_id, http.status_code = status.as_u16(), "response valid");
                Ok(())
            }
            Err(violations) => {
                record(Side::Response, &violations);
                warn!(
                    operation_id = %operation_id,
                    http.method = %method,
                    http.path = path,
                    http.status_code = status.as_u16(),
                    violations = violations.len(),
                    first = %violations.first(),
                    "response violates contract"
                );
                Err(ResponseError::Invalid {
                    operation: operation_id,
                    status,
                    violations,
                })
            }
        }
    }
}

// An empty body without a `Content-Type` is a response with no content.
fn check_response(
    inner: &Inner,
    declared: &Response,
    headers: &HeaderMap,
    body: &[u8],
    out: &mut Collector,
) -> ControlFlow<()> {
    params::check_headers(&inner.validator, &declared.headers, headers, out)?;
    let content_type = content_type(headers);
    if body.is_empty() && content_type.is_none() {
        return ControlFlow::Continue(());
    }
    body::check(&inner.validator, &declared.content, content_type, body, out)
}
