//! Operation resolution from HTTP requests.
//!
//! This module provides the `OperationResolver` which maps incoming HTTP
//! requests (method + path) to the operations of a [`Document`].

use http::Method;
use kanon_core::{BuildError, Document, Operation, ParameterLocation};
use kanon_router::{MethodRouter, Params, PathTemplate, RouteError, Router};
use tracing::debug;

/// Result of resolving an HTTP request to an operation.
#[derive(Debug, Clone)]
pub struct OperationResolution<'d> {
    /// The matched operation.
    pub operation: &'d Operation,
    /// Path template that was matched.
    pub template: &'d str,
    /// Extracted path parameters, percent-decoded.
    pub path_params: Params,
}

impl OperationResolution<'_> {
    /// Operation key (`operationId` or `METHOD /template`).
    #[must_use]
    pub fn operation_id(&self) -> String {
        self.operation.key()
    }
}

/// Resolves HTTP requests to document operations.
///
/// Templates are matched most-specific first (see [`Router`]). When the
/// document's first server carries a path, requests must start with it and
/// it is removed before matching.
#[derive(Debug, Clone)]
pub struct OperationResolver {
    router: Router,
    base_path: Option<String>,
}

impl OperationResolver {
    /// Builds the routing table for `document`.
    ///
    /// Fails when a template does not compile or a declared path parameter
    /// names no placeholder of its template.
    pub fn new(document: &Document) -> Result<Self, BuildError> {
        let mut router = Router::new();

        for (template, item) in document.paths() {
            let compiled = PathTemplate::parse(template)?;
            let mut methods = MethodRouter::new();

            for (method, operation) in &item.operations {
                for param in &operation.parameters {
                    if param.location != ParameterLocation::Path {
                        continue;
                    }
                    if !compiled.placeholder_names().any(|name| name == param.name) {
                        return Err(BuildError::PathParameterMismatch {
                            path: template.clone(),
                            method: method.clone(),
                            name: param.name.clone(),
                        });
                    }
                }
                methods = methods.method(method, operation.key());
            }

            router.insert(template, methods)?;
        }

        let base_path = document.base_path().map(str::to_string);

        debug!(
            templates = router.len(),
            base_path = base_path.as_deref().unwrap_or("/"),
            "operation resolver initialized"
        );

        Ok(Self { router, base_path })
    }

    /// Path prefix removed before matching, if any.
    #[must_use]
    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    /// Resolves a request to the operation `document` declares for it.
    ///
    /// `document` must be the one this resolver was built from.
    pub fn resolve<'d>(
        &self,
        document: &'d Document,
        method: &Method,
        path: &str,
    ) -> Result<OperationResolution<'d>, RouteError> {
        let not_found = || RouteError::RouteNotFound {
            method: method.clone(),
            path: path.to_string(),
        };

        let relative = self.strip_base(path).ok_or_else(not_found)?;
        let matched = self.router.match_route(method, relative)?;

        let (template, _) = document
            .paths()
            .get_key_value(matched.template)
            .ok_or_else(not_found)?;
        let operation = document
            .operation(method, template)
            .ok_or_else(not_found)?;

        Ok(OperationResolution {
            operation,
            template,
            path_params: matched.params,
        })
    }

    fn strip_base<'p>(&self, path: &'p str) -> Option<&'p str> {
        let Some(base) = self.base_path.as_deref() else {
            return Some(path);
        };
        let rest = path.strip_prefix(base)?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}
