//! Route table over compiled path templates.
//!
//! This module provides the [`Router`], which owns every declared template
//! together with its method table and resolves concrete paths against them.

use http::Method;

use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::template::{PathTemplate, TemplateError};
use crate::{RouteError, RouteMatch};

/// A template and the methods declared on it.
#[derive(Debug, Clone)]
struct Route {
    template: PathTemplate,
    methods: MethodRouter,
}

/// Result of matching a path without regard to method.
#[derive(Debug, Clone)]
pub struct PathMatch<'a> {
    /// The winning template as declared.
    pub template: &'a str,
    /// Methods declared on the winning template.
    pub methods: &'a MethodRouter,
    /// Decoded captures.
    pub params: Params,
}

/// Resolves request paths against declared templates.
///
/// # Ambiguity policy
///
/// When more than one template matches a path, the template with the
/// fewest placeholder segments wins; among equally specific templates the
/// one inserted first wins. With `/foo/{id}` and `/foo/bar` declared in any
/// order, `/foo/bar` resolves to the literal template and `/foo/baz` to the
/// placeholder one. Templates such as `/{a}/b` and `/a/{b}` are equally
/// specific, so declaration order decides.
///
/// The method is consulted only after a template has been selected: a path
/// that matches a template lacking the method yields
/// [`RouteError::MethodNotAllowed`], even if a less specific template would
/// have accepted it.
///
/// # Example
///
/// ```rust
/// use kanon_router::{MethodRouter, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/foo/{id}", MethodRouter::new().get("getFoo")).unwrap();
/// router.insert("/foo/bar", MethodRouter::new().get("getBar")).unwrap();
///
/// let m = router.match_route(&Method::GET, "/foo/bar").unwrap();
/// assert_eq!(m.operation_id, "getBar");
///
/// let m = router.match_route(&Method::GET, "/foo/7").unwrap();
/// assert_eq!(m.operation_id, "getFoo");
/// assert_eq!(m.params.get("id"), Some("7"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `template` and registers its methods.
    ///
    /// Inserting a template that is already present merges the method
    /// tables; the existing template keeps its declaration position.
    pub fn insert(&mut self, template: &str, methods: MethodRouter) -> Result<(), TemplateError> {
        if let Some(existing) = self.routes.iter_mut().find(|r| r.template.as_str() == template) {
            existing.methods.merge(methods);
            return Ok(());
        }

        let template = PathTemplate::parse(template)?;
        self.routes.push(Route { template, methods });
        Ok(())
    }

    /// Registers a single method on a template.
    pub fn route(
        &mut self,
        method: &Method,
        template: &str,
        operation: impl Into<String>,
    ) -> Result<(), TemplateError> {
        self.insert(template, MethodRouter::new().method(method, operation))
    }

    /// Selects the template for `path`, ignoring the method.
    pub fn match_path(&self, path: &str) -> Option<PathMatch<'_>> {
        let mut best: Option<(&Route, Params)> = None;

        for route in &self.routes {
            let Some(params) = route.template.matches(path) else {
                continue;
            };
            let more_specific = best.as_ref().map_or(true, |(current, _)| {
                route.template.placeholder_count() < current.template.placeholder_count()
            });
            if more_specific {
                best = Some((route, params));
            }
        }

        best.map(|(route, params)| PathMatch {
            template: route.template.as_str(),
            methods: &route.methods,
            params,
        })
    }

    /// Resolves a method and path to an operation key.
    pub fn match_route(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, RouteError> {
        let matched = self.match_path(path).ok_or_else(|| RouteError::RouteNotFound {
            method: method.clone(),
            path: path.to_string(),
        })?;

        let operation_id = matched.methods.get_operation(method).ok_or_else(|| {
            RouteError::MethodNotAllowed {
                method: method.clone(),
                path: path.to_string(),
                template: matched.template.to_string(),
                allowed: matched.methods.allowed_methods(),
            }
        })?;

        Ok(RouteMatch {
            operation_id,
            template: matched.template,
            params: matched.params,
        })
    }

    /// Declared templates in declaration order.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.template.as_str())
    }

    /// Number of distinct templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pets() -> Router {
        let mut router = Router::new();
        router
            .insert("/pets", MethodRouter::new().get("listPets").post("createPet"))
            .unwrap();
        router
            .insert("/pets/{petId}", MethodRouter::new().get("getPet").delete("deletePet"))
            .unwrap();
        router
            .insert("/pets/{petId}/photos/{photoId}", MethodRouter::new().get("getPhoto"))
            .unwrap();
        router
    }

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_match_static() {
        let router = pets();
        let m = router.match_route(&Method::GET, "/pets").unwrap();
        assert_eq!(m.operation_id, "listPets");
        assert_eq!(m.template, "/pets");
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_match_nested_params() {
        let router = pets();
        let m = router.match_route(&Method::GET, "/pets/9/photos/3").unwrap();
        assert_eq!(m.operation_id, "getPhoto");
        assert_eq!(m.params.get("petId"), Some("9"));
        assert_eq!(m.params.get("photoId"), Some("3"));
    }

    #[test]
    fn test_route_not_found() {
        let router = pets();
        let err = router.match_route(&Method::GET, "/unknown").unwrap_err();
        assert!(matches!(err, RouteError::RouteNotFound { .. }));
    }

    #[test]
    fn test_method_not_allowed_lists_allowed() {
        let router = pets();
        let err = router.match_route(&Method::PUT, "/pets/1").unwrap_err();
        match err {
            RouteError::MethodNotAllowed { template, allowed, .. } => {
                assert_eq!(template, "/pets/{petId}");
                assert_eq!(allowed, vec![Method::GET, Method::DELETE]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_literal_beats_placeholder_regardless_of_order() {
        let mut placeholder_first = Router::new();
        placeholder_first.route(&Method::GET, "/foo/{id}", "byId").unwrap();
        placeholder_first.route(&Method::GET, "/foo/bar", "bar").unwrap();

        let mut literal_first = Router::new();
        literal_first.route(&Method::GET, "/foo/bar", "bar").unwrap();
        literal_first.route(&Method::GET, "/foo/{id}", "byId").unwrap();

        for router in [placeholder_first, literal_first] {
            let m = router.match_route(&Method::GET, "/foo/bar").unwrap();
            assert_eq!(m.operation_id, "bar");
            let m = router.match_route(&Method::GET, "/foo/qux").unwrap();
            assert_eq!(m.operation_id, "byId");
        }
    }

    #[test]
    fn test_equal_specificity_uses_declaration_order() {
        let mut router = Router::new();
        router.route(&Method::GET, "/{a}/b", "first").unwrap();
        router.route(&Method::GET, "/a/{b}", "second").unwrap();

        let m = router.match_route(&Method::GET, "/a/b").unwrap();
        assert_eq!(m.operation_id, "first");
    }

    #[test]
    fn test_specific_template_without_method_is_405() {
        let mut router = Router::new();
        router.route(&Method::GET, "/foo/{id}", "byId").unwrap();
        router.route(&Method::POST, "/foo/bar", "createBar").unwrap();

        let err = router.match_route(&Method::GET, "/foo/bar").unwrap_err();
        assert!(matches!(err, RouteError::MethodNotAllowed { .. }));
    }

    #[test]
    fn test_insert_same_template_merges() {
        let mut router = Router::new();
        router.route(&Method::GET, "/pets", "listPets").unwrap();
        router.route(&Method::POST, "/pets", "createPet").unwrap();

        assert_eq!(router.len(), 1);
        assert_eq!(
            router.match_route(&Method::POST, "/pets").unwrap().operation_id,
            "createPet"
        );
    }

    #[test]
    fn test_insert_rejects_bad_template() {
        let mut router = Router::new();
        let err = router.route(&Method::GET, "/pets/{id", "x").unwrap_err();
        assert!(matches!(err, TemplateError::UnbalancedBrace { .. }));
        assert!(router.is_empty());
    }

    #[test]
    fn test_trailing_slash_not_normalised() {
        let router = pets();
        assert!(matches!(
            router.match_route(&Method::GET, "/pets/"),
            Err(RouteError::RouteNotFound { .. })
        ));
    }

    #[test]
    fn test_templates_in_declaration_order() {
        let router = pets();
        let templates: Vec<_> = router.templates().collect();
        assert_eq!(
            templates,
            vec!["/pets", "/pets/{petId}", "/pets/{petId}/photos/{photoId}"]
        );
    }
}
