//! Path template routing for Kanon.
//!
//! This crate resolves a concrete request (method + path) to the single
//! operation declared for it in an OpenAPI-style route table.
//!
//! # Features
//!
//! - **Segment matching**: literals compare exactly, `{name}` placeholders
//!   capture one non-empty, percent-decoded segment
//! - **Strict paths**: trailing slashes are significant
//! - **Most-specific wins**: fewest placeholders, then declaration order
//! - **Distinct failures**: unknown path vs. known path with the wrong method
//!
//! # Example
//!
//! ```rust
//! use kanon_router::{MethodRouter, RouteError, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/foo/{bar}", MethodRouter::new().post("postFoo")).unwrap();
//!
//! let m = router.match_route(&Method::POST, "/foo/100").unwrap();
//! assert_eq!(m.operation_id, "postFoo");
//! assert_eq!(m.params.get("bar"), Some("100"));
//!
//! assert!(matches!(
//!     router.match_route(&Method::DELETE, "/foo/100"),
//!     Err(RouteError::MethodNotAllowed { .. })
//! ));
//! assert!(matches!(
//!     router.match_route(&Method::POST, "/unknown"),
//!     Err(RouteError::RouteNotFound { .. })
//! ));
//! ```

mod method_router;
mod params;
mod router;
mod template;

pub use method_router::MethodRouter;
pub use params::Params;
pub use router::{PathMatch, Router};
pub use template::{PathTemplate, Segment, TemplateError};

use http::Method;
use thiserror::Error;

/// A resolved route: operation key, winning template and captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Operation key registered for the method.
    pub operation_id: &'a str,
    /// The template that won, as declared.
    pub template: &'a str,
    /// Decoded path captures.
    pub params: Params,
}

/// Why a request could not be routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No template matches the path.
    #[error("no route matches {method} {path}")]
    RouteNotFound {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
    },

    /// A template matches, but it declares no operation for the method.
    #[error("method {method} is not allowed on {path} (allowed: {})", join_methods(.allowed))]
    MethodNotAllowed {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// The template that matched.
        template: String,
        /// Methods the template does declare.
        allowed: Vec<Method>,
    },
}

fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_route_error_display() {
        let err = RouteError::MethodNotAllowed {
            method: Method::DELETE,
            path: "/foo/1".to_string(),
            template: "/foo/{bar}".to_string(),
            allowed: vec![Method::GET, Method::POST],
        };
        assert_eq!(
            err.to_string(),
            "method DELETE is not allowed on /foo/1 (allowed: GET, POST)"
        );

        let err = RouteError::RouteNotFound {
            method: Method::GET,
            path: "/unknown".to_string(),
        };
        assert_eq!(err.to_string(), "no route matches GET /unknown");
    }

    fn overlapping() -> Router {
        let mut router = Router::new();
        router.route(&Method::GET, "/{a}/{b}", "twoParams").unwrap();
        router.route(&Method::GET, "/x/{b}", "literalFirst").unwrap();
        router.route(&Method::GET, "/{a}/y", "literalSecond").unwrap();
        router.route(&Method::GET, "/x/y", "allLiteral").unwrap();
        router
    }

    proptest! {
        /// Resolving the same path twice yields the same operation and captures.
        #[test]
        fn resolution_is_deterministic(a in "[a-z0-9]{1,6}", b in "[a-z0-9]{1,6}") {
            let router = overlapping();
            let path = format!("/{a}/{b}");
            let first = router.match_route(&Method::GET, &path).unwrap();
            let second = router.match_route(&Method::GET, &path).unwrap();
            prop_assert_eq!(first, second);
        }

        /// The chosen template never has more placeholders than another match.
        #[test]
        fn winner_is_most_specific(a in prop_oneof![Just("x".to_string()), "[a-z]{1,3}"],
                                   b in prop_oneof![Just("y".to_string()), "[a-z]{1,3}"]) {
            let router = overlapping();
            let path = format!("/{a}/{b}");
            let winner = router.match_path(&path).unwrap();
            let winner_count = PathTemplate::parse(winner.template).unwrap().placeholder_count();
            for template in router.templates() {
                let compiled = PathTemplate::parse(template).unwrap();
                if compiled.matches(&path).is_some() {
                    prop_assert!(winner_count <= compiled.placeholder_count());
                }
            }
        }
    }
}
