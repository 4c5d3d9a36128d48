//! Per-template method table.
//!
//! [`MethodRouter`] maps HTTP methods to operation keys for one path
//! template. Methods keep their declaration order so that the allowed list
//! reported for a 405 is stable.

use http::Method;

/// Maps HTTP methods to operation keys for a single template.
///
/// # Example
///
/// ```rust
/// use kanon_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new()
///     .get("listPets")
///     .post("createPet");
///
/// assert_eq!(router.get_operation(&Method::GET), Some("listPets"));
/// assert_eq!(router.get_operation(&Method::DELETE), None);
/// assert_eq!(router.allowed_methods(), vec![Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    entries: Vec<(Method, String)>,
}

impl MethodRouter {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET operation.
    #[must_use]
    pub fn get(self, operation: impl Into<String>) -> Self {
        self.method(&Method::GET, operation)
    }

    /// Registers a POST operation.
    #[must_use]
    pub fn post(self, operation: impl Into<String>) -> Self {
        self.method(&Method::POST, operation)
    }

    /// Registers a PUT operation.
    #[must_use]
    pub fn put(self, operation: impl Into<String>) -> Self {
        self.method(&Method::PUT, operation)
    }

    /// Registers a DELETE operation.
    #[must_use]
    pub fn delete(self, operation: impl Into<String>) -> Self {
        self.method(&Method::DELETE, operation)
    }

    /// Registers a PATCH operation.
    #[must_use]
    pub fn patch(self, operation: impl Into<String>) -> Self {
        self.method(&Method::PATCH, operation)
    }

    /// Registers an operation for any method, including extension methods.
    ///
    /// Registering the same method twice replaces the earlier key.
    #[must_use]
    pub fn method(mut self, method: &Method, operation: impl Into<String>) -> Self {
        self.insert(method.clone(), operation.into());
        self
    }

    /// Returns the operation key registered for `method`.
    #[must_use]
    pub fn get_operation(&self, method: &Method) -> Option<&str> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, op)| op.as_str())
    }

    /// Methods with a registered operation, in declaration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges `other` into this table without overwriting existing methods.
    pub fn merge(&mut self, other: MethodRouter) {
        for (method, operation) in other.entries {
            if self.get_operation(&method).is_none() {
                self.entries.push((method, operation));
            }
        }
    }

    fn insert(&mut self, method: Method, operation: String) {
        match self.entries.iter_mut().find(|(m, _)| *m == method) {
            Some(entry) => entry.1 = operation,
            None => self.entries.push((method, operation)),
        }
    }
}
