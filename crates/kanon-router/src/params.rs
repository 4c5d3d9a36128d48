//! Captured path parameters.
//!
//! Templates rarely declare more than a handful of placeholders, so the
//! captures live inline in a small vector and only spill to the heap for
//! unusually deep templates.

use std::collections::HashMap;

use smallvec::SmallVec;

/// Captures stored inline before spilling to the heap.
const INLINE_PARAMS: usize = 4;

/// Path parameters captured by a template match, in template order.
///
/// Values are already percent-decoded.
///
/// # Example
///
/// ```rust
/// use kanon_router::Params;
///
/// let mut params = Params::new();
/// params.push("petId", "42");
///
/// assert_eq!(params.get("petId"), Some("42"));
/// assert_eq!(params.get("ownerId"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty parameter set sized for `capacity` captures.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Appends a capture.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the captured value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates captures as `(name, value)` in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Converts the captures into an owned map.
    #[must_use]
    pub fn into_map(self) -> HashMap<String, String> {
        self.inner.into_iter().collect()
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_preserve_order() {
        let mut params = Params::new();
        params.push("orgId", "acme");
        params.push("userId", "7");

        let collected: Vec<_> = params.iter().collect();
        assert_eq!(collected, vec![("orgId", "acme"), ("userId", "7")]);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_params_spill_past_inline_capacity() {
        let params: Params = (0..8)
            .map(|i| (format!("p{i}"), i.to_string()))
            .collect();

        assert_eq!(params.len(), 8);
        assert_eq!(params.get("p7"), Some("7"));
    }

    #[test]
    fn test_params_into_map() {
        let mut params = Params::new();
        params.push("bar", "100");

        let map = params.into_map();
        assert_eq!(map.get("bar").map(String::as_str), Some("100"));
    }

    #[test]
    fn test_params_empty() {
        let params = Params::default();
        assert!(params.is_empty());
        assert_eq!(params.get("anything"), None);
    }
}
