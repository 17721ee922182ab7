//! Newtype IDs for type-safe entity references.

use serde::{Deserialize, Serialize};

/// A product identifier.
///
/// Wraps the opaque string id assigned by the catalog backend. Using a
/// newtype instead of a bare `String` prevents accidentally keying the cart
/// or a lookup with some other string value.
///
/// The `Ord` implementation is the underlying string order, which gives
/// ordered collections keyed by id a stable iteration order.
///
/// # Example
///
/// ```rust
/// use vitrine_core::ProductId;
///
/// let id = ProductId::new("prod-42");
/// assert_eq!(id.as_str(), "prod-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_as_str() {
        let id = ProductId::new("abc123");
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_display() {
        let id = ProductId::new("abc123");
        assert_eq!(format!("{id}"), "abc123");
    }

    #[test]
    fn test_from_conversions() {
        let from_str: ProductId = "p1".into();
        let from_string: ProductId = String::from("p1").into();
        assert_eq!(from_str, from_string);

        let back: String = from_str.into();
        assert_eq!(back, "p1");
    }

    #[test]
    fn test_ordering_follows_string_order() {
        let mut ids = vec![
            ProductId::new("b"),
            ProductId::new("a"),
            ProductId::new("c"),
        ];
        ids.sort();
        let strs: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
        assert_eq!(strs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::new("p-9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"p-9\"");

        let parsed: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
