//! Caller metadata stored on the head chunk

use std::collections::HashSet;

use serde_json::{Map, Value};

/// Ordered `(name, value)` pairs supplied by a writer
///
/// Order is kept as given. Names must be unique; use
/// [`BlobAttributes::find_duplicate`] before persisting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlobAttributes(Vec<(String, Value)>);

impl BlobAttributes {
    /// Create an empty attribute list
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an attribute
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.push((name.into(), value.into()));
    }

    /// Append an attribute, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The first name that appears more than once, if any
    pub fn find_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.0.len());
        self.0
            .iter()
            .map(|(name, _)| name.as_str())
            .find(|name| !seen.insert(*name))
    }

    /// The `app_metadata` object for the head chunk, `None` when empty
    pub fn to_metadata(&self) -> Option<Map<String, Value>> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.0.iter().cloned().collect())
    }
}

impl<K, V> FromIterator<(K, V)> for BlobAttributes
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
