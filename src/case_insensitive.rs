//! A string-keyed map with ASCII case-insensitive keys.
//!
//! Header names and query parameter names are compared without regard to
//! case. Keys are folded to lowercase for storage and lookup, while the
//! spelling used by the most recent insert is kept for iteration so that
//! `Content-Type` is emitted as written.

use std::collections::HashMap;

/// A map whose keys compare ASCII case-insensitively.
///
/// # Examples
///
/// ```
/// use reqinfo::CaseInsensitiveMap;
///
/// let mut headers = CaseInsensitiveMap::new();
/// headers.insert("Content-Type", "text/plain".to_string());
/// headers.insert("content-type", "application/json".to_string());
///
/// assert_eq!(headers.len(), 1);
/// assert_eq!(headers.get("CONTENT-TYPE").unwrap(), "application/json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseInsensitiveMap<V> {
    entries: HashMap<String, (String, V)>,
}

impl<V> CaseInsensitiveMap<V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts a value, replacing any entry whose key matches ignoring case.
    ///
    /// Returns the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        self.entries
            .insert(key.to_ascii_lowercase(), (key, value))
            .map(|(_, previous)| previous)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_ascii_lowercase())
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries
            .remove(&key.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in unspecified order, yielding keys as last inserted.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries
            .values()
            .map(|(key, value)| (key.as_str(), value))
    }
}

impl<V> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for CaseInsensitiveMap<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for CaseInsensitiveMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}
