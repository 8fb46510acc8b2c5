//! Ordered multi-value map used for request headers and cookies.
//!
//! # Design Decisions
//! - Keys keep first-insertion order, values keep append order per key
//! - Linear key lookup: header and cookie sets are small
//! - No interior mutability; a snapshot is just a clone behind a `&` API

use std::fmt;

/// Mapping from a string key to an ordered list of values.
#[derive(Clone, PartialEq, Eq)]
pub struct MultiValueMap<V> {
    entries: Vec<(String, Vec<V>)>,
}

impl<V> MultiValueMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a value to the list stored under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Append every value in `values` to the list stored under `key`.
    ///
    /// An empty iterator leaves the map untouched; no empty entry is created.
    pub fn add_all<I>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        let key = key.into();
        for value in values {
            self.add(key.as_str(), value);
        }
    }

    /// Values stored under `key`, in append order.
    pub fn get(&self, key: &str) -> Option<&[V]> {
        self.position(key).map(|idx| self.entries[idx].1.as_slice())
    }

    /// First value stored under `key`.
    pub fn get_first(&self, key: &str) -> Option<&V> {
        self.get(key).and_then(|values| values.first())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, values)` pairs in key insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[V])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Iterate the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<V: Clone> MultiValueMap<V> {
    /// Concatenate every list of `other` onto the list stored under the same key.
    pub fn merge(&mut self, other: &MultiValueMap<V>) {
        for (key, values) in other.iter() {
            self.add_all(key, values.iter().cloned());
        }
    }
}

impl<V> Default for MultiValueMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for MultiValueMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for MultiValueMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.add(key, value);
        }
        map
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for MultiValueMap<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_order() {
        let mut map = MultiValueMap::new();
        map.add("b", 1);
        map.add("a", 2);
        map.add("b", 3);

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&[1, 3][..]));
        assert_eq!(map.get_first("a"), Some(&2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_merge_concatenates() {
        let mut left: MultiValueMap<&str> = [("x", "a")].into_iter().collect();
        let right: MultiValueMap<&str> = [("x", "b"), ("y", "c"), ("x", "d")].into_iter().collect();

        left.merge(&right);

        assert_eq!(left.get("x"), Some(&["a", "b", "d"][..]));
        assert_eq!(left.get("y"), Some(&["c"][..]));
    }

    #[test]
    fn test_add_all_empty_is_noop() {
        let mut map: MultiValueMap<String> = MultiValueMap::new();
        map.add_all("x", Vec::new());
        assert!(map.is_empty());
        assert!(!map.contains_key("x"));
    }
}
