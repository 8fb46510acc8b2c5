//! Typed route attributes.
//!
//! Attributes are type-erased values attached to a route predicate under a
//! string name. `AttributeKey<T>` pairs a name with the expected type so
//! readers get a typed accessor instead of downcasting by hand.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type-erased attribute value.
pub type AttributeValue = Arc<dyn Any + Send + Sync>;

/// Name of an attribute together with the type stored under it.
pub struct AttributeKey<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> AttributeKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Erase `value` for storage under this key.
    pub fn value(&self, value: T) -> AttributeValue {
        Arc::new(value)
    }

    /// Read this attribute from `bag`, if present and of type `T`.
    pub fn get<'a>(&self, bag: &'a AttributeBag) -> Option<&'a T> {
        bag.get(self.name)?.downcast_ref::<T>()
    }
}

impl<T> fmt::Debug for AttributeKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AttributeKey").field(&self.name).finish()
    }
}

/// Attribute name → value collected from a route.
#[derive(Debug, Clone, Default)]
pub struct AttributeBag {
    entries: HashMap<String, AttributeValue>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, replacing any earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name)
    }

    /// Typed read through `key`.
    pub fn typed<T: Any + Send + Sync>(&self, key: &AttributeKey<T>) -> Option<&T> {
        key.get(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Attribute names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLOR: AttributeKey<String> = AttributeKey::new("color");
    const SIZE: AttributeKey<u32> = AttributeKey::new("size");

    #[test]
    fn test_typed_access() {
        let mut bag = AttributeBag::new();
        bag.insert(COLOR.name(), COLOR.value("red".to_string()));
        bag.insert(SIZE.name(), SIZE.value(3));

        assert_eq!(bag.typed(&COLOR).map(String::as_str), Some("red"));
        assert_eq!(SIZE.get(&bag), Some(&3));
        assert_eq!(bag.names(), vec!["color", "size"]);
    }

    #[test]
    fn test_wrong_type_is_none() {
        let mut bag = AttributeBag::new();
        bag.insert("size", COLOR.value("large".to_string()));

        assert!(bag.contains("size"));
        assert!(SIZE.get(&bag).is_none());
    }
}
