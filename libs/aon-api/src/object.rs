use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter, Keys, Values};

use crate::value::Value;

/// Insertion-ordered, string-keyed mapping.
///
/// Lookup is O(1) on average. Overwriting an existing key keeps its
/// position; removal unlinks the entry and keeps the relative order of the
/// rest. "Key is null" and "key is absent" are distinct predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object(IndexMap<String, Value>);

impl Object {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Insert or overwrite in place, returning the previous value.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// True only when the key is present and bound to Null.
    pub fn is_null(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(Value::is_null)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> Values<'_, String, Value> {
        self.0.values()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(obj: &Object) -> Vec<&str> {
        obj.keys().map(String::as_str).collect()
    }

    #[test]
    fn empty_object() {
        let obj = Object::new();
        assert_eq!(obj.len(), 0);
        assert!(obj.is_empty());
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut obj = Object::new();
        obj.put("z", 1);
        obj.put("a", 2);
        obj.put("m", 3);
        assert_eq!(keys(&obj), ["z", "a", "m"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut obj: Object = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(obj.put("a", 10), Some(Value::Int(1)));
        assert_eq!(keys(&obj), ["a", "b", "c"]);
        assert_eq!(obj.get("a"), Some(&Value::Int(10)));
    }

    #[test]
    fn put_then_remove_restores_size_and_order() {
        let mut obj: Object = [("a", 1), ("b", 2)].into_iter().collect();
        obj.put("tmp", 0);
        assert_eq!(obj.len(), 3);
        obj.remove("tmp");
        assert_eq!(obj.len(), 2);
        assert_eq!(keys(&obj), ["a", "b"]);

        obj.put("c", 3);
        obj.remove("a");
        assert_eq!(keys(&obj), ["b", "c"]);
    }

    #[test]
    fn null_is_not_absence() {
        let mut obj = Object::new();
        obj.put("n", Value::Null);
        assert!(obj.is_null("n"));
        assert!(obj.contains_key("n"));
        assert!(!obj.is_null("missing"));
        assert!(!obj.contains_key("missing"));
    }
}
