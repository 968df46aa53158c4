use std::ops::Index;

use crate::value::Value;

/// Order-preserving, index-addressable sequence of values.
///
/// O(1) amortized append and index access; insert/remove at an arbitrary
/// index shift the tail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct List(Vec<Value>);

impl List {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.0.get_mut(index)
    }

    /// Append; the list takes ownership of `value`.
    pub fn add(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    /// Insert at `index`, shifting later elements. Returns `false` (and
    /// drops nothing) when `index > len()`.
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> bool {
        if index > self.0.len() {
            return false;
        }
        self.0.insert(index, value.into());
        true
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Option<Value> {
        self.0
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value.into()))
    }

    pub fn remove(&mut self, index: usize) -> Option<Value> {
        if index >= self.0.len() {
            return None;
        }
        Some(self.0.remove(index))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Value> {
        self.0.iter_mut()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl Index<usize> for List {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.0[index]
    }
}

impl From<Vec<Value>> for List {
    fn from(v: Vec<Value>) -> Self {
        Self(v)
    }
}

impl<V: Into<Value>> FromIterator<V> for List {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for List {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_iff_size_zero() {
        let mut list = List::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        list.add(1);
        assert!(!list.is_empty());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn insert_then_remove_restores_size() {
        let mut list: List = [1, 2, 3].into_iter().collect();
        assert!(list.insert(1, "x"));
        assert_eq!(list.len(), 4);
        assert_eq!(list[1], Value::from("x"));
        assert_eq!(list.remove(1), Some(Value::from("x")));
        assert_eq!(list.len(), 3);
        assert_eq!(list[1], Value::Int(2));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut list: List = [1].into_iter().collect();
        assert!(!list.insert(5, 9));
        assert_eq!(list.remove(3), None);
        assert_eq!(list.set(3, 0), None);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn set_returns_previous() {
        let mut list: List = [1, 2].into_iter().collect();
        assert_eq!(list.set(0, true), Some(Value::Int(1)));
        assert_eq!(list[0], Value::Boolean(true));
    }
}
