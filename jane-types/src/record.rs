//! Copy-on-write records.
//!
//! A [`Record`] is an ordered mapping of field name to [`Value`] whose field
//! storage sits behind an `Arc`. Cloning a record is cheap and shares the
//! storage; the first mutation through [`Record::set`] or
//! [`Record::remove`] gives the mutating handle its own copy. A bag can
//! therefore hand the same record to many consumers and none of them can
//! observe another's writes.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

/// Field storage of a record, in insertion order.
pub type Fields = IndexMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Arc<Fields>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[inline]
    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Value of `field`, or [`Value::Null`] when the field is absent.
    pub fn value_or_null(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Set a field, copying the shared storage first if another handle
    /// still points at it. Returns the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        Arc::make_mut(&mut self.fields).insert(field.into(), value.into())
    }

    /// Remove a field, preserving the order of the remaining fields.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        if !self.fields.contains_key(field) {
            return None;
        }
        Arc::make_mut(&mut self.fields).shift_remove(field)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A handle with its own field storage.
    ///
    /// Nested records stay shared until they are themselves mutated, which
    /// matches a shallow copy.
    pub fn detached(&self) -> Record {
        Record {
            fields: Arc::new((*self.fields).clone()),
        }
    }

    /// Whether both handles currently read the same field storage.
    #[inline]
    pub fn shares_storage_with(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }

    /// New record holding only `columns`, in the given order. Columns the
    /// source record lacks are carried as [`Value::Null`].
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> Record {
        columns
            .iter()
            .map(|c| {
                let name = c.as_ref();
                (name.to_string(), self.value_or_null(name).clone())
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Record {
            fields: Arc::new(fields),
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Record {
        Record::from_iter([("id", Value::from(1)), ("name", Value::from("ada"))])
    }

    #[test]
    fn clones_share_until_written() {
        let original = person();
        let mut copy = original.clone();
        assert!(copy.shares_storage_with(&original));

        copy.set("name", "grace");
        assert!(!copy.shares_storage_with(&original));
        assert_eq!(original.get("name"), Some(&Value::from("ada")));
        assert_eq!(copy.get("name"), Some(&Value::from("grace")));
    }

    #[test]
    fn detached_copy_has_private_storage() {
        let original = person();
        let detached = original.detached();
        assert!(!detached.shares_storage_with(&original));
        assert_eq!(detached, original);
    }

    #[test]
    fn project_keeps_requested_order_and_nulls_missing() {
        let projected = person().project(&["name", "age"]);
        assert_eq!(projected.keys().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(projected.get("age"), Some(&Value::Null));
    }

    #[test]
    fn remove_preserves_field_order() {
        let mut r = Record::from_iter([("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(r.remove("b"), Some(Value::from(2)));
        assert_eq!(r.remove("zzz"), None);
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
