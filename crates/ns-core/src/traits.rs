//! Core traits for NextStat
//!
//! Selection logic reads events only through [`EventRecord`], so the same
//! cut and category registries work for typed event structs and for loosely
//! typed records decoded from JSON.

use std::collections::HashMap;

/// A single event: a bag of named numeric fields.
pub trait EventRecord {
    /// Value of the named field, or `None` if the record has no such field.
    fn field(&self, name: &str) -> Option<f64>;
}

impl<T: EventRecord + ?Sized> EventRecord for &T {
    fn field(&self, name: &str) -> Option<f64> {
        (**self).field(name)
    }
}

/// Untyped event record backed by a hash map.
pub type FieldMap = HashMap<String, f64>;

impl EventRecord for FieldMap {
    fn field(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}
