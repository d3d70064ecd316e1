//! Open key/value tags attached to tree vertices.
//!
//! Provides [Tags], the per-vertex store for branch statistics
//! (`t`, `dN`, `dS`, `omega`, ...) and reconstruction data
//! (`changes`, `node_id`). Keys may repeat: adding a value under an
//! existing key appends to its list. Values are captured by [TagValue].

use crate::model::reconstruction::SubstitutionEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =#========================================================================#=
// TAGS
// =#========================================================================$=
/// Tag values of one vertex, keyed by name; each key holds the values in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tags {
    values: BTreeMap<String, Vec<TagValue>>,
}

impl Tags {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `key`.
    ///
    /// # Arguments
    /// * `key` - Tag name (e.g. "dN", "changes")
    /// * `value` - Anything convertible into a [TagValue]
    pub fn add<V: Into<TagValue>>(&mut self, key: &str, value: V) {
        self.values.entry(key.to_string()).or_default().push(value.into());
    }

    /// Replaces all values under `key` by a single value.
    pub fn set<V: Into<TagValue>>(&mut self, key: &str, value: V) {
        self.values.insert(key.to_string(), vec![value.into()]);
    }

    /// Returns all values stored under `key` (empty if the key is absent).
    pub fn get_all(&self, key: &str) -> &[TagValue] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.values.get(key).and_then(|v| v.first())
    }

    /// Returns the first value under `key` as float, if it is numeric.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(TagValue::as_f64)
    }

    /// Returns whether any value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates over the tag names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns whether no tags are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =#========================================================================#=
// TAG VALUE
// =#========================================================================$=
/// Enum to encapsulate a tag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    /// For floating point values
    Float(f64),
    /// For integer values
    Int(i64),
    /// For strings
    String(String),
    /// One substitution along the branch above a vertex
    Change(SubstitutionEvent),
}

impl TagValue {
    /// Returns the value as float if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Float(v) => Some(*v),
            TagValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the value as string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the substitution event if this is one.
    pub fn as_change(&self) -> Option<&SubstitutionEvent> {
        match self {
            TagValue::Change(c) => Some(c),
            _ => None,
        }
    }
}

impl From<f64> for TagValue {
    fn from(v: f64) -> Self {
        TagValue::Float(v)
    }
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Int(v)
    }
}

impl From<u32> for TagValue {
    fn from(v: u32) -> Self {
        TagValue::Int(v as i64)
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        TagValue::String(v)
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::String(v.to_string())
    }
}

impl From<SubstitutionEvent> for TagValue {
    fn from(v: SubstitutionEvent) -> Self {
        TagValue::Change(v)
    }
}
