//! Read-only keyed lookups over request mappings.

use serde_json::{Map, Value};

static EMPTY: once_cell::sync::Lazy<Map<String, Value>> = once_cell::sync::Lazy::new(Map::new);

/// Read-only accessor over a string-keyed mapping.
///
/// Borrows the backing mapping and never copies it; only [`KeyedLookup::all`]
/// hands out an owned copy. A value that is not a JSON object (e.g. a `null`
/// body) behaves as an empty mapping.
#[derive(Debug, Clone, Copy)]
pub struct KeyedLookup<'a> {
    dict: &'a Map<String, Value>,
}

impl<'a> KeyedLookup<'a> {
    /// Wrap a mapping.
    #[must_use]
    pub fn new(dict: &'a Map<String, Value>) -> Self {
        Self { dict }
    }

    /// Wrap an arbitrary JSON value; non-objects are treated as empty.
    #[must_use]
    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Self::new(map),
            _ => Self::new(&EMPTY),
        }
    }

    /// True iff the mapping holds `key` itself.
    #[inline]
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.dict.contains_key(key)
    }

    /// The value at `key`, if present.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.dict.get(key)
    }

    /// The value at `key`, or `default` exactly when `has(key)` is false.
    #[inline]
    #[must_use]
    pub fn get_or(&self, key: &str, default: &'a Value) -> &'a Value {
        self.get(key).unwrap_or(default)
    }

    /// The value at `key` when it is a string.
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Shallow copy of the whole mapping.
    #[must_use]
    pub fn all(&self) -> Map<String, Value> {
        self.dict.clone()
    }

    /// Number of entries in the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dict.len()
    }

    /// True when the mapping has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }
}
