//! Copy-on-write hash tables
//!
//! Keys are restricted to nil, numbers and printable text. Setting a key to
//! nil removes it, so a table never stores nil values.

use super::{List, Value};
use crate::errors::RuntimeError;
use crate::Result;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Prepared table key
#[derive(Debug, Clone)]
pub enum Key {
    Nil,
    Number(f64),
    Text(Arc<str>),
}

impl Key {
    /// Prepare a value for use as a key
    pub fn from_value(value: &Value) -> Result<Key> {
        match value {
            Value::Nil => Ok(Key::Nil),
            Value::Number(n) if n.is_nan() => Err(RuntimeError::InvalidKey("NaN".into())),
            // -0.0 and 0.0 name the same entry
            Value::Number(n) => Ok(Key::Number(if *n == 0.0 { 0.0 } else { *n })),
            Value::Pair(list) => list
                .to_text()
                .map(|text| Key::Text(text.into()))
                .ok_or_else(|| RuntimeError::InvalidKey(format!("{} is not printable text", value))),
            other => Err(RuntimeError::InvalidKey(format!("{} keys are not supported", other.kind()))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Nil => Value::Nil,
            Key::Number(n) => Value::Number(*n),
            Key::Text(text) => Value::Pair(List::from_text(text)),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Key::Nil => 0,
            Key::Number(_) => 1,
            Key::Text(_) => 2,
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Number(a), Key::Number(b)) => a.total_cmp(b),
            (Key::Text(a), Key::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Text(text) => write!(f, "{:?}", text),
            other => write!(f, "{}", other.to_value()),
        }
    }
}

/// Immutable map from keys to non-nil values
#[derive(Clone, Default)]
pub struct HashTable {
    entries: Arc<BTreeMap<Key, Value>>,
}

impl HashTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// New table with `key` bound to `value`; a nil `value` removes the key
    pub fn with(&self, key: &Value, value: Value) -> Result<HashTable> {
        let key = Key::from_value(key)?;
        let mut table = self.clone();
        let entries = Arc::make_mut(&mut table.entries);
        if value.is_nil() {
            entries.remove(&key);
        } else {
            entries.insert(key, value);
        }
        Ok(table)
    }

    pub fn without(&self, key: &Value) -> Result<HashTable> {
        self.with(key, Value::Nil)
    }

    /// Look up a key; `Ok(None)` when absent
    pub fn item(&self, key: &Value) -> Result<Option<Value>> {
        let key = Key::from_value(key)?;
        Ok(self.entries.get(&key).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in key order
    pub fn keys(&self) -> List {
        self.entries.keys().map(Key::to_value).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter()
    }

    pub(crate) fn ptr_eq(&self, other: &HashTable) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for HashTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
