//! Record access and row flattening

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error coercing a payload item into a record
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    #[error("record is not a key/value mapping (got {0})")]
    NotAMapping(&'static str),
}

/// Read-only keyed access over record-like values
pub trait Record {
    /// Value stored under a column identifier, if any
    fn value(&self, key: &str) -> Option<&Value>;

    /// Column identifiers in record order
    fn columns(&self) -> Vec<String>;
}

impl Record for Map<String, Value> {
    fn value(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn columns(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

impl Record for IndexMap<String, Value> {
    fn value(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn columns(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

/// Coerce a payload item into a record mapping
pub(crate) fn as_record(item: &Value) -> Result<&Map<String, Value>, RecordError> {
    match item {
        Value::Object(map) => Ok(map),
        other => Err(RecordError::NotAMapping(value_kind(other))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Lazy record stream over a payload's items
pub struct Flatten<'a> {
    items: std::slice::Iter<'a, Value>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = Result<&'a Map<String, Value>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(as_record)
    }
}

/// Flatten payload items into records, one-to-one and in input order.
///
/// Values are carried through untouched; a nested mapping or sequence is
/// stringified later, at the point a cell is read, not here. Items that are
/// not key/value mappings surface as errors when pulled.
pub fn flatten_data(items: &[Value]) -> Flatten<'_> {
    Flatten {
        items: items.iter(),
    }
}
