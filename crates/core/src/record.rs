//! Records, tombstones and the names of engine-assigned fields
//!
//! A [`Record`] is a JSON object. Two attributes are assigned by the engine
//! and live inside the object under configurable names: the identifier and
//! the version (`last_modified`). A tombstone is a record reduced to its
//! identifier, its deletion version and a `deleted = true` marker.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Result, StoreError};

/// Default name of the identifier field
pub const DEFAULT_ID_FIELD: &str = "id";
/// Default name of the version field
pub const DEFAULT_MODIFIED_FIELD: &str = "last_modified";
/// Default name of the tombstone marker field
pub const DEFAULT_DELETED_FIELD: &str = "deleted";

/// Names under which engine-assigned attributes are stored in a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldNames {
    /// Identifier field
    pub id: String,
    /// Version field
    pub modified: String,
    /// Tombstone marker field
    pub deleted: String,
}

impl FieldNames {
    /// Override the identifier field name
    pub fn with_id(mut self, name: impl Into<String>) -> Self {
        self.id = name.into();
        self
    }

    /// Override the version field name
    pub fn with_modified(mut self, name: impl Into<String>) -> Self {
        self.modified = name.into();
        self
    }

    /// Override the tombstone marker field name
    pub fn with_deleted(mut self, name: impl Into<String>) -> Self {
        self.deleted = name.into();
        self
    }
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            id: DEFAULT_ID_FIELD.to_string(),
            modified: DEFAULT_MODIFIED_FIELD.to_string(),
            deleted: DEFAULT_DELETED_FIELD.to_string(),
        }
    }
}

/// Compound key of a collection: a named partition scoped to a parent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionKey {
    /// Collection name
    pub collection_id: String,
    /// Parent identifier (tenant, user, bucket, ...)
    pub parent_id: String,
}

impl CollectionKey {
    /// Create a collection key
    pub fn new(collection_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            parent_id: parent_id.into(),
        }
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent_id, self.collection_id)
    }
}

/// A structured record: field name to JSON value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Record(Map::new())
    }

    /// Build a record from a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Record(map)),
            other => Err(StoreError::invalid_input(format!(
                "record must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Build the minimal tombstone left behind by a deletion
    pub fn tombstone(id: &str, version: u64, fields: &FieldNames) -> Self {
        let mut map = Map::new();
        map.insert(fields.id.clone(), Value::String(id.to_string()));
        map.insert(fields.modified.clone(), Value::from(version));
        map.insert(fields.deleted.clone(), Value::Bool(true));
        Record(map)
    }

    /// Field value, if present
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// True if the field is present (even when `null`)
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(field, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Identifier, when present and a string
    pub fn id(&self, fields: &FieldNames) -> Option<&str> {
        self.0.get(&fields.id).and_then(Value::as_str)
    }

    /// Version, when present and an unsigned integer
    pub fn last_modified(&self, fields: &FieldNames) -> Option<u64> {
        self.0.get(&fields.modified).and_then(Value::as_u64)
    }

    /// True if this record is a tombstone
    pub fn is_deleted(&self, fields: &FieldNames) -> bool {
        matches!(self.0.get(&fields.deleted), Some(Value::Bool(true)))
    }

    /// Set identifier and version in one go
    pub fn stamp(&mut self, id: &str, version: u64, fields: &FieldNames) {
        self.0.insert(fields.id.clone(), Value::String(id.to_string()));
        self.0.insert(fields.modified.clone(), Value::from(version));
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying JSON object
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Consume into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Record(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self> {
        Record::from_value(value)
    }
}

/// Human-readable JSON type name, used in error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
