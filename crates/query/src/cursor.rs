//! Seek pagination
//!
//! A cursor remembers the sort-key values of the last record of a page and
//! turns them into the OR-of-ANDs rules that select the records strictly
//! after it in sort order. For keys `(k1, ..., kn)`:
//!
//! ```text
//! {k1 beyond} OR {k1 equal AND k2 beyond} OR ... OR {k1..k(n-1) equal AND kn beyond}
//! ```
//!
//! The identifier ascending is always the last key, mirroring the sorter's
//! tie-break, so the rules partition the result set exactly: concatenating
//! pages never repeats nor skips a record, even when records are inserted
//! or deleted between fetches.
//!
//! Undefined key values are expressed with `Has` filters: "equal to
//! undefined" is `has = false`; "beyond undefined" ascending is `has = true`
//! and descending selects nothing, so that rule is dropped.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};
use syncstore_core::{
    Comparison, Direction, FieldNames, Filter, PaginationRule, Record, Result, Sort, StoreError,
};

/// Position of the last record seen, under a sort specification
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationCursor {
    keys: Vec<Sort>,
    position: Vec<Option<Value>>,
}

/// The caller's sort keys, truncated after the id key or completed with it
fn effective_keys(sorting: &[Sort], fields: &FieldNames) -> Vec<Sort> {
    let mut keys = Vec::with_capacity(sorting.len() + 1);
    for sort in sorting {
        if keys.iter().any(|k: &Sort| k.field == sort.field) {
            continue;
        }
        keys.push(sort.clone());
        if sort.field == fields.id {
            return keys;
        }
    }
    keys.push(Sort::asc(fields.id.clone()));
    keys
}

fn equal_to(field: &str, value: &Option<Value>) -> Filter {
    match value {
        Some(v) => Filter::new(field, v.clone(), Comparison::Eq),
        None => Filter::new(field, false, Comparison::Has),
    }
}

fn beyond(field: &str, value: &Option<Value>, direction: Direction) -> Option<Filter> {
    match (value, direction) {
        (Some(v), Direction::Asc) => Some(Filter::new(field, v.clone(), Comparison::Gt)),
        (Some(v), Direction::Desc) => Some(Filter::new(field, v.clone(), Comparison::Lt)),
        (None, Direction::Asc) => Some(Filter::new(field, true, Comparison::Has)),
        (None, Direction::Desc) => None,
    }
}

impl PaginationCursor {
    /// Cursor positioned on `record`
    pub fn after(record: &Record, sorting: &[Sort], fields: &FieldNames) -> Self {
        let keys = effective_keys(sorting, fields);
        let position = keys.iter().map(|k| record.get(&k.field).cloned()).collect();
        Self { keys, position }
    }

    /// Sort keys the cursor follows, including the implicit id key
    pub fn keys(&self) -> &[Sort] {
        &self.keys
    }

    /// Rules selecting every record strictly after the position
    pub fn rules(&self) -> Vec<PaginationRule> {
        let mut rules = Vec::with_capacity(self.keys.len());
        for (i, key) in self.keys.iter().enumerate() {
            let Some(last) = beyond(&key.field, &self.position[i], key.direction) else {
                continue;
            };
            let mut filters: Vec<Filter> = self.keys[..i]
                .iter()
                .zip(&self.position[..i])
                .map(|(k, v)| equal_to(&k.field, v))
                .collect();
            filters.push(last);
            rules.push(PaginationRule::new(filters));
        }
        rules
    }

    /// Opaque token: URL-safe base64 of the JSON object of key values
    pub fn token(&self) -> String {
        let mut map = Map::new();
        for (key, value) in self.keys.iter().zip(&self.position) {
            if let Some(v) = value {
                map.insert(key.field.clone(), v.clone());
            }
        }
        URL_SAFE_NO_PAD.encode(Value::Object(map).to_string())
    }

    /// Rebuild a cursor from a token and the sort specification it was made under
    pub fn from_token(token: &str, sorting: &[Sort], fields: &FieldNames) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| StoreError::invalid_input(format!("pagination token is not base64: {}", e)))?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::invalid_input(format!("pagination token has invalid content: {}", e)))?;
        let last = Record::from_value(value)
            .map_err(|_| StoreError::invalid_input("pagination token has invalid content"))?;
        Ok(Self::after(&last, sorting, fields))
    }
}
