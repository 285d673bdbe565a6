//! Uniqueness constraints
//!
//! Each listed field is its own constraint. A write violates one when
//! another live record of the same collection holds an equal value on that
//! field. Fields the incoming record leaves out or sets to `null` are not
//! checked.
//!
//! The check runs inside the backend write that stores the record, so two
//! writers racing on the same values cannot both pass it.

use serde_json::Value;
use syncstore_core::{CollectionView, FieldNames, Filter, Record, Result, StoreError};
use syncstore_query::matches;

/// Checks a record against a collection's uniqueness constraints
#[derive(Debug, Clone)]
pub struct UnicityEnforcer {
    unique_fields: Vec<String>,
}

impl UnicityEnforcer {
    /// One constraint per field of `unique_fields`
    ///
    /// Duplicates and the engine-assigned id and version fields are
    /// ignored: ids are unique by construction and versions are not caller
    /// data.
    pub fn new(unique_fields: &[String], fields: &FieldNames) -> Self {
        let mut kept: Vec<String> = Vec::with_capacity(unique_fields.len());
        for field in unique_fields {
            if *field == fields.id || *field == fields.modified || kept.contains(field) {
                continue;
            }
            kept.push(field.clone());
        }
        Self {
            unique_fields: kept,
        }
    }

    /// True when no field is constrained
    pub fn is_empty(&self) -> bool {
        self.unique_fields.is_empty()
    }

    /// Equality filters `record` imposes on other records
    fn filters(&self, record: &Record) -> Vec<Filter> {
        self.unique_fields
            .iter()
            .filter_map(|field| match record.get(field) {
                None | Some(Value::Null) => None,
                Some(value) => Some(Filter::eq(field.clone(), value.clone())),
            })
            .collect()
    }

    /// Fail with `UnicityConflict` if a live record other than `own_id`
    /// shares a constrained value with `record`
    ///
    /// The error names the first such record, in backend order, and the
    /// fields it shares.
    pub fn check<V: CollectionView + ?Sized>(
        &self,
        view: &V,
        record: &Record,
        own_id: &str,
        fields: &FieldNames,
    ) -> Result<()> {
        let filters = self.filters(record);
        if filters.is_empty() {
            return Ok(());
        }
        for existing in view.live_records()? {
            if existing.id == own_id {
                continue;
            }
            let shared: Vec<String> = filters
                .iter()
                .filter(|f| matches(&existing.data, f))
                .map(|f| f.field.clone())
                .collect();
            if !shared.is_empty() {
                return Err(StoreError::conflict(shared, existing.to_record(fields)));
            }
        }
        Ok(())
    }
}
