//! Deterministic multi-key ordering
//!
//! Records are ordered by each sort key in turn; when every key ties, the
//! identifier ascending decides. Identifiers are unique within a result set,
//! so the order is total and the same input always comes out the same way.

use std::cmp::Ordering;

use syncstore_core::{Direction, FieldNames, Record, Sort};

use crate::order::compare_fields;

/// Compare two records under `sorting`, with the final `id` tie-break
pub fn compare_records(a: &Record, b: &Record, sorting: &[Sort], fields: &FieldNames) -> Ordering {
    for sort in sorting {
        let ord = compare_fields(a.get(&sort.field), b.get(&sort.field));
        let ord = match sort.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.id(fields).cmp(&b.id(fields))
}

/// Sort records in place (stable)
pub fn sort_records(records: &mut [Record], sorting: &[Sort], fields: &FieldNames) {
    records.sort_by(|a, b| compare_records(a, b, sorting, fields));
}
