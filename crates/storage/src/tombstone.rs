//! Tombstone tracking
//!
//! Deleting a record leaves a tombstone holding only its id and the
//! deletion version. Sync clients pull tombstones together with live
//! records (`include_deleted`) to learn what disappeared since a version.
//! A tombstone lives until it is purged or the id is written again.

use syncstore_core::{CollectionTxn, CollectionView, FieldNames, Record, Result};

/// Replace the live record `id` with a tombstone stamped `version`
///
/// Returns the tombstone as callers see it.
pub fn bury(txn: &mut dyn CollectionTxn, id: &str, version: u64, fields: &FieldNames) -> Result<Record> {
    txn.remove_live(id)?;
    txn.put_tombstone(id, version)?;
    Ok(Record::tombstone(id, version, fields))
}

/// Drop the tombstone of an id that is being written again
pub fn revive(txn: &mut dyn CollectionTxn, id: &str) -> Result<()> {
    if txn.remove_tombstone(id)? {
        tracing::trace!(id, "tombstone replaced by live record");
    }
    Ok(())
}

/// Remove tombstones strictly older than `before`, or all of them
pub fn purge(txn: &mut dyn CollectionTxn, before: Option<u64>) -> Result<usize> {
    txn.purge_tombstones(before)
}

/// Records a `get_all` works on: live records, plus tombstones if asked
pub fn candidates(view: &dyn CollectionView, include_deleted: bool, fields: &FieldNames) -> Result<Vec<Record>> {
    let live = view.live_records()?;
    let mut records: Vec<Record> = live.iter().map(|r| r.to_record(fields)).collect();
    if include_deleted {
        records.extend(
            view.tombstones()?
                .into_iter()
                .map(|(id, version)| Record::tombstone(&id, version, fields)),
        );
    }
    Ok(records)
}
