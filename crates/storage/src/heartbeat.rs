//! Heartbeat probe
//!
//! Exercises the write path and the delete path alternately, picking one at
//! random on each call, against a reserved collection.

use serde_json::Value;
use syncstore_core::{DeleteOptions, RandomSource, Record, WriteOptions};

use crate::facade::Storage;

/// Collection and parent the probe writes to
pub const HEARTBEAT_COLLECTION: &str = "__heartbeat__";

/// Default probability of taking the delete branch
pub const DEFAULT_DELETE_RATE: f64 = 0.6;

/// Run one probe against `storage`; any error yields `false`
///
/// With probability `delete_rate` the probe hard-deletes every record of
/// the heartbeat collection (no tombstones are kept, so repeated pings do
/// not accumulate them). Otherwise it creates one `{"__heartbeat__": true}`
/// record there.
pub fn probe<S: Storage + ?Sized>(storage: &S, random: &dyn RandomSource, delete_rate: f64) -> bool {
    let outcome = if random.next_f64() < delete_rate {
        storage
            .delete_all(HEARTBEAT_COLLECTION, HEARTBEAT_COLLECTION, &[], &DeleteOptions::hard())
            .map(|_| ())
    } else {
        let mut record = Record::new();
        record.insert(HEARTBEAT_COLLECTION, Value::Bool(true));
        storage
            .create(HEARTBEAT_COLLECTION, HEARTBEAT_COLLECTION, record, &WriteOptions::new())
            .map(|_| ())
    };
    match outcome {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(backend = storage.backend_name(), error = %e, "Heartbeat failed");
            false
        }
    }
}
