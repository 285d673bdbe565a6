//! The `get_all` read path: filter, count, paginate, sort, limit

use syncstore_core::{GetAllQuery, Page, Record};

use crate::filter::{matches_all, matches_any_rule};
use crate::sort::sort_records;

/// Run `query` over `candidates` (live records, plus tombstones if requested)
///
/// `total` counts the records matching the filters before pagination and
/// limit apply. A `limit` of zero means no limit. `max_fetch_size` caps the
/// page whatever the limit.
pub fn execute(mut candidates: Vec<Record>, query: &GetAllQuery, max_fetch_size: Option<usize>) -> Page {
    candidates.retain(|r| matches_all(r, &query.filters));
    let total = candidates.len();

    if !query.pagination_rules.is_empty() {
        candidates.retain(|r| matches_any_rule(r, &query.pagination_rules));
    }
    sort_records(&mut candidates, &query.sorting, &query.fields);

    let cap = match (query.limit.filter(|l| *l > 0), max_fetch_size) {
        (Some(limit), Some(max)) => Some(limit.min(max)),
        (limit, max) => limit.or(max),
    };
    if let Some(cap) = cap {
        if candidates.len() > cap {
            tracing::trace!(matched = candidates.len(), cap, "truncating page");
            candidates.truncate(cap);
        }
    }

    Page {
        records: candidates,
        total,
    }
}
