//! Query evaluation for Syncstore
//!
//! - `order`: total order over JSON values and undefined fields
//! - `filter`: predicate evaluation, AND of filters, OR of pagination rules
//! - `sort`: multi-key ordering with the final id tie-break
//! - `cursor`: seek pagination rules and opaque tokens
//! - `pipeline`: the `get_all` read path

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod filter;
pub mod order;
pub mod pipeline;
pub mod sort;

pub use cursor::PaginationCursor;
pub use filter::{matches, matches_all, matches_any_rule};
pub use order::{compare_fields, compare_values, values_equal};
pub use pipeline::execute;
pub use sort::{compare_records, sort_records};
