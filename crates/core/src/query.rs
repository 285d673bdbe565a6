//! Query description types: filters, sorting, pagination rules
//!
//! These are plain data; evaluation lives in `syncstore-query`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;
use crate::record::{FieldNames, Record};

/// Comparison operator of a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// Strictly less than
    Lt,
    /// Greater than or equal
    Gte,
    /// Less than or equal
    Lte,
    /// Not equal
    NotEq,
    /// Equal
    Eq,
    /// Strictly greater than
    Gt,
    /// Membership in a set (filter value is an array)
    In,
    /// Exclusion from a set (filter value is an array)
    NotIn,
    /// Field presence: `true` means defined, `false` means undefined
    Has,
}

impl Comparison {
    /// Operator symbol, for logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Gte => ">=",
            Comparison::Lte => "<=",
            Comparison::NotEq => "!=",
            Comparison::Eq => "==",
            Comparison::Gt => ">",
            Comparison::In => "in",
            Comparison::NotIn => "not in",
            Comparison::Has => "has",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the keyword prefixes used by querystring filters
/// (`lt`, `min`, `max`, `not`, `eq`, `gt`, `in`, `exclude`, `has`).
impl FromStr for Comparison {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lt" => Ok(Comparison::Lt),
            "min" => Ok(Comparison::Gte),
            "max" => Ok(Comparison::Lte),
            "not" => Ok(Comparison::NotEq),
            "eq" => Ok(Comparison::Eq),
            "gt" => Ok(Comparison::Gt),
            "in" => Ok(Comparison::In),
            "exclude" => Ok(Comparison::NotIn),
            "has" => Ok(Comparison::Has),
            other => Err(StoreError::invalid_input(format!(
                "unknown comparison keyword '{}'",
                other
            ))),
        }
    }
}

/// A single predicate: `field <operator> value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field the predicate reads
    pub field: String,
    /// Operand
    pub value: Value,
    /// Operator
    pub operator: Comparison,
}

impl Filter {
    /// Create a filter
    pub fn new(field: impl Into<String>, value: impl Into<Value>, operator: Comparison) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator,
        }
    }

    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, value, Comparison::Eq)
    }

    /// `field > version`, the "changed since" filter of sync pulls
    pub fn since(fields: &FieldNames, version: u64) -> Self {
        Self::new(fields.modified.clone(), version, Comparison::Gt)
    }

    /// `field < version`
    pub fn before(fields: &FieldNames, version: u64) -> Self {
        Self::new(fields.modified.clone(), version, Comparison::Lt)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest first
    Asc,
    /// Largest first
    Desc,
}

impl Direction {
    /// Negative means descending, anything else ascending
    pub fn from_sign(sign: i32) -> Self {
        if sign < 0 {
            Direction::Desc
        } else {
            Direction::Asc
        }
    }
}

/// A sort key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    /// Field to sort by
    pub field: String,
    /// Direction
    pub direction: Direction,
}

impl Sort {
    /// Create a sort key
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Ascending sort key
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Asc)
    }

    /// Descending sort key
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Desc)
    }
}

/// Filters combined with AND; a request's rules are combined with OR
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginationRule(pub Vec<Filter>);

impl PaginationRule {
    /// Create a rule from its filters
    pub fn new(filters: Vec<Filter>) -> Self {
        PaginationRule(filters)
    }

    /// The AND-combined filters
    pub fn filters(&self) -> &[Filter] {
        &self.0
    }
}

/// Parameters of a `get_all` call
#[derive(Debug, Clone, Default)]
pub struct GetAllQuery {
    /// AND-combined filters
    pub filters: Vec<Filter>,
    /// Sort keys, most significant first
    pub sorting: Vec<Sort>,
    /// OR-combined seek rules of the page to fetch
    pub pagination_rules: Vec<PaginationRule>,
    /// Maximum number of records to return
    pub limit: Option<usize>,
    /// Merge tombstones into the result
    pub include_deleted: bool,
    /// Engine-assigned field names
    pub fields: FieldNames,
}

impl GetAllQuery {
    /// Query returning every live record
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Replace the filters
    pub fn filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    /// Add a sort key
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorting.push(sort);
        self
    }

    /// Replace the sort keys
    pub fn sorting(mut self, sorting: Vec<Sort>) -> Self {
        self.sorting = sorting;
        self
    }

    /// Replace the pagination rules
    pub fn pagination_rules(mut self, rules: Vec<PaginationRule>) -> Self {
        self.pagination_rules = rules;
        self
    }

    /// Set the page size
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Include tombstones
    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    /// Override the engine-assigned field names
    pub fn fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }
}

/// Result of a `get_all` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Filtered, sorted, paginated and limited records
    pub records: Vec<Record>,
    /// Number of records matching the filters, ignoring pagination and limit
    pub total: usize,
}

impl Page {
    /// True when fewer records than `limit` came back: nothing follows
    pub fn is_last(&self, limit: Option<usize>) -> bool {
        match limit {
            Some(limit) => self.records.len() < limit,
            None => true,
        }
    }

    /// Last record of the page, the position to continue from
    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }
}
