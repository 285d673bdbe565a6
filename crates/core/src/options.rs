//! Per-call options of mutating operations

use std::fmt;
use std::sync::Arc;

use crate::id::IdGenerator;
use crate::record::FieldNames;

/// Options of `create` and `update`
#[derive(Clone, Default)]
pub struct WriteOptions {
    /// Fields that must not be shared, all together, with another live record
    pub unique_fields: Vec<String>,
    /// Overrides the engine's id generator for this call
    pub id_generator: Option<Arc<dyn IdGenerator>>,
    /// Engine-assigned field names
    pub fields: FieldNames,
}

impl WriteOptions {
    /// Default options: no constraint, engine id generator, default names
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the unique fields
    pub fn unique_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Use a specific id generator for this call
    pub fn id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(generator);
        self
    }

    /// Override the engine-assigned field names
    pub fn fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }
}

impl fmt::Debug for WriteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOptions")
            .field("unique_fields", &self.unique_fields)
            .field("id_generator", &self.id_generator.is_some())
            .field("fields", &self.fields)
            .finish()
    }
}

/// Options of `delete` and `delete_all`
#[derive(Debug, Clone)]
pub struct DeleteOptions {
    /// Leave a tombstone behind (soft delete); `false` erases outright
    pub with_deleted: bool,
    /// Engine-assigned field names
    pub fields: FieldNames,
}

impl DeleteOptions {
    /// Soft delete with default field names
    pub fn new() -> Self {
        Self::default()
    }

    /// Erase without leaving a tombstone
    pub fn hard() -> Self {
        Self {
            with_deleted: false,
            ..Self::default()
        }
    }

    /// Override the engine-assigned field names
    pub fn fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            with_deleted: true,
            fields: FieldNames::default(),
        }
    }
}
