//! Record identifier generation
//!
//! The generator is an explicit dependency: the engine receives one at
//! construction and a call may override it through `WriteOptions`.

use uuid::Uuid;

/// Produces identifiers for records created without one
pub trait IdGenerator: Send + Sync {
    /// A fresh identifier
    fn generate(&self) -> String;

    /// True if `id` has the shape this generator produces
    fn is_valid(&self, id: &str) -> bool {
        !id.is_empty()
    }
}

/// Random (v4) UUIDs in hyphenated lowercase form
#[derive(Debug, Clone, Copy, Default)]
pub struct Uuid4;

impl IdGenerator for Uuid4 {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn is_valid(&self, id: &str) -> bool {
        Uuid::parse_str(id).is_ok()
    }
}
