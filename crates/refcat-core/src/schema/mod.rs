//! Validation schemas derived from model definitions.
//!
//! A [`ValidationSchema`] is rebuilt for every validation call; it is never
//! cached, so it always reflects the registered model.

mod derive;
mod validate;

pub use derive::{derive_schema, insert_schema, patch_schema, SchemaField};
pub use validate::ValidatedBatch;

/// A derived, per-call description of the fields a payload may carry.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSchema {
    /// Schema name (the model identifier).
    pub name: String,
    /// Fields in column order.
    pub fields: Vec<SchemaField>,
}

impl ValidationSchema {
    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
