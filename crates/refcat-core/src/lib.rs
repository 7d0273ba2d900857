//! refcat core - model registry, schema derivation, storage and catalog services.
//!
//! Models are declared as static descriptors. The registry serves them by
//! identifier, validation schemas are derived from their columns on demand,
//! and the catalog services read and write their rows in SQLite.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod catalog;
pub mod error;
pub mod schema;
pub mod seed;
pub mod service;
pub mod storage;
pub mod value;

pub use catalog::{
    ColumnDef, ColumnType, ForeignKey, ModelDef, ModelKind, ModelRegistry, ReferentialAction,
    RegistryBuild, ScalarType, ScopeRule, ServerDefault, SCOPE_FIELD,
};
pub use error::{Error, FieldIssue, SchemaError, ValidationError};
pub use schema::{derive_schema, insert_schema, patch_schema, SchemaField, ValidatedBatch, ValidationSchema};
pub use seed::seed_demo;
pub use service::{CatalogDescription, CatalogService, ColumnDescription, ForeignKeyTarget};
pub use storage::{Session, Store, StoreConfig};
pub use value::{CatalogRow, Value};
