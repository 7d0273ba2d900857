//! Model catalog for refcat.
//!
//! The catalog holds the static descriptions of every served table: columns,
//! types, foreign keys, titles, classification and scope rules.

mod entity;
mod field;
pub mod models;
pub mod registry;
mod relation;
mod types;

pub use entity::{ModelDef, ModelKind, ScopeRule, MAX_SCOPE_DEPTH, SCOPE_FIELD};
pub use field::{ColumnDef, ServerDefault};
pub use registry::{ModelRegistry, RegistryBuild};
pub use relation::{ForeignKey, ReferentialAction};
pub use types::{ColumnType, ScalarType};
