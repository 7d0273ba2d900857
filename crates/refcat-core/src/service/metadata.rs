//! Catalog discovery: describing the shape of reference models.

use serde::Serialize;

use crate::catalog::{ColumnDef, ModelDef, ModelRegistry};

/// Shape of one catalog, as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogDescription {
    /// Table identifier.
    pub name: String,
    /// Table title.
    pub title: Option<String>,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDescription>,
}

/// Shape of one catalog column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    /// Column name.
    pub name: String,
    /// Column title.
    pub title: Option<String>,
    /// Stringified column type.
    #[serde(rename = "type")]
    pub column_type: String,
    /// Whether a value is required (the column is not nullable).
    pub required: bool,
    /// Referenced table and column.
    pub foreign_key: Option<ForeignKeyTarget>,
}

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyTarget {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

/// Describe every reference model, in registration order.
///
/// Models with any other classification are writable but not listed.
pub fn list_catalogs(registry: &ModelRegistry) -> Vec<CatalogDescription> {
    registry.reference_models().map(describe).collect()
}

/// Describe a single model.
pub fn describe(model: &ModelDef) -> CatalogDescription {
    CatalogDescription {
        name: model.identifier.clone(),
        title: model.title.clone(),
        columns: model.columns.iter().map(describe_column).collect(),
    }
}

fn describe_column(column: &ColumnDef) -> ColumnDescription {
    ColumnDescription {
        name: column.name.clone(),
        title: column.title.clone(),
        column_type: column.column_type.type_name(),
        required: !column.nullable,
        foreign_key: column.foreign_key.as_ref().map(|fk| ForeignKeyTarget {
            table: fk.table.clone(),
            column: fk.column.clone(),
        }),
    }
}
