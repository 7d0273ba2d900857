//! Deriving validation schemas from model definitions.

use crate::catalog::ModelDef;
use crate::error::SchemaError;
use crate::value::Value;

use super::ValidationSchema;

/// A field of a derived validation schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Field (column) name.
    pub name: String,
    /// Scalar type values are coerced to.
    pub scalar: crate::catalog::ScalarType,
    /// Whether the field must be present and non-null.
    pub required: bool,
    /// Value used when an optional field is absent.
    pub default: Option<Value>,
}

/// Derive a validation schema from a model.
///
/// Columns named in `exclude` are skipped. A field is optional when the
/// column is nullable or `force_optional` is set; optional fields default
/// to null, required fields have no default. Field order follows column
/// order.
pub fn derive_schema(
    model: &ModelDef,
    exclude: &[&str],
    force_optional: bool,
) -> Result<ValidationSchema, SchemaError> {
    let mut fields = Vec::with_capacity(model.columns.len());

    for column in &model.columns {
        if exclude.contains(&column.name.as_str()) {
            continue;
        }

        let scalar = column
            .column_type
            .resolve()
            .ok_or_else(|| SchemaError::UnresolvedColumnType {
                model: model.identifier.clone(),
                column: column.name.clone(),
            })?;

        let optional = force_optional || column.nullable;
        fields.push(SchemaField {
            name: column.name.clone(),
            scalar,
            required: !optional,
            default: optional.then_some(Value::Null),
        });
    }

    Ok(ValidationSchema {
        name: model.identifier.clone(),
        fields,
    })
}

/// Schema for inserts: every column except the primary key.
pub fn insert_schema(model: &ModelDef) -> Result<ValidationSchema, SchemaError> {
    let pk = model.primary_key().map(|c| c.name.as_str());
    derive_schema(model, pk.as_slice(), false)
}

/// Schema for partial updates: like [`insert_schema`], with every field optional.
pub fn patch_schema(model: &ModelDef) -> Result<ValidationSchema, SchemaError> {
    let pk = model.primary_key().map(|c| c.name.as_str());
    derive_schema(model, pk.as_slice(), true)
}
