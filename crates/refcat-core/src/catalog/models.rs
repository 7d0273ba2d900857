//! Declared models served by refcat.

use super::{ColumnDef, ForeignKey, ModelDef, ScalarType, ServerDefault, SCOPE_FIELD};

/// All declared models, in registration order.
pub fn declared() -> Vec<ModelDef> {
    vec![advices(), section(), indicator_types(), indicators()]
}

/// Advice log entries.
pub fn advices() -> ModelDef {
    ModelDef::dynamic("advices_d")
        .with_title("Advices")
        .with_column(ColumnDef::primary_key("id").with_title("Identifier"))
        .with_column(
            ColumnDef::new("dt", ScalarType::DateTime)
                .with_title("Recorded at")
                .with_server_default(ServerDefault::CurrentTimestamp)
                .with_index(),
        )
}

/// Top-level sections.
pub fn section() -> ModelDef {
    ModelDef::reference("section")
        .with_title("Section")
        .with_column(ColumnDef::primary_key("id").with_title("Identifier"))
        .with_column(ColumnDef::new("title", ScalarType::String).with_title("Title"))
        .with_column(ColumnDef::nullable("description", ScalarType::String).with_title("Description"))
}

/// Indicator value types, each belonging to a section.
pub fn indicator_types() -> ModelDef {
    ModelDef::reference("indicator_types")
        .with_title("Indicator type")
        .with_column(ColumnDef::primary_key("id").with_title("Identifier"))
        .with_column(ColumnDef::new("title", ScalarType::String).with_title("Title"))
        .with_column(ColumnDef::nullable("description", ScalarType::String).with_title("Description"))
        .with_column(
            ColumnDef::new(SCOPE_FIELD, ScalarType::Integer)
                .with_title("Section")
                .references(ForeignKey::new("section", "id").cascade())
                .with_index(),
        )
        .scoped_by(SCOPE_FIELD)
}

/// Indicators; their section comes from their value type.
pub fn indicators() -> ModelDef {
    ModelDef::reference("indicators")
        .with_title("Indicators")
        .with_column(ColumnDef::primary_key("id").with_title("Identifier"))
        .with_column(ColumnDef::new("title", ScalarType::String).with_title("Title"))
        .with_column(
            ColumnDef::new("value_type_id", ScalarType::Integer)
                .with_title("Type")
                .references(ForeignKey::new("indicator_types", "id").cascade())
                .with_index(),
        )
        .with_column(ColumnDef::nullable("is_used", ScalarType::Boolean).with_title("Shown in the interface"))
        .inherits_scope("value_type_id", SCOPE_FIELD)
}
