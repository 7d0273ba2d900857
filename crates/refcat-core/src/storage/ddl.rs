//! DDL generated from model definitions.

use crate::catalog::{ColumnDef, ModelDef};

/// Quote an SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE IF NOT EXISTS` statement for a model.
pub fn create_table(model: &ModelDef) -> String {
    let columns: Vec<String> = model.columns.iter().map(column_sql).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(&model.identifier),
        columns.join(",\n    ")
    )
}

/// `CREATE INDEX IF NOT EXISTS` statements for the model's indexed columns.
pub fn create_indexes(model: &ModelDef) -> Vec<String> {
    model
        .indexed_columns()
        .map(|column| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote_ident(&format!("ix_{}_{}", model.identifier, column.name)),
                quote_ident(&model.identifier),
                quote_ident(&column.name)
            )
        })
        .collect()
}

fn column_sql(column: &ColumnDef) -> String {
    let sql_type = column
        .column_type
        .resolve()
        .map(|s| s.sql_name().to_string())
        .unwrap_or_else(|| column.column_type.type_name());

    let mut sql = format!("{} {}", quote_ident(&column.name), sql_type);
    if column.primary_key {
        sql.push_str(" PRIMARY KEY");
    } else if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.server_default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default.sql());
    }
    if let Some(fk) = &column.foreign_key {
        sql.push(' ');
        sql.push_str(&fk.references_clause());
    }
    sql
}
