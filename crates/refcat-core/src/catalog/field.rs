//! Column definitions for models.

use super::relation::ForeignKey;
use super::types::ColumnType;

/// A column definition within a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared column type.
    pub column_type: ColumnType,
    /// Whether the column accepts null.
    pub nullable: bool,
    /// Whether the column is the primary key.
    pub primary_key: bool,
    /// Human-readable title (the column comment).
    pub title: Option<String>,
    /// Foreign key target, if any.
    pub foreign_key: Option<ForeignKey>,
    /// Value the storage engine fills in when the column is omitted.
    pub server_default: Option<ServerDefault>,
    /// Whether this column should be indexed.
    pub indexed: bool,
}

/// Default value applied by the storage engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerDefault {
    /// Current timestamp, truncated to seconds.
    CurrentTimestamp,
}

impl ServerDefault {
    /// SQL `DEFAULT` expression.
    pub fn sql(&self) -> &'static str {
        match self {
            ServerDefault::CurrentTimestamp => "CURRENT_TIMESTAMP",
        }
    }
}

impl ColumnDef {
    /// Create a new non-nullable column.
    pub fn new(name: impl Into<String>, column_type: impl Into<ColumnType>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            nullable: false,
            primary_key: false,
            title: None,
            foreign_key: None,
            server_default: None,
            indexed: false,
        }
    }

    /// Create a nullable column.
    pub fn nullable(name: impl Into<String>, column_type: impl Into<ColumnType>) -> Self {
        Self {
            nullable: true,
            ..Self::new(name, column_type)
        }
    }

    /// Create an integer primary key column.
    pub fn primary_key(name: impl Into<String>) -> Self {
        Self {
            primary_key: true,
            ..Self::new(name, super::ScalarType::Integer)
        }
    }

    /// Set the column title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Reference another model's column.
    pub fn references(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }

    /// Set the server-side default.
    pub fn with_server_default(mut self, default: ServerDefault) -> Self {
        self.server_default = Some(default);
        self
    }

    /// Mark as indexed.
    pub fn with_index(mut self) -> Self {
        self.indexed = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::ScalarType;

    #[test]
    fn test_column_def_builder() {
        let column = ColumnDef::new("section_id", ScalarType::Integer)
            .with_title("Section")
            .references(ForeignKey::new("section", "id").cascade())
            .with_index();

        assert_eq!(column.name, "section_id");
        assert!(!column.nullable);
        assert!(column.indexed);
        assert_eq!(column.foreign_key.as_ref().map(|fk| fk.table.as_str()), Some("section"));
        assert_eq!(column.title.as_deref(), Some("Section"));
    }

    #[test]
    fn test_nullable_column() {
        let column = ColumnDef::nullable("description", ScalarType::String);

        assert!(column.nullable);
        assert!(!column.primary_key);
        assert!(column.server_default.is_none());
    }

    #[test]
    fn test_primary_key_column() {
        let column = ColumnDef::primary_key("id");
        assert!(column.primary_key);
        assert_eq!(column.column_type, ColumnType::Scalar(ScalarType::Integer));
    }
}
