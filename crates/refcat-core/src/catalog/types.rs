//! Core type definitions for the catalog.

use std::fmt;

/// Scalar data types a column can be stored and validated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Boolean value.
    Boolean,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInteger,
    /// 64-bit floating point.
    Float,
    /// Short UTF-8 string.
    String,
    /// Unbounded UTF-8 text.
    Text,
    /// Calendar date without time.
    Date,
    /// Date and time without timezone.
    DateTime,
}

/// Column types as declared on a model.
///
/// Custom types wrap a storage scalar the same way a user-defined SQL type
/// decorates a builtin one. A custom type without a storage scalar cannot be
/// validated and makes its model unservable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// A builtin scalar.
    Scalar(ScalarType),
    /// A user-defined type.
    Custom {
        /// Name of the type as reported to clients.
        name: String,
        /// Scalar the type is stored as, if known.
        storage: Option<ScalarType>,
    },
}

impl ScalarType {
    /// SQL type name used for DDL and for client discovery.
    pub fn sql_name(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "BOOLEAN",
            ScalarType::Integer => "INTEGER",
            ScalarType::BigInteger => "BIGINT",
            ScalarType::Float => "FLOAT",
            ScalarType::String => "VARCHAR",
            ScalarType::Text => "TEXT",
            ScalarType::Date => "DATE",
            ScalarType::DateTime => "DATETIME",
        }
    }

    /// Human-readable name used in validation messages.
    pub fn describe(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "boolean",
            ScalarType::Integer | ScalarType::BigInteger => "integer",
            ScalarType::Float => "number",
            ScalarType::String | ScalarType::Text => "string",
            ScalarType::Date => "date (YYYY-MM-DD)",
            ScalarType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl ColumnType {
    /// Resolve the scalar this column is validated and stored as.
    pub fn resolve(&self) -> Option<ScalarType> {
        match self {
            ColumnType::Scalar(s) => Some(*s),
            ColumnType::Custom { storage, .. } => *storage,
        }
    }

    /// Type name reported to clients.
    pub fn type_name(&self) -> String {
        match self {
            ColumnType::Scalar(s) => s.sql_name().to_string(),
            ColumnType::Custom { name, .. } => name.clone(),
        }
    }
}

impl From<ScalarType> for ColumnType {
    fn from(scalar: ScalarType) -> Self {
        ColumnType::Scalar(scalar)
    }
}
