//! Model definitions.

use super::field::ColumnDef;

/// Name of the scope field every scoped row exposes.
pub const SCOPE_FIELD: &str = "section_id";

/// Longest chain of inherited scopes a model may sit at the end of.
pub const MAX_SCOPE_DEPTH: usize = 8;

/// A model definition (table schema).
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    /// External table identifier (unique within the registry).
    pub identifier: String,
    /// Human-readable title (the table comment).
    pub title: Option<String>,
    /// Classification tag.
    pub kind: ModelKind,
    /// Column definitions in declaration order.
    pub columns: Vec<ColumnDef>,
    /// How a row's scope id is obtained.
    pub scope: ScopeRule,
}

/// Classification of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelKind {
    /// Reference data, discoverable as a catalog.
    Reference,
    /// Time-series or log-style data, writable but not listed.
    Dynamic,
}

/// How the scope id of a row is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeRule {
    /// The model has no scope; reads return every row.
    Unscoped,
    /// The scope id is stored in a column of the model itself.
    Column(String),
    /// The scope id is inherited from the row referenced by `via`.
    ///
    /// `via` must be a foreign key column; the parent's scope is read from
    /// its `parent_column` (or its own scope rule if that column is
    /// itself inherited).
    Inherited {
        /// Foreign key column on this model.
        via: String,
        /// Scope column on the referenced model.
        parent_column: String,
    },
}

impl ModelKind {
    /// The tag string.
    pub fn tag(&self) -> &'static str {
        match self {
            ModelKind::Reference => "reference",
            ModelKind::Dynamic => "dynamic",
        }
    }
}

impl ModelDef {
    /// Create a new model definition.
    pub fn new(identifier: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            kind,
            columns: Vec::new(),
            scope: ScopeRule::Unscoped,
        }
    }

    /// Create a reference model.
    pub fn reference(identifier: impl Into<String>) -> Self {
        Self::new(identifier, ModelKind::Reference)
    }

    /// Create a dynamic model.
    pub fn dynamic(identifier: impl Into<String>) -> Self {
        Self::new(identifier, ModelKind::Dynamic)
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a column to the model.
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Scope rows by one of the model's own columns.
    pub fn scoped_by(mut self, column: impl Into<String>) -> Self {
        self.scope = ScopeRule::Column(column.into());
        self
    }

    /// Inherit the scope through a foreign key.
    pub fn inherits_scope(mut self, via: impl Into<String>, parent_column: impl Into<String>) -> Self {
        self.scope = ScopeRule::Inherited {
            via: via.into(),
            parent_column: parent_column.into(),
        };
        self
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get the primary key column.
    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Get all indexed columns.
    pub fn indexed_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.indexed)
    }

    /// Check if this model is discoverable as a catalog.
    pub fn is_reference(&self) -> bool {
        self.kind == ModelKind::Reference
    }
}
