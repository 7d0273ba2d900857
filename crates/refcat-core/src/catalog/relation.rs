//! Foreign key references between models.

/// Action taken when a referenced row is deleted or its key updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    /// Propagate the change to referencing rows.
    Cascade,
    /// Leave the decision to the storage engine.
    NoAction,
}

/// A foreign key from one column to a column of another model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Target table identifier.
    pub table: String,
    /// Target column name (usually the primary key).
    pub column: String,
    /// Behavior when the referenced row is deleted.
    pub on_delete: ReferentialAction,
    /// Behavior when the referenced key is updated.
    pub on_update: ReferentialAction,
}

impl ReferentialAction {
    /// SQL clause for this action.
    pub fn sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

impl ForeignKey {
    /// Create a foreign key with no referential actions.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        }
    }

    /// Cascade both deletes and key updates.
    pub fn cascade(mut self) -> Self {
        self.on_delete = ReferentialAction::Cascade;
        self.on_update = ReferentialAction::Cascade;
        self
    }

    /// SQL `REFERENCES` clause for a column definition.
    pub fn references_clause(&self) -> String {
        format!(
            "REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
            self.table,
            self.column,
            self.on_delete.sql(),
            self.on_update.sql()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_foreign_key() {
        let fk = ForeignKey::new("section", "id").cascade();

        assert_eq!(fk.on_delete, ReferentialAction::Cascade);
        assert_eq!(fk.on_update, ReferentialAction::Cascade);
        assert_eq!(
            fk.references_clause(),
            "REFERENCES section (id) ON DELETE CASCADE ON UPDATE CASCADE"
        );
    }
}
