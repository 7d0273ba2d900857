//! Core error types.

use serde::Serialize;
use thiserror::Error;

/// Core catalog errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown catalog identifier.
    #[error("catalog not found: {0}")]
    NotFound(String),

    /// Payload rejected by the derived validation schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A model cannot be turned into a validation schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Storage layer error; the active transaction has been rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The session deadline passed first; nothing was committed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Stored data does not match the model.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Check if the error is caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Validation(_))
    }
}

/// Configuration defects found while deriving schemas or registering models.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A column type has no scalar to validate against.
    #[error("model {model}: column {column} has no resolvable scalar type")]
    UnresolvedColumnType {
        /// Model identifier.
        model: String,
        /// Offending column.
        column: String,
    },

    /// A scope rule names a column the model does not have.
    #[error("model {model}: scope column {column} does not exist")]
    MissingScopeColumn {
        /// Model identifier.
        model: String,
        /// Missing column.
        column: String,
    },

    /// An inherited scope goes through a column that is not a foreign key.
    #[error("model {model}: scope is inherited through {via}, which is not a foreign key")]
    InvalidScopeLink {
        /// Model identifier.
        model: String,
        /// Column the scope is inherited through.
        via: String,
    },

    /// An inherited scope points at a model that is not served.
    #[error("model {model}: scope parent {parent} is not registered or has no scope column {column}")]
    UnknownScopeParent {
        /// Model identifier.
        model: String,
        /// Parent model identifier.
        parent: String,
        /// Scope column expected on the parent.
        column: String,
    },

    /// Following inherited scopes from a model leads back to a model
    /// already on the chain.
    #[error("model {model}: inherited scope loops back through {parent}")]
    CyclicScope {
        /// Model identifier.
        model: String,
        /// Model reached a second time.
        parent: String,
    },

    /// An inherited scope chain is longer than the supported depth.
    #[error("model {model}: scope is inherited through more than {limit} models")]
    ScopeTooDeep {
        /// Model identifier.
        model: String,
        /// Maximum chain length.
        limit: usize,
    },
}

/// One invalid field of an inbound record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Position of the record in an array payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<usize>,
    /// Field name (empty when the record itself is malformed).
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

/// Payload validation failure, listing every offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {schema} payload: {}", summarize(.issues))]
pub struct ValidationError {
    /// Name of the schema the payload was validated against.
    pub schema: String,
    /// Field-level detail.
    pub issues: Vec<FieldIssue>,
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| match (issue.record, issue.field.is_empty()) {
            (Some(i), false) => format!("[{}].{}: {}", i, issue.field, issue.message),
            (Some(i), true) => format!("[{}]: {}", i, issue.message),
            (None, false) => format!("{}: {}", issue.field, issue.message),
            (None, true) => issue.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
