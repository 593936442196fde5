use thiserror::Error;

/// A connection abstraction surfacing "unique violation" as a
/// distinct condition, alongside not-found and row-lock contention.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetaError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unique violation: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("row lock contention on {table}:{key}")]
    Locked { table: String, key: String },
}
