//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
///
/// Attribute-level variants never escape [`crate::Orchestrator::run`]: the
/// orchestrator renders them into the run report and continues with the
/// next unit of work.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Host platform is older than the supported floor.
    #[error("Only platform version {minimum} or newer is supported for this update (found {found})")]
    UnsupportedPlatform { found: String, minimum: String },

    /// Content-model registry failure (listing or loading models).
    #[error("Registry error: {0}")]
    Registry(String),

    /// Relational store failure with context about where it occurred.
    #[error("Store error: {message}\n  Context: {context}")]
    Store { message: String, context: String },

    /// File-metadata lookup failure.
    ///
    /// This is an infrastructure failure of the lookup collaborator, not a
    /// lookup miss - misses are counted outcomes, not errors.
    #[error("File index error: {0}")]
    FileIndex(String),

    /// A column still uses a pre-blob storage type that cannot be converted.
    #[error("Could not update {table}.{column}, because the type is {column_type}. It seems you are using an older installation")]
    UnsupportedColumn {
        table: String,
        column: String,
        column_type: String,
    },

    /// No auxiliary value table is configured for a complex attribute type.
    #[error("Unknown value table for {attribute}")]
    MissingValueTable { attribute: String },

    /// The configured auxiliary value table does not exist in the store.
    #[error("Could not find the value table for {attribute}. Table name: {table}")]
    ValueTableNotFound { attribute: String, table: String },

    /// The auxiliary value table is not stored as blob or binary.
    #[error("Could not update complex data for {attribute} because the value table {table} is not of type blob or binary")]
    ValueTableNotBinary { attribute: String, table: String },
}

impl MigrateError {
    /// Create a Store error with context about where it occurred.
    pub fn store(message: impl Into<String>, context: impl Into<String>) -> Self {
        MigrateError::Store {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a Registry error.
    pub fn registry(message: impl Into<String>) -> Self {
        MigrateError::Registry(message.into())
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
