//! Collaborator contracts for the host application.
//!
//! The migration core does not reimplement the host's schema registry, its
//! file-metadata service, or its database driver. It talks to them through
//! these traits:
//!
//! - [`ModelRegistry`]: enumerates and loads content-models
//! - [`FileIndex`]: maps legacy numeric ids and paths to canonical UUIDs
//! - [`ValueStore`]: inspects and mutates the relational store
//!
//! Implementations are expected to be thin adapters over whatever the host
//! already provides. [`crate::memory`] ships in-memory versions for tests
//! and offline dry runs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::model::ContentModel;
use crate::error::Result;

/// A file record as known to the host's file-metadata service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Canonical 16-byte binary identifier of the file.
    pub uuid: Uuid,
}

/// One row of a value query: the row id plus the raw stored bytes.
#[derive(Debug, Clone)]
pub struct ValueRow {
    /// Primary key of the row.
    pub id: i64,
    /// Raw column bytes; `None` for SQL NULL.
    pub value: Option<Vec<u8>>,
}

/// Equality filter for row selection, e.g. `att_id = 7`.
#[derive(Debug, Clone)]
pub struct RowFilter {
    pub column: String,
    pub value: u64,
}

impl RowFilter {
    /// Filter a shared value table down to one attribute's rows.
    pub fn attribute_id(value: u64) -> Self {
        Self {
            column: "att_id".to_string(),
            value,
        }
    }
}

/// Enumerate and load content-models from the host's schema registry.
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// List the identifiers of all known content-models.
    async fn model_names(&self) -> Result<Vec<String>>;

    /// Load a content-model by identifier.
    ///
    /// Returns `Ok(None)` when the registry knows the name but cannot
    /// produce the model (broken definition, missing table, ...).
    async fn load_model(&self, name: &str) -> Result<Option<ContentModel>>;
}

/// Look up file records by their legacy references.
#[async_trait]
pub trait FileIndex: Send + Sync {
    /// Find a file by its legacy numeric primary key.
    async fn find_by_id(&self, id: u64) -> Result<Option<FileRecord>>;

    /// Find a file by its filesystem path relative to the installation root.
    async fn find_by_path(&self, path: &str) -> Result<Option<FileRecord>>;
}

/// Inspect and mutate the relational store.
///
/// All reads and writes of the migration go through this trait; no
/// buffering happens on top of it.
#[async_trait]
pub trait ValueStore: Send + Sync {
    /// Whether a table exists.
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// The declared storage type of a column, as the store reports it
    /// (e.g. "varchar(255)", "blob", "binary(16)").
    async fn describe_column(&self, table: &str, column: &str) -> Result<String>;

    /// Change a column's storage type in place, keeping name and data.
    async fn alter_column_type(&self, table: &str, column: &str, sql_type: &str) -> Result<()>;

    /// Select `(id, value)` for every row of `table`, optionally restricted
    /// by an equality filter.
    async fn select_value_rows(
        &self,
        table: &str,
        column: &str,
        filter: Option<&RowFilter>,
    ) -> Result<Vec<ValueRow>>;

    /// Write one column of one row; all other columns stay untouched.
    async fn update_value(&self, table: &str, id: i64, column: &str, value: Vec<u8>)
        -> Result<()>;
}
