//! In-memory collaborators for tests and offline dry runs.
//!
//! These implement the [`crate::core::traits`] contracts against plain
//! data structures, record every schema alteration and row write in order,
//! and expose enough accessors to assert on the final store state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::model::ContentModel;
use crate::core::traits::{FileIndex, FileRecord, ModelRegistry, RowFilter, ValueRow, ValueStore};
use crate::error::{MigrateError, Result};

/// Registry over a fixed list of models, preserving insertion order.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: Vec<(String, Option<ContentModel>)>,
    loads: Mutex<Vec<String>>,
}

impl MemoryRegistry {
    /// Register a loadable model.
    pub fn insert(&mut self, model: ContentModel) {
        self.entries.push((model.name.clone(), Some(model)));
    }

    /// Register a name whose model cannot be loaded.
    pub fn add_phantom(&mut self, name: impl Into<String>) {
        self.entries.push((name.into(), None));
    }

    /// Names passed to `load_model` so far.
    pub fn loaded_models(&self) -> Vec<String> {
        self.loads.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ModelRegistry for MemoryRegistry {
    async fn model_names(&self) -> Result<Vec<String>> {
        Ok(self.entries.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn load_model(&self, name: &str) -> Result<Option<ContentModel>> {
        self.loads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(name.to_string());
        Ok(self
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, model)| model.clone()))
    }
}

/// File index over two lookup maps.
#[derive(Debug, Default)]
pub struct MemoryFileIndex {
    by_id: HashMap<u64, Uuid>,
    by_path: HashMap<String, Uuid>,
}

impl MemoryFileIndex {
    /// Register a file record reachable by both legacy references.
    pub fn insert(&mut self, id: u64, path: impl Into<String>, uuid: Uuid) {
        self.by_id.insert(id, uuid);
        self.by_path.insert(path.into(), uuid);
    }
}

#[async_trait]
impl FileIndex for MemoryFileIndex {
    async fn find_by_id(&self, id: u64) -> Result<Option<FileRecord>> {
        Ok(self.by_id.get(&id).map(|uuid| FileRecord { uuid: *uuid }))
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<FileRecord>> {
        Ok(self
            .by_path
            .get(path)
            .map(|uuid| FileRecord { uuid: *uuid }))
    }
}

/// One recorded mutation of the store, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Alter {
        table: String,
        column: String,
        sql_type: String,
    },
    Update {
        table: String,
        id: i64,
        column: String,
    },
}

/// One row of an in-memory table.
#[derive(Debug, Clone)]
pub struct MemoryRow {
    pub id: i64,
    /// Attribute id for rows of shared value tables.
    pub att_id: Option<u64>,
    pub values: HashMap<String, Option<Vec<u8>>>,
}

#[derive(Debug, Default)]
struct MemoryTable {
    column_types: HashMap<String, String>,
    rows: Vec<MemoryRow>,
}

#[derive(Debug, Default)]
struct StoreInner {
    tables: HashMap<String, MemoryTable>,
    ops: Vec<StoreOp>,
}

/// Relational store over in-memory tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a table with the given `(column, type)` pairs.
    pub fn create_table(&self, name: &str, columns: &[(&str, &str)]) {
        let mut inner = self.lock();
        let table = inner.tables.entry(name.to_string()).or_default();
        for (column, sql_type) in columns {
            table
                .column_types
                .insert((*column).to_string(), (*sql_type).to_string());
        }
    }

    /// Insert a row holding one value column.
    pub fn insert_simple_row(&self, table: &str, id: i64, column: &str, value: Option<Vec<u8>>) {
        let mut values = HashMap::new();
        values.insert(column.to_string(), value);
        self.push_row(table, MemoryRow {
            id,
            att_id: None,
            values,
        });
    }

    /// Insert a row of a shared value table, keyed by attribute id.
    pub fn insert_complex_row(&self, table: &str, id: i64, att_id: u64, value: Option<Vec<u8>>) {
        let mut values = HashMap::new();
        values.insert("value".to_string(), value);
        self.push_row(table, MemoryRow {
            id,
            att_id: Some(att_id),
            values,
        });
    }

    fn push_row(&self, table: &str, row: MemoryRow) {
        let mut inner = self.lock();
        inner.tables.entry(table.to_string()).or_default().rows.push(row);
    }

    /// The current declared type of a column.
    pub fn column_type(&self, table: &str, column: &str) -> Option<String> {
        self.lock()
            .tables
            .get(table)
            .and_then(|t| t.column_types.get(column).cloned())
    }

    /// The current bytes of one row's column.
    pub fn row_value(&self, table: &str, id: i64, column: &str) -> Option<Option<Vec<u8>>> {
        self.lock()
            .tables
            .get(table)
            .and_then(|t| t.rows.iter().find(|r| r.id == id))
            .and_then(|r| r.values.get(column).cloned())
    }

    /// Every recorded mutation, in execution order.
    pub fn operations(&self) -> Vec<StoreOp> {
        self.lock().ops.clone()
    }
}

#[async_trait]
impl ValueStore for MemoryStore {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.lock().tables.contains_key(table))
    }

    async fn describe_column(&self, table: &str, column: &str) -> Result<String> {
        self.lock()
            .tables
            .get(table)
            .and_then(|t| t.column_types.get(column).cloned())
            .ok_or_else(|| MigrateError::store("no such column", format!("{table}.{column}")))
    }

    async fn alter_column_type(&self, table: &str, column: &str, sql_type: &str) -> Result<()> {
        let mut inner = self.lock();
        let table_entry = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrateError::store("no such table", table.to_string()))?;
        table_entry
            .column_types
            .insert(column.to_string(), sql_type.to_string());
        inner.ops.push(StoreOp::Alter {
            table: table.to_string(),
            column: column.to_string(),
            sql_type: sql_type.to_string(),
        });
        Ok(())
    }

    async fn select_value_rows(
        &self,
        table: &str,
        column: &str,
        filter: Option<&RowFilter>,
    ) -> Result<Vec<ValueRow>> {
        let inner = self.lock();
        let table_entry = inner
            .tables
            .get(table)
            .ok_or_else(|| MigrateError::store("no such table", table.to_string()))?;

        Ok(table_entry
            .rows
            .iter()
            .filter(|row| match filter {
                // Only attribute-id filters are used by the migration.
                Some(f) => f.column == "att_id" && row.att_id == Some(f.value),
                None => true,
            })
            .map(|row| ValueRow {
                id: row.id,
                value: row.values.get(column).cloned().flatten(),
            })
            .collect())
    }

    async fn update_value(
        &self,
        table: &str,
        id: i64,
        column: &str,
        value: Vec<u8>,
    ) -> Result<()> {
        let mut inner = self.lock();
        let table_entry = inner
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrateError::store("no such table", table.to_string()))?;
        let row = table_entry
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| {
                MigrateError::store("no such row", format!("{table} id={id}"))
            })?;
        row.values.insert(column.to_string(), Some(value));
        inner.ops.push(StoreOp::Update {
            table: table.to_string(),
            id,
            column: column.to_string(),
        });
        Ok(())
    }
}
