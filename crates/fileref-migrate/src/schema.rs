//! Live column inspection and schema upgrades.
//!
//! The live schema is the only source of truth for what still needs
//! converting: nothing is persisted between runs, so every run re-derives
//! the column state from a fresh schema description.

use tracing::debug;

use crate::core::traits::ValueStore;
use crate::error::Result;

/// Conversion state of a live column, derived from its reported type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnState {
    /// Text-like storage that still holds legacy references.
    Legacy,
    /// Blob or binary storage; the column needs no schema change.
    UpToDate,
    /// Pre-blob `text` storage from an installation too old to convert.
    Unsupported,
}

/// A column's reported type together with its classification.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub column_type: String,
    pub state: ColumnState,
}

/// Classify a reported column type string.
///
/// Case-insensitive. `text`-like types (text, tinytext, longtext, ...)
/// mark an unsupported legacy installation; `blob`, `longblob` and any
/// parameterized `binary` are already migrated; everything else is a
/// legacy text-like column awaiting conversion.
pub fn classify_column_type(column_type: &str) -> ColumnState {
    let normalized = column_type.trim().to_ascii_lowercase();

    if normalized.contains("text") {
        return ColumnState::Unsupported;
    }

    if normalized == "blob" || normalized == "longblob" || normalized.starts_with("binary") {
        return ColumnState::UpToDate;
    }

    ColumnState::Legacy
}

/// Describe a column and classify its storage type.
pub async fn inspect_column(
    store: &dyn ValueStore,
    table: &str,
    column: &str,
) -> Result<ColumnInfo> {
    let column_type = store.describe_column(table, column).await?;
    let state = classify_column_type(&column_type);
    debug!("{table}.{column} reports type {column_type:?} -> {state:?}");
    Ok(ColumnInfo { column_type, state })
}

/// Change a column's storage type in place.
///
/// Called at most once per (table, column) per run, strictly before any
/// row of that column is rewritten, and only for [`ColumnState::Legacy`]
/// columns.
pub async fn upgrade_column(
    store: &dyn ValueStore,
    table: &str,
    column: &str,
    sql_type: &str,
) -> Result<()> {
    store.alter_column_type(table, column, sql_type).await
}
