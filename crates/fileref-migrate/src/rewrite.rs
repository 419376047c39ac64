//! Row rewriting: read stored values, resolve them, write back changes.
//!
//! One shared algorithm covers the full dispatch matrix
//! {simple, complex} x {single-valued, multi-valued}: the scope picks the
//! row-selection predicate, the multiplicity flag picks the decode/encode
//! shape, everything else is identical.

use tracing::debug;

use crate::core::traits::{RowFilter, ValueStore};
use crate::core::value::{decode_value, encode_value};
use crate::error::Result;
use crate::resolve::Resolver;

/// Row-selection scope for one attribute.
#[derive(Debug, Clone)]
pub enum RowScope {
    /// Values live on the content-model's own table; every row is in scope.
    Simple { table: String, column: String },
    /// Values live in a shared auxiliary table holding many attributes;
    /// rows are restricted to this attribute's id. Locale keys of
    /// translated variants ride along untouched.
    Complex {
        table: String,
        column: String,
        attribute_id: u64,
    },
}

impl RowScope {
    pub fn table(&self) -> &str {
        match self {
            RowScope::Simple { table, .. } => table,
            RowScope::Complex { table, .. } => table,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            RowScope::Simple { column, .. } => column,
            RowScope::Complex { column, .. } => column,
        }
    }

    fn filter(&self) -> Option<RowFilter> {
        match self {
            RowScope::Simple { .. } => None,
            RowScope::Complex { attribute_id, .. } => {
                Some(RowFilter::attribute_id(*attribute_id))
            }
        }
    }
}

/// Tally of one attribute's rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Non-empty rows visited.
    pub rows_seen: u64,
    /// Rows whose stored bytes changed.
    pub rows_updated: u64,
    /// File lookups that found no record.
    pub lookup_misses: u64,
}

/// Rewrite every row in scope, best effort.
///
/// Rows with NULL or empty values are skipped without being counted. A row
/// is written back only when at least one scalar resolved to a canonical
/// identifier and the re-encoded bytes differ from the stored bytes; rows
/// where every lookup missed keep their original bytes exactly.
pub async fn rewrite_rows(
    store: &dyn ValueStore,
    resolver: &Resolver<'_>,
    scope: &RowScope,
    multiple: bool,
) -> Result<RewriteOutcome> {
    let filter = scope.filter();
    let rows = store
        .select_value_rows(scope.table(), scope.column(), filter.as_ref())
        .await?;

    let mut outcome = RewriteOutcome::default();

    for row in rows {
        let raw = match row.value {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => continue,
        };
        outcome.rows_seen += 1;

        let decoded = decode_value(&raw, multiple);
        let resolved = resolver.resolve_value(decoded).await?;
        outcome.lookup_misses += resolved.misses;

        if resolved.replaced == 0 {
            continue;
        }

        let encoded = encode_value(&resolved.value);
        if encoded == raw {
            continue;
        }

        debug!(
            "rewriting {}.{} row {}",
            scope.table(),
            scope.column(),
            row.id
        );
        store
            .update_value(scope.table(), row.id, scope.column(), encoded)
            .await?;
        outcome.rows_updated += 1;
    }

    Ok(outcome)
}
