//! # fileref-migrate
//!
//! One-shot migration of legacy file references to stable binary UUIDs in
//! content-model tables.
//!
//! Dynamically defined content-models store file references as numeric ids
//! or filesystem paths in text-like columns. This library finds the
//! affected attributes, upgrades their columns to binary-safe storage, and
//! converts every stored reference to its canonical 16-byte identifier:
//!
//! - **Attribute discovery** across all content-models, minus a
//!   caller-supplied exclusion set
//! - **Schema upgrades** from text-like columns to the attribute's target
//!   binary type, skipped when the live column is already converted
//! - **Identifier resolution** for numeric ids, filesystem paths, and
//!   already-converted binary values, via the host's file index
//! - **Idempotent re-runs**: a second pass over the same store rewrites
//!   nothing
//!
//! The host's schema registry, file-metadata service, and database driver
//! stay external; the library talks to them through the traits in
//! [`core::traits`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fileref_migrate::memory::{MemoryFileIndex, MemoryRegistry, MemoryStore};
//! use fileref_migrate::{MigrateConfig, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let orchestrator = Orchestrator::new(
//!         MigrateConfig::new("3.2.1"),
//!         Arc::new(MemoryRegistry::default()),
//!         Arc::new(MemoryFileIndex::default()),
//!         Arc::new(MemoryStore::default()),
//!     )
//!     .exclude("mm_archive");
//!
//!     let report = orchestrator.run().await;
//!     for line in report.lines() {
//!         println!("{line}");
//!     }
//! }
//! ```

pub mod classify;
pub mod config;
pub mod core;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod report;
pub mod resolve;
pub mod rewrite;
pub mod schema;

// Re-exports for convenient access
pub use classify::{AttributeSelection, ModelSelection};
pub use config::{MigrateConfig, MIN_PLATFORM_VERSION};
pub use crate::core::model::{Attribute, AttributeKind, ContentModel};
pub use crate::core::traits::{
    FileIndex, FileRecord, ModelRegistry, RowFilter, ValueRow, ValueStore,
};
pub use crate::core::value::LegacyValue;
pub use error::{MigrateError, Result};
pub use orchestrator::Orchestrator;
pub use report::{ReportEntry, ReportLevel, RunReport};
pub use rewrite::{RewriteOutcome, RowScope};
pub use schema::ColumnState;
