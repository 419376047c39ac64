//! Migration orchestrator - main workflow coordinator.
//!
//! One linear pass: version gate, attribute discovery, then one
//! failure-isolated migration per selected attribute. Every operation is
//! attempted exactly once; failures become report entries and the run
//! moves on to the next unit of work. Nothing is retried, nothing is
//! persisted between runs.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::classify::classify_attributes;
use crate::config::{MigrateConfig, MIN_PLATFORM_VERSION};
use crate::core::model::{Attribute, AttributeKind, ContentModel};
use crate::core::traits::{FileIndex, ModelRegistry, ValueStore};
use crate::error::{MigrateError, Result};
use crate::report::RunReport;
use crate::resolve::Resolver;
use crate::rewrite::{rewrite_rows, RewriteOutcome, RowScope};
use crate::schema::{inspect_column, upgrade_column, ColumnState};

/// Migration orchestrator.
///
/// Assumes exclusive, offline access to the store for the duration of the
/// run. Re-running over a partially converted store is safe: rows already
/// holding canonical identifiers and columns already reporting binary
/// storage are recognized and left alone.
pub struct Orchestrator {
    config: MigrateConfig,
    registry: Arc<dyn ModelRegistry>,
    files: Arc<dyn FileIndex>,
    store: Arc<dyn ValueStore>,
    excluded: HashSet<String>,
}

impl Orchestrator {
    /// Create a new orchestrator over the host's collaborators.
    pub fn new(
        config: MigrateConfig,
        registry: Arc<dyn ModelRegistry>,
        files: Arc<dyn FileIndex>,
        store: Arc<dyn ValueStore>,
    ) -> Self {
        Self {
            config,
            registry,
            files,
            store,
            excluded: HashSet::new(),
        }
    }

    /// Exclude a content-model from the run. It is never loaded and never
    /// queried for attributes.
    pub fn exclude(mut self, model: impl Into<String>) -> Self {
        self.excluded.insert(model.into());
        self
    }

    /// Run the migration and return the accumulated report.
    ///
    /// Never fails: every error is rendered into the report.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::new();

        // Phase 1: version gate. Abort before any mutation.
        if !self.config.platform_supported() {
            report.error(
                MigrateError::UnsupportedPlatform {
                    found: self.config.platform_version.clone(),
                    minimum: MIN_PLATFORM_VERSION.to_string(),
                }
                .to_string(),
            );
            report.finish();
            return report;
        }
        info!(
            "Phase 1: platform version {} accepted",
            self.config.platform_version
        );

        // Phase 2: discover file attributes.
        info!("Phase 2: discovering file attributes");
        let selection = match classify_attributes(
            self.registry.as_ref(),
            &self.config,
            &self.excluded,
            &mut report,
        )
        .await
        {
            Ok(selection) => selection,
            Err(err) => {
                report.error(format!("Attribute discovery failed: {err}"));
                report.finish();
                return report;
            }
        };

        report.attributes_selected = selection.attribute_count();
        if selection.is_empty() {
            report.info("No attributes found for update.");
        }

        // Phase 3: migrate each attribute, failure-isolated.
        info!(
            "Phase 3: migrating {} attribute(s)",
            selection.attribute_count()
        );
        for model_selection in &selection.models {
            let model = match self.registry.load_model(&model_selection.model).await {
                Ok(Some(model)) => model,
                Ok(None) => {
                    report.warning(format!(
                        "Could not load content model {}, skipping.",
                        model_selection.model
                    ));
                    continue;
                }
                Err(err) => {
                    report.warning(format!(
                        "Could not load content model {}, skipping. ({err})",
                        model_selection.model
                    ));
                    continue;
                }
            };

            for attribute_name in &model_selection.attributes {
                let Some(attribute) = model.attribute(attribute_name) else {
                    report.attributes_failed += 1;
                    report.error(format!(
                        "Attribute {attribute_name} disappeared from {}.",
                        model.name
                    ));
                    continue;
                };

                let result = match attribute.kind {
                    AttributeKind::Simple => {
                        self.update_simple(&model, attribute, &mut report).await
                    }
                    AttributeKind::Complex => {
                        self.update_complex(attribute, &mut report).await
                    }
                };

                if let Err(err) = result {
                    report.attributes_failed += 1;
                    report.error(err.to_string());
                }
            }
        }

        // Phase 4: done.
        report.info("All work done for the file reference updater.");
        report.finish();
        report
    }

    /// Migrate a simple attribute: its values live on the model's own table.
    async fn update_simple(
        &self,
        model: &ContentModel,
        attribute: &Attribute,
        report: &mut RunReport,
    ) -> Result<()> {
        let table = model.table_name.as_str();
        let column = attribute.col_name.as_str();

        // An attribute whose target type is still text-like belongs to an
        // installation older than this tool supports.
        if attribute.sql_type.to_ascii_lowercase().contains("text") {
            return Err(MigrateError::UnsupportedColumn {
                table: table.to_string(),
                column: column.to_string(),
                column_type: attribute.sql_type.clone(),
            });
        }

        let info = inspect_column(self.store.as_ref(), table, column).await?;
        match info.state {
            ColumnState::Unsupported => {
                return Err(MigrateError::UnsupportedColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                    column_type: info.column_type,
                });
            }
            ColumnState::UpToDate => {
                report.info(format!("{table}.{column} seems to be already up to date."));
            }
            ColumnState::Legacy => {
                upgrade_column(self.store.as_ref(), table, column, &attribute.sql_type).await?;
                report.info(format!(
                    "Changed {table}.{column} to {}.",
                    attribute.sql_type
                ));
            }
        }

        let scope = RowScope::Simple {
            table: table.to_string(),
            column: column.to_string(),
        };
        let outcome = self.rewrite(&scope, attribute.multiple).await?;
        self.record_outcome(report, table, outcome);
        Ok(())
    }

    /// Migrate a complex attribute: its values live in a shared auxiliary
    /// table keyed by attribute id.
    ///
    /// The auxiliary table is expected to already use binary-safe storage;
    /// it is shared across attributes and is never altered here.
    async fn update_complex(
        &self,
        attribute: &Attribute,
        report: &mut RunReport,
    ) -> Result<()> {
        let label = attribute.label();

        let Some(value_table) = self.config.value_table_for(&attribute.attr_type) else {
            return Err(MigrateError::MissingValueTable { attribute: label });
        };

        if !self.store.table_exists(value_table).await? {
            return Err(MigrateError::ValueTableNotFound {
                attribute: label,
                table: value_table.to_string(),
            });
        }

        let info = inspect_column(self.store.as_ref(), value_table, "value").await?;
        if info.state != ColumnState::UpToDate {
            return Err(MigrateError::ValueTableNotBinary {
                attribute: label,
                table: value_table.to_string(),
            });
        }

        let scope = RowScope::Complex {
            table: value_table.to_string(),
            column: "value".to_string(),
            attribute_id: attribute.id,
        };
        let outcome = self.rewrite(&scope, attribute.multiple).await?;
        self.record_outcome(report, value_table, outcome);
        Ok(())
    }

    async fn rewrite(&self, scope: &RowScope, multiple: bool) -> Result<RewriteOutcome> {
        let resolver = Resolver::new(self.files.as_ref(), &self.config.upload_path);
        rewrite_rows(self.store.as_ref(), &resolver, scope, multiple).await
    }

    fn record_outcome(&self, report: &mut RunReport, table: &str, outcome: RewriteOutcome) {
        report.rows_updated += outcome.rows_updated;
        report.lookup_misses += outcome.lookup_misses;
        report.info(format!(
            "Updated {} entries in {table}.",
            outcome.rows_updated
        ));
        if outcome.lookup_misses > 0 {
            report.warning(format!(
                "Could not resolve {} file reference(s) in {table}; original values kept.",
                outcome.lookup_misses
            ));
        }
    }
}
