//! Attribute discovery across content-models.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::MigrateConfig;
use crate::core::traits::ModelRegistry;
use crate::error::Result;
use crate::report::RunReport;

/// Attributes selected for one content-model, in declaration order.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub model: String,
    pub attributes: Vec<String>,
}

/// Everything selected for migration, in registry enumeration order.
///
/// Built once per run during discovery and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct AttributeSelection {
    pub models: Vec<ModelSelection>,
}

impl AttributeSelection {
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Total number of selected attributes across all models.
    pub fn attribute_count(&self) -> usize {
        self.models.iter().map(|m| m.attributes.len()).sum()
    }
}

/// Enumerate all non-excluded content-models and select their file
/// attributes.
///
/// An excluded model is never loaded. A model that fails to load gets a
/// warning entry and is skipped; discovery never aborts the run on a
/// single model. Multiplicity is not consulted here - it is read per
/// attribute at rewrite time.
pub async fn classify_attributes(
    registry: &dyn ModelRegistry,
    config: &MigrateConfig,
    excluded: &HashSet<String>,
    report: &mut RunReport,
) -> Result<AttributeSelection> {
    let mut selection = AttributeSelection::default();

    for name in registry.model_names().await? {
        if excluded.contains(&name) {
            debug!("content model {name} is excluded, skipping");
            continue;
        }

        let model = match registry.load_model(&name).await {
            Ok(Some(model)) => model,
            Ok(None) => {
                report.warning(format!("Could not load content model {name}, skipping."));
                continue;
            }
            Err(err) => {
                report.warning(format!(
                    "Could not load content model {name}, skipping. ({err})"
                ));
                continue;
            }
        };

        let attributes: Vec<String> = model
            .attributes
            .iter()
            .filter(|a| config.is_allowed_type(&a.attr_type))
            .map(|a| a.name.clone())
            .collect();

        if !attributes.is_empty() {
            info!(
                "selected {} file attribute(s) on {}",
                attributes.len(),
                name
            );
            selection.models.push(ModelSelection {
                model: name,
                attributes,
            });
        }
    }

    Ok(selection)
}
