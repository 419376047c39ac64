//! Run configuration.
//!
//! All knobs the migration consults are collected here as one immutable
//! value: the attribute types selected for conversion, the mapping from
//! complex attribute types to their auxiliary value tables, and the upload
//! root used to recognize legacy path references.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum host platform version the updater supports.
///
/// Installations below this floor store file references in a layout this
/// tool does not understand; the run aborts before touching anything.
pub const MIN_PLATFORM_VERSION: &str = "3.2";

/// Immutable configuration for one migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Host platform version, as reported by the installation.
    pub platform_version: String,

    /// Attribute type tags selected for migration.
    #[serde(default = "default_allowed_types")]
    pub allowed_attribute_types: Vec<String>,

    /// Mapping from complex attribute type to its auxiliary value table.
    #[serde(default = "default_value_tables")]
    pub value_tables: HashMap<String, String>,

    /// Root directory of the file manager. Stored values under this prefix
    /// are legacy path references.
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
}

impl MigrateConfig {
    /// Create a configuration with the standard attribute types and value
    /// table mapping.
    pub fn new(platform_version: impl Into<String>) -> Self {
        Self {
            platform_version: platform_version.into(),
            allowed_attribute_types: default_allowed_types(),
            value_tables: default_value_tables(),
            upload_path: default_upload_path(),
        }
    }

    /// Replace the upload root.
    pub fn with_upload_path(mut self, upload_path: impl Into<String>) -> Self {
        self.upload_path = upload_path.into();
        self
    }

    /// Whether an attribute type is selected for migration.
    pub fn is_allowed_type(&self, attr_type: &str) -> bool {
        self.allowed_attribute_types
            .iter()
            .any(|t| t == attr_type)
    }

    /// The auxiliary value table for a complex attribute type, if any.
    pub fn value_table_for(&self, attr_type: &str) -> Option<&str> {
        self.value_tables.get(attr_type).map(String::as_str)
    }

    /// Whether the host platform meets the supported floor.
    pub fn platform_supported(&self) -> bool {
        version_at_least(&self.platform_version, MIN_PLATFORM_VERSION)
    }
}

fn default_allowed_types() -> Vec<String> {
    vec!["file".to_string(), "translatedfile".to_string()]
}

fn default_value_tables() -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert(
        "translatedfile".to_string(),
        "tl_metamodel_translatedlongblob".to_string(),
    );
    map
}

fn default_upload_path() -> String {
    "files".to_string()
}

/// Compare two dot-separated versions numerically.
///
/// Missing segments count as zero, so "3.2" and "3.2.0" compare equal.
/// Non-numeric segments (e.g. "3.2.x") also count as zero.
pub fn version_at_least(version: &str, floor: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };

    let version = parse(version);
    let floor = parse(floor);
    let len = version.len().max(floor.len());

    for i in 0..len {
        let a = version.get(i).copied().unwrap_or(0);
        let b = floor.get(i).copied().unwrap_or(0);
        if a != b {
            return a > b;
        }
    }

    true
}
