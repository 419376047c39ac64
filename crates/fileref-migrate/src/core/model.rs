//! Content-model and attribute metadata.
//!
//! These types are a read-only snapshot of what the host's schema registry
//! declares. The migration never mutates them; all schema changes go
//! through the store.

use serde::{Deserialize, Serialize};

/// Storage strategy of an attribute.
///
/// Resolved once by the host registry when the model is loaded; the
/// orchestrator dispatches on it instead of any runtime type inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Value lives directly on the content-model's own table.
    Simple,
    /// Value lives in a shared auxiliary table, keyed by attribute id
    /// (and locale for translated variants).
    Complex,
}

/// A declared field on a content-model. Immutable during migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    /// Numeric attribute id, used to filter rows of shared value tables.
    pub id: u64,

    /// Human-readable attribute name.
    pub name: String,

    /// Column holding the attribute's data.
    pub col_name: String,

    /// Declared type tag, e.g. "file" or "translatedfile".
    pub attr_type: String,

    /// Where the attribute stores its data.
    pub kind: AttributeKind,

    /// Whether one row stores an ordered list of values.
    pub multiple: bool,

    /// Target SQL storage type after migration, e.g. "blob" or "binary(16)".
    pub sql_type: String,
}

impl Attribute {
    /// Label used in report messages: `name[col_name]`.
    pub fn label(&self) -> String {
        format!("{}[{}]", self.name, self.col_name)
    }
}

/// A named, table-backed collection of items with a pluggable attribute set.
///
/// Attribute order is the declaration order reported by the registry and is
/// preserved through discovery and migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentModel {
    /// Registry identifier of the model.
    pub name: String,

    /// The model's own data table.
    pub table_name: String,

    /// Declared attributes, in declaration order.
    pub attributes: Vec<Attribute>,
}

impl ContentModel {
    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str) -> Attribute {
        Attribute {
            id: 1,
            name: name.to_string(),
            col_name: name.to_string(),
            attr_type: "file".to_string(),
            kind: AttributeKind::Simple,
            multiple: false,
            sql_type: "binary(16)".to_string(),
        }
    }

    #[test]
    fn test_attribute_lookup() {
        let model = ContentModel {
            name: "mm_news".to_string(),
            table_name: "mm_news".to_string(),
            attributes: vec![attr("teaser_image"), attr("download")],
        };

        assert!(model.attribute("teaser_image").is_some());
        assert!(model.attribute("missing").is_none());
    }

    #[test]
    fn test_attribute_label() {
        let attribute = attr("teaser_image");
        assert_eq!(attribute.label(), "teaser_image[teaser_image]");
    }
}
