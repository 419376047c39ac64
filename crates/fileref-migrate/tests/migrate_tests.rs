//! End-to-end orchestrator tests over the in-memory collaborators.
//!
//! These drive full runs - version gate, discovery, schema upgrade, row
//! rewrite - and assert on the final store state and the run report.

use std::sync::Arc;

use fileref_migrate::core::value::{decode_list, encode_list};
use fileref_migrate::memory::{MemoryFileIndex, MemoryRegistry, MemoryStore, StoreOp};
use fileref_migrate::{
    Attribute, AttributeKind, ContentModel, MigrateConfig, Orchestrator, RunReport,
};
use uuid::Uuid;

fn simple_attr(name: &str, multiple: bool, sql_type: &str) -> Attribute {
    Attribute {
        id: 1,
        name: name.to_string(),
        col_name: name.to_string(),
        attr_type: "file".to_string(),
        kind: AttributeKind::Simple,
        multiple,
        sql_type: sql_type.to_string(),
    }
}

fn complex_attr(name: &str, id: u64, multiple: bool) -> Attribute {
    Attribute {
        id,
        name: name.to_string(),
        col_name: name.to_string(),
        attr_type: "translatedfile".to_string(),
        kind: AttributeKind::Complex,
        multiple,
        sql_type: "blob".to_string(),
    }
}

fn model(name: &str, attributes: Vec<Attribute>) -> ContentModel {
    ContentModel {
        name: name.to_string(),
        table_name: name.to_string(),
        attributes,
    }
}

fn orchestrator(
    registry: MemoryRegistry,
    files: MemoryFileIndex,
    store: Arc<MemoryStore>,
) -> Orchestrator {
    Orchestrator::new(
        MigrateConfig::new("3.2.1"),
        Arc::new(registry),
        Arc::new(files),
        store,
    )
}

fn alter_count(store: &MemoryStore) -> usize {
    store
        .operations()
        .iter()
        .filter(|op| matches!(op, StoreOp::Alter { .. }))
        .count()
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn test_path_reference_becomes_binary_identifier() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_news",
        vec![simple_attr("teaser_image", false, "binary(16)")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_news", &[("teaser_image", "varchar(255)")]);
    store.insert_simple_row(
        "mm_news",
        1,
        "teaser_image",
        Some(b"files/img/teaser.jpg".to_vec()),
    );

    let uuid = Uuid::from_bytes([0xAB; 16]);
    let mut files = MemoryFileIndex::default();
    files.insert(23, "files/img/teaser.jpg", uuid);

    let report = orchestrator(registry, files, store.clone()).run().await;

    assert!(!report.has_errors(), "{report}");
    assert_eq!(
        store.column_type("mm_news", "teaser_image"),
        Some("binary(16)".to_string())
    );
    assert_eq!(
        store.row_value("mm_news", 1, "teaser_image"),
        Some(Some(uuid.as_bytes().to_vec()))
    );
    assert!(report.contains("Changed mm_news.teaser_image to binary(16)."));
    assert!(report.contains("Updated 1 entries in mm_news."));
    assert_eq!(report.rows_updated, 1);
    assert_eq!(report.attributes_selected, 1);
}

#[tokio::test]
async fn test_second_run_rewrites_nothing() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_news",
        vec![simple_attr("teaser_image", false, "binary(16)")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_news", &[("teaser_image", "varchar(255)")]);
    store.insert_simple_row("mm_news", 1, "teaser_image", Some(b"42".to_vec()));

    let uuid = Uuid::from_bytes(*b"0123456789abcdef");
    let mut files = MemoryFileIndex::default();
    files.insert(42, "files/a.jpg", uuid);

    let runner = orchestrator(registry, files, store.clone());

    let first = runner.run().await;
    assert_eq!(first.rows_updated, 1);
    let converted = store.row_value("mm_news", 1, "teaser_image");

    let second = runner.run().await;
    assert_eq!(second.rows_updated, 0);
    assert!(second.contains("mm_news.teaser_image seems to be already up to date."));
    assert!(second.contains("Updated 0 entries in mm_news."));
    // Stored bytes are stable across re-runs
    assert_eq!(store.row_value("mm_news", 1, "teaser_image"), converted);
    assert_eq!(alter_count(&store), 1);
}

// =============================================================================
// Schema gating
// =============================================================================

#[tokio::test]
async fn test_text_column_blocks_attribute() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_news",
        vec![simple_attr("download", false, "binary(16)")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_news", &[("download", "text")]);
    store.insert_simple_row("mm_news", 1, "download", Some(b"42".to_vec()));

    let report = orchestrator(registry, MemoryFileIndex::default(), store.clone())
        .run()
        .await;

    assert!(report.has_errors());
    assert!(report.contains("because the type is text"));
    assert!(store.operations().is_empty());
    assert_eq!(
        store.row_value("mm_news", 1, "download"),
        Some(Some(b"42".to_vec()))
    );
    assert_eq!(report.attributes_failed, 1);
}

#[tokio::test]
async fn test_text_target_type_blocks_attribute() {
    // The attribute itself still declares a text target: installation too old.
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_news",
        vec![simple_attr("download", false, "text")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_news", &[("download", "varchar(255)")]);

    let report = orchestrator(registry, MemoryFileIndex::default(), store.clone())
        .run()
        .await;

    assert!(report.has_errors());
    assert!(store.operations().is_empty());
}

#[tokio::test]
async fn test_blob_column_skips_alteration_but_rewrites() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_news",
        vec![simple_attr("teaser_image", false, "binary(16)")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_news", &[("teaser_image", "blob")]);
    store.insert_simple_row("mm_news", 1, "teaser_image", Some(b"42".to_vec()));

    let uuid = Uuid::from_bytes([7u8; 16]);
    let mut files = MemoryFileIndex::default();
    files.insert(42, "files/a.jpg", uuid);

    let report = orchestrator(registry, files, store.clone()).run().await;

    assert_eq!(alter_count(&store), 0);
    assert!(report.contains("mm_news.teaser_image seems to be already up to date."));
    assert_eq!(
        store.row_value("mm_news", 1, "teaser_image"),
        Some(Some(uuid.as_bytes().to_vec()))
    );
    assert_eq!(report.rows_updated, 1);
}

#[tokio::test]
async fn test_varchar_column_altered_once_before_any_write() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_news",
        vec![simple_attr("teaser_image", false, "binary(16)")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_news", &[("teaser_image", "varchar(255)")]);
    store.insert_simple_row("mm_news", 1, "teaser_image", Some(b"1".to_vec()));
    store.insert_simple_row("mm_news", 2, "teaser_image", Some(b"2".to_vec()));

    let mut files = MemoryFileIndex::default();
    files.insert(1, "files/1.jpg", Uuid::from_bytes([1u8; 16]));
    files.insert(2, "files/2.jpg", Uuid::from_bytes([2u8; 16]));

    orchestrator(registry, files, store.clone()).run().await;

    let ops = store.operations();
    assert_eq!(alter_count(&store), 1);
    assert!(
        matches!(&ops[0], StoreOp::Alter { table, column, .. }
            if table == "mm_news" && column == "teaser_image"),
        "first store mutation must be the column alteration, got {ops:?}"
    );
    assert_eq!(ops.len(), 3);
}

// =============================================================================
// Exclusion and discovery
// =============================================================================

#[tokio::test]
async fn test_excluded_model_is_never_queried() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_news",
        vec![simple_attr("teaser_image", false, "binary(16)")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_news", &[("teaser_image", "varchar(255)")]);
    store.insert_simple_row("mm_news", 1, "teaser_image", Some(b"42".to_vec()));

    let registry = Arc::new(registry);
    let runner = Orchestrator::new(
        MigrateConfig::new("3.2.1"),
        registry.clone(),
        Arc::new(MemoryFileIndex::default()),
        store.clone(),
    )
    .exclude("mm_news");

    let report = runner.run().await;

    assert!(registry.loaded_models().is_empty());
    assert!(store.operations().is_empty());
    assert!(report.contains("No attributes found for update."));
    assert_eq!(report.attributes_selected, 0);
}

#[tokio::test]
async fn test_unloadable_model_warns_and_run_completes() {
    let mut registry = MemoryRegistry::default();
    registry.add_phantom("mm_broken");

    let report = orchestrator(
        registry,
        MemoryFileIndex::default(),
        Arc::new(MemoryStore::default()),
    )
    .run()
    .await;

    assert!(report.contains("Could not load content model mm_broken"));
    assert!(report.contains("All work done"));
    assert!(!report.has_errors());
}

// =============================================================================
// Lookup misses
// =============================================================================

#[tokio::test]
async fn test_lookup_miss_preserves_value() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_news",
        vec![simple_attr("teaser_image", false, "binary(16)")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_news", &[("teaser_image", "varchar(255)")]);
    store.insert_simple_row("mm_news", 1, "teaser_image", Some(b"99".to_vec()));

    let report = orchestrator(registry, MemoryFileIndex::default(), store.clone())
        .run()
        .await;

    // The column is still upgraded; the unresolvable value is kept as-is.
    assert_eq!(
        store.column_type("mm_news", "teaser_image"),
        Some("binary(16)".to_string())
    );
    assert_eq!(
        store.row_value("mm_news", 1, "teaser_image"),
        Some(Some(b"99".to_vec()))
    );
    assert_eq!(report.rows_updated, 0);
    assert_eq!(report.lookup_misses, 1);
    assert!(report.contains("Could not resolve 1 file reference(s) in mm_news"));
    assert!(report.contains("Updated 0 entries in mm_news."));
}

// =============================================================================
// Multi-valued and complex attributes
// =============================================================================

#[tokio::test]
async fn test_simple_multi_valued_sequence_resolves_elementwise() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_gallery",
        vec![simple_attr("images", true, "blob")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_gallery", &[("images", "varchar(255)")]);
    let stored = encode_list(&[b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
    store.insert_simple_row("mm_gallery", 1, "images", Some(stored));

    let u1 = Uuid::from_bytes([1u8; 16]);
    let u2 = Uuid::from_bytes([2u8; 16]);
    let u3 = Uuid::from_bytes([3u8; 16]);
    let mut files = MemoryFileIndex::default();
    files.insert(1, "files/1.jpg", u1);
    files.insert(2, "files/2.jpg", u2);
    files.insert(3, "files/3.jpg", u3);

    let report = orchestrator(registry, files, store.clone()).run().await;

    assert!(!report.has_errors(), "{report}");
    let raw = store.row_value("mm_gallery", 1, "images").unwrap().unwrap();
    assert_eq!(
        decode_list(&raw),
        Some(vec![
            u1.as_bytes().to_vec(),
            u2.as_bytes().to_vec(),
            u3.as_bytes().to_vec(),
        ])
    );
    assert_eq!(report.rows_updated, 1);
}

#[tokio::test]
async fn test_complex_attribute_rewrites_only_its_rows() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_catalog",
        vec![complex_attr("gallery", 7, true)],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("tl_metamodel_translatedlongblob", &[("value", "blob")]);
    store.insert_complex_row(
        "tl_metamodel_translatedlongblob",
        1,
        7,
        Some(encode_list(&[b"1".to_vec(), b"2".to_vec()])),
    );
    // Same table, different attribute: out of scope.
    store.insert_complex_row(
        "tl_metamodel_translatedlongblob",
        2,
        9,
        Some(b"2".to_vec()),
    );

    let u1 = Uuid::from_bytes([1u8; 16]);
    let u2 = Uuid::from_bytes([2u8; 16]);
    let mut files = MemoryFileIndex::default();
    files.insert(1, "files/1.jpg", u1);
    files.insert(2, "files/2.jpg", u2);

    let report = orchestrator(registry, files, store.clone()).run().await;

    assert!(!report.has_errors(), "{report}");
    let raw = store
        .row_value("tl_metamodel_translatedlongblob", 1, "value")
        .unwrap()
        .unwrap();
    assert_eq!(
        decode_list(&raw),
        Some(vec![u1.as_bytes().to_vec(), u2.as_bytes().to_vec()])
    );
    assert_eq!(
        store.row_value("tl_metamodel_translatedlongblob", 2, "value"),
        Some(Some(b"2".to_vec()))
    );
    assert!(report.contains("Updated 1 entries in tl_metamodel_translatedlongblob."));
    // The shared value table is never altered
    assert_eq!(alter_count(&store), 0);
}

#[tokio::test]
async fn test_complex_single_valued_attribute() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_catalog",
        vec![complex_attr("brochure", 5, false)],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("tl_metamodel_translatedlongblob", &[("value", "longblob")]);
    store.insert_complex_row(
        "tl_metamodel_translatedlongblob",
        1,
        5,
        Some(b"files/b.pdf".to_vec()),
    );

    let uuid = Uuid::from_bytes([5u8; 16]);
    let mut files = MemoryFileIndex::default();
    files.insert(11, "files/b.pdf", uuid);

    let report = orchestrator(registry, files, store.clone()).run().await;

    assert!(!report.has_errors(), "{report}");
    assert_eq!(
        store.row_value("tl_metamodel_translatedlongblob", 1, "value"),
        Some(Some(uuid.as_bytes().to_vec()))
    );
}

#[tokio::test]
async fn test_complex_value_table_must_be_binary() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_catalog",
        vec![complex_attr("gallery", 7, true)],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("tl_metamodel_translatedlongblob", &[("value", "varchar(255)")]);
    store.insert_complex_row(
        "tl_metamodel_translatedlongblob",
        1,
        7,
        Some(b"42".to_vec()),
    );

    let report = orchestrator(registry, MemoryFileIndex::default(), store.clone())
        .run()
        .await;

    assert!(report.has_errors());
    assert!(report.contains("is not of type blob or binary"));
    assert!(store.operations().is_empty());
}

#[tokio::test]
async fn test_missing_value_table_skips_attribute_and_continues() {
    // gallery's value table does not exist; teaser_image after it must
    // still be migrated.
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_catalog",
        vec![
            complex_attr("gallery", 7, true),
            simple_attr("teaser_image", false, "binary(16)"),
        ],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_catalog", &[("teaser_image", "varchar(255)")]);
    store.insert_simple_row("mm_catalog", 1, "teaser_image", Some(b"42".to_vec()));

    let uuid = Uuid::from_bytes([4u8; 16]);
    let mut files = MemoryFileIndex::default();
    files.insert(42, "files/a.jpg", uuid);

    let report = orchestrator(registry, files, store.clone()).run().await;

    assert!(report.contains("Could not find the value table for gallery[gallery]"));
    assert_eq!(report.attributes_failed, 1);
    assert_eq!(
        store.row_value("mm_catalog", 1, "teaser_image"),
        Some(Some(uuid.as_bytes().to_vec()))
    );
    assert!(report.contains("All work done"));
}

// =============================================================================
// Version gate
// =============================================================================

#[tokio::test]
async fn test_old_platform_blocks_run_before_any_mutation() {
    let mut registry = MemoryRegistry::default();
    registry.insert(model(
        "mm_news",
        vec![simple_attr("teaser_image", false, "binary(16)")],
    ));

    let store = Arc::new(MemoryStore::default());
    store.create_table("mm_news", &[("teaser_image", "varchar(255)")]);
    store.insert_simple_row("mm_news", 1, "teaser_image", Some(b"42".to_vec()));

    let registry = Arc::new(registry);
    let runner = Orchestrator::new(
        MigrateConfig::new("3.1.9"),
        registry.clone(),
        Arc::new(MemoryFileIndex::default()),
        store.clone(),
    );

    let report: RunReport = runner.run().await;

    assert!(report.has_errors());
    assert_eq!(report.entries.len(), 1);
    assert!(report.contains("Only platform version 3.2 or newer is supported"));
    assert!(registry.loaded_models().is_empty());
    assert!(store.operations().is_empty());
    assert!(report.completed_at.is_some());
}
