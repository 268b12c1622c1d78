// Tests for progress persistence

use std::fs;
use tapecrawl_core::model::{CategoryLinkSet, ProgressState};
use tapecrawl_core::store::{ProgressStore, StoreError};
use tapecrawl_scanner::ProductRecord;
use tempfile::TempDir;

fn create_test_store() -> (TempDir, ProgressStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = ProgressStore::new(
        temp_dir.path().join("urls.json"),
        temp_dir.path().join("products.json"),
    );
    (temp_dir, store)
}

fn record(url: &str, category: &str) -> ProductRecord {
    ProductRecord::new(url.to_string(), category.to_string())
}

// ============================================================================
// Load Tests
// ============================================================================

#[test]
fn test_load_missing_files_is_empty() {
    let (_temp_dir, store) = create_test_store();

    let state = store.load().unwrap();
    assert!(state.links.is_empty());
    assert!(state.products().is_empty());
}

#[test]
fn test_load_empty_file_is_empty() {
    let (_temp_dir, store) = create_test_store();
    fs::write(store.links_path(), "\n").unwrap();

    assert!(store.load_links().unwrap().is_empty());
}

#[test]
fn test_load_corrupt_file_is_an_error() {
    let (_temp_dir, store) = create_test_store();
    fs::write(store.products_path(), "[{\"url\": ").unwrap();

    let err = store.load_products().unwrap_err();
    assert!(matches!(err, StoreError::Json { .. }));
}

#[test]
fn test_load_reads_link_file_written_elsewhere() {
    let (_temp_dir, store) = create_test_store();
    fs::write(
        store.links_path(),
        r#"{
  "Duct Tape": ["https://www.example.com/BT-1/"],
  "Double Sided": []
}"#,
    )
    .unwrap();

    let links = store.load_links().unwrap();
    let names: Vec<_> = links.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Duct Tape", "Double Sided"]);
    assert!(links.contains("Double Sided"));
}

// ============================================================================
// Save / Round-trip Tests
// ============================================================================

#[test]
fn test_save_and_load_preserves_order() {
    let (_temp_dir, store) = create_test_store();

    let mut links = CategoryLinkSet::new();
    links.insert("Vinyl Tape", vec!["https://x/BT-9/".into(), "https://x/BT-3/".into()]);
    links.insert("Duct Tape", vec![]);
    links.insert("Foam Tape", vec!["https://x/BT-5/".into()]);

    let state = ProgressState::new(
        links.clone(),
        vec![
            record("https://x/BT-9/", "Vinyl Tape"),
            record("https://x/BT-3/", "Vinyl Tape"),
            record("https://x/BT-5/", "Foam Tape"),
        ],
    );

    store.save(&state).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded.links, links);
    let urls: Vec<_> = loaded.products().iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec!["https://x/BT-9/", "https://x/BT-3/", "https://x/BT-5/"]);
}

#[test]
fn test_save_overwrites_instead_of_appending() {
    let (_temp_dir, store) = create_test_store();

    store
        .save_products(&[record("https://x/BT-1/", "Duct Tape")])
        .unwrap();
    store
        .save_products(&[
            record("https://x/BT-1/", "Duct Tape"),
            record("https://x/BT-2/", "Duct Tape"),
        ])
        .unwrap();

    let products = store.load_products().unwrap();
    assert_eq!(products.len(), 2);
}

#[test]
fn test_saved_records_keep_null_fields() {
    let (_temp_dir, store) = create_test_store();

    let mut product = record("https://x/BT-1/", "Duct Tape");
    product.title = Some("Crème tape".into());
    store.save_products(&[product]).unwrap();

    let text = fs::read_to_string(store.products_path()).unwrap();
    assert!(text.contains("\"sku\": null"));
    assert!(text.contains("\"total_thickness\": null"));
    assert!(text.contains("Crème tape"));
}

#[test]
fn test_save_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let store = ProgressStore::new(
        temp_dir.path().join("state/urls.json"),
        temp_dir.path().join("state/products.json"),
    );

    store.save_links(&CategoryLinkSet::new()).unwrap();
    assert!(store.links_path().exists());
    assert_eq!(fs::read_to_string(store.links_path()).unwrap().trim(), "{}");
}

#[test]
fn test_load_drops_duplicate_records() {
    let (_temp_dir, store) = create_test_store();

    store
        .save_products(&[
            record("https://x/BT-1/", "Duct Tape"),
            record("https://x/BT-1/", "Duct Tape"),
        ])
        .unwrap();

    let state = store.load().unwrap();
    assert_eq!(state.products().len(), 1);
}
