//! Integration tests for opening storage roots on local disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusty_ocfl_model::layout::{FLAT_DIRECT, HASHED_N_TUPLE, HASH_AND_ID_N_TUPLE};
use rusty_ocfl_model::{ModelError, StorageLayout};
use rusty_ocfl_storage::{ContentBackend, LocalBackend, OcflRoot, StorageError};
use tempfile::TempDir;

fn inventory(object_id: &str) -> String {
    format!(
        r#"{{
            "id": "{object_id}",
            "type": "https://ocfl.io/1.0/spec/#inventory",
            "digestAlgorithm": "sha256",
            "head": "v1",
            "manifest": {{ "{d}": ["v1/content/x.txt"] }},
            "versions": {{ "v1": {{ "created": "2023-05-01T00:00:00Z", "state": {{ "{d}": ["x.txt"] }} }} }}
        }}"#,
        d = "c".repeat(64)
    )
}

/// Write a storage root declaring `extension` (if any) with an optional config.
fn storage_root(spec: &str, extension: Option<&str>, config: Option<&str>) -> TempDir {
    let dir: TempDir = TempDir::new().unwrap();
    let root: &Path = dir.path();
    std::fs::write(root.join(format!("0=ocfl_{}", spec)), format!("ocfl_{}\n", spec)).unwrap();
    if let Some(extension) = extension {
        std::fs::write(
            root.join("ocfl_layout.json"),
            format!(r#"{{"extension": "{}", "description": "test"}}"#, extension),
        )
        .unwrap();
        if let Some(config) = config {
            let ext_dir: PathBuf = root.join("extensions").join(extension);
            std::fs::create_dir_all(&ext_dir).unwrap();
            std::fs::write(ext_dir.join("config.json"), config).unwrap();
        }
    }
    dir
}

fn write_object(root: &Path, object_path: &str, inventory: &str) {
    let object_root: PathBuf = root.join(object_path);
    std::fs::create_dir_all(&object_root).unwrap();
    std::fs::write(object_root.join("inventory.json"), inventory).unwrap();
}

async fn open(dir: &TempDir) -> Result<OcflRoot, StorageError> {
    let backend: Arc<dyn ContentBackend> = Arc::new(LocalBackend::new(dir.path()));
    OcflRoot::open(backend).await
}

#[tokio::test]
async fn test_hashed_n_tuple_short_root() {
    let config = format!(
        r#"{{"extensionName": "{}", "digestAlgorithm": "sha256", "tupleSize": 3, "numberOfTuples": 3, "shortObjectRoot": true}}"#,
        HASHED_N_TUPLE
    );
    let dir = storage_root("1.0", Some(HASHED_N_TUPLE), Some(&config));
    let root = open(&dir).await.unwrap();
    assert_eq!(root.spec(), Some("1.0"));
    assert_eq!(root.layout_name(), Some(HASHED_N_TUPLE));

    let id = "urn:uuid:0f9b1c2e";
    let path: String = root.object_path(id);
    let segments: Vec<&str> = path.split('/').collect();
    assert_eq!(segments.len(), 4);
    assert!(segments[..3].iter().all(|s| s.len() == 3));
    assert_eq!(segments[3].len(), 64 - 9);

    write_object(dir.path(), &path, &inventory(id));
    let object = root.load_object(id).await.unwrap();
    assert_eq!(object.path, path);
    assert_eq!(object.inventory.id, id);
}

#[tokio::test]
async fn test_hash_and_id_defaults_without_config() {
    let dir = storage_root("1.1", Some(HASH_AND_ID_N_TUPLE), None);
    let root = open(&dir).await.unwrap();

    let expected = StorageLayout::from_extension(HASH_AND_ID_N_TUPLE, None)
        .unwrap()
        .object_path("object-01");
    assert_eq!(root.object_path("object-01"), expected);
    assert!(expected.ends_with("/object-01"));
}

#[tokio::test]
async fn test_flat_direct_layout() {
    let dir = storage_root("1.1", Some(FLAT_DIRECT), None);
    let root = open(&dir).await.unwrap();
    assert_eq!(root.object_path("obj-1"), "obj-1");

    write_object(dir.path(), "obj-1", &inventory("obj-1"));
    assert_eq!(root.load_object("obj-1").await.unwrap().path, "obj-1");
}

#[tokio::test]
async fn test_root_without_layout_uses_ids() {
    let dir = TempDir::new().unwrap();
    let root = open(&dir).await.unwrap();
    assert_eq!(root.spec(), None);
    assert_eq!(root.layout_name(), None);
    assert_eq!(root.object_path("plain"), "plain");
}

#[tokio::test]
async fn test_unsupported_layout() {
    let dir = storage_root("1.1", Some("9999-made-up-layout"), None);
    assert!(matches!(
        open(&dir).await,
        Err(StorageError::Model(ModelError::UnsupportedLayout(_)))
    ));
}

#[tokio::test]
async fn test_config_naming_another_extension() {
    let config = format!(r#"{{"extensionName": "{}"}}"#, HASHED_N_TUPLE);
    let dir = storage_root("1.1", Some(HASH_AND_ID_N_TUPLE), Some(&config));
    assert!(matches!(
        open(&dir).await,
        Err(StorageError::Model(ModelError::InvalidLayoutConfig { .. }))
    ));
}

#[tokio::test]
async fn test_inventory_for_another_object() {
    let dir = storage_root("1.1", Some(FLAT_DIRECT), None);
    write_object(dir.path(), "obj-1", &inventory("obj-2"));
    let root = open(&dir).await.unwrap();

    assert!(matches!(
        root.load_object("obj-1").await,
        Err(StorageError::Model(ModelError::InvalidInventory(_)))
    ));
    assert!(matches!(
        root.load_object("obj-3").await,
        Err(StorageError::ObjectNotFound { .. })
    ));
}
