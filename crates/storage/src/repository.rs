//! OCFL storage root access: layout discovery and inventory loading.

use std::sync::Arc;

use rusty_ocfl_model::{Inventory, LayoutDeclaration, ModelError, StorageLayout, INVENTORY_FILE, LAYOUT_FILE};

use crate::error::StorageError;
use crate::traits::ContentBackend;

/// OCFL versions probed via the root's `0=ocfl_<version>` declaration file.
const ROOT_SPEC_VERSIONS: [&str; 2] = ["1.1", "1.0"];

/// An opened OCFL storage root.
pub struct OcflRoot {
    backend: Arc<dyn ContentBackend>,
    layout: Option<StorageLayout>,
    spec: Option<String>,
}

/// An object found in a storage root.
#[derive(Debug, Clone)]
pub struct OcflObject {
    /// Object root path relative to the storage root.
    pub path: String,
    /// The object's decoded inventory.
    pub inventory: Inventory,
}

impl OcflRoot {
    /// Open a storage root through `backend`.
    ///
    /// Reads `ocfl_layout.json` and the layout extension's config. A root
    /// without a layout declaration falls back to using object ids as paths.
    ///
    /// # Arguments
    /// * `backend` - Content backend rooted at the storage root
    pub async fn open(backend: Arc<dyn ContentBackend>) -> Result<Self, StorageError> {
        let spec: Option<String> = detect_spec(backend.as_ref()).await?;
        let layout: Option<StorageLayout> = load_layout(backend.as_ref()).await?;

        match &layout {
            Some(layout) => tracing::info!(layout = layout.name(), "storage layout"),
            None => tracing::warn!("no storage layout declared; using object ids as paths"),
        }

        Ok(Self {
            backend,
            layout,
            spec,
        })
    }

    /// Create a root with a known layout, skipping discovery.
    pub fn with_layout(backend: Arc<dyn ContentBackend>, layout: Option<StorageLayout>) -> Self {
        Self {
            backend,
            layout,
            spec: None,
        }
    }

    pub fn backend(&self) -> &Arc<dyn ContentBackend> {
        &self.backend
    }

    pub fn layout(&self) -> Option<&StorageLayout> {
        self.layout.as_ref()
    }

    /// Name of the layout extension, if one is declared.
    pub fn layout_name(&self) -> Option<&'static str> {
        self.layout.as_ref().map(StorageLayout::name)
    }

    /// OCFL spec version the root declares (e.g., "1.1").
    pub fn spec(&self) -> Option<&str> {
        self.spec.as_deref()
    }

    /// Object root path for `object_id`, relative to the storage root.
    pub fn object_path(&self, object_id: &str) -> String {
        match &self.layout {
            Some(layout) => layout.object_path(object_id),
            None => object_id.to_string(),
        }
    }

    /// Locate an object and decode its inventory.
    ///
    /// # Arguments
    /// * `object_id` - OCFL object identifier
    ///
    /// # Returns
    /// The object, `ObjectNotFound` if it has no inventory, or a model error
    /// if the inventory is invalid or belongs to a different object.
    pub async fn load_object(&self, object_id: &str) -> Result<OcflObject, StorageError> {
        let path: String = self.object_path(object_id);
        let locator: String = self.backend.locator(&format!("{}/{}", path, INVENTORY_FILE));
        tracing::debug!(object_id, %locator, "loading inventory");

        let data: Vec<u8> = match self.backend.read_all(&locator).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => {
                return Err(StorageError::ObjectNotFound {
                    object_id: object_id.to_string(),
                    object_path: path,
                })
            }
            Err(e) => return Err(e),
        };

        let inventory: Inventory = Inventory::decode(&data)?;
        if inventory.id != object_id {
            return Err(ModelError::InvalidInventory(format!(
                "inventory at {} is for object {:?}",
                path, inventory.id
            ))
            .into());
        }

        Ok(OcflObject { path, inventory })
    }
}

/// Probe the root's `0=ocfl_<version>` file. Only informational, so any
/// failure other than not-found is logged and treated as unknown.
async fn detect_spec(backend: &dyn ContentBackend) -> Result<Option<String>, StorageError> {
    for version in ROOT_SPEC_VERSIONS {
        let locator: String = backend.locator(&format!("0=ocfl_{}", version));
        match backend.fetch_size(&locator).await {
            Ok(_) => return Ok(Some(version.to_string())),
            Err(e) if e.is_not_found() => continue,
            Err(e) => {
                tracing::warn!(%locator, error = %e, "cannot check root declaration; spec version unknown");
                return Ok(None);
            }
        }
    }
    tracing::debug!("no root declaration found");
    Ok(None)
}

async fn load_layout(backend: &dyn ContentBackend) -> Result<Option<StorageLayout>, StorageError> {
    let declaration: Vec<u8> = match backend.read_all(&backend.locator(LAYOUT_FILE)).await {
        Ok(data) => data,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };
    let declaration: LayoutDeclaration = LayoutDeclaration::decode(&declaration)?;

    let config: Option<Vec<u8>> = match backend
        .read_all(&backend.locator(&declaration.config_path()))
        .await
    {
        Ok(data) => Some(data),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(e),
    };

    let layout = StorageLayout::from_extension(&declaration.extension, config.as_deref())?;
    Ok(Some(layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    fn inventory_json(id: &str) -> String {
        format!(
            r#"{{
                "id": "{id}", "type": "https://ocfl.io/1.1/spec/#inventory",
                "digestAlgorithm": "sha512", "head": "v1",
                "manifest": {{ "abc": ["v1/content/a.txt"] }},
                "versions": {{ "v1": {{ "created": "2024-01-01T00:00:00Z", "state": {{ "abc": ["a.txt"] }} }} }}
            }}"#
        )
    }

    #[tokio::test]
    async fn test_open_with_hash_and_id_layout() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert("0=ocfl_1.1", "ocfl_1.1\n");
        backend.insert(
            LAYOUT_FILE,
            r#"{"extension": "0003-hash-and-id-n-tuple-storage-layout", "description": "d"}"#,
        );
        backend.insert(
            "extensions/0003-hash-and-id-n-tuple-storage-layout/config.json",
            r#"{"extensionName": "0003-hash-and-id-n-tuple-storage-layout", "digestAlgorithm": "sha256", "tupleSize": 3, "numberOfTuples": 3}"#,
        );
        backend.insert("3c0/ff4/240/object-01/inventory.json", inventory_json("object-01"));

        let root = OcflRoot::open(backend.clone()).await.unwrap();
        assert_eq!(root.spec(), Some("1.1"));
        assert_eq!(root.layout_name(), Some("0003-hash-and-id-n-tuple-storage-layout"));
        assert_eq!(root.object_path("object-01"), "3c0/ff4/240/object-01");

        let object = root.load_object("object-01").await.unwrap();
        assert_eq!(object.path, "3c0/ff4/240/object-01");
        assert_eq!(object.inventory.head, "v1");
    }

    #[tokio::test]
    async fn test_flat_fallback_without_layout() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert("obj1/inventory.json", inventory_json("obj1"));

        let root = OcflRoot::open(backend).await.unwrap();
        assert_eq!(root.spec(), None);
        assert_eq!(root.layout_name(), None);
        assert_eq!(root.load_object("obj1").await.unwrap().path, "obj1");
    }

    #[tokio::test]
    async fn test_declaration_check_failure_is_not_fatal() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert("0=ocfl_1.1", "ocfl_1.1\n");
        backend.insert(LAYOUT_FILE, r#"{"extension": "0002-flat-direct-storage-layout"}"#);
        backend.insert("obj1/inventory.json", inventory_json("obj1"));
        backend.fail_next_sizes(1);

        let root = OcflRoot::open(backend.clone()).await.unwrap();
        assert_eq!(root.spec(), None);
        assert_eq!(root.layout_name(), Some("0002-flat-direct-storage-layout"));
        assert_eq!(root.load_object("obj1").await.unwrap().path, "obj1");
    }

    #[tokio::test]
    async fn test_missing_object() {
        let backend = Arc::new(MemoryBackend::new());
        let root = OcflRoot::with_layout(backend, None);
        assert!(matches!(
            root.load_object("nope").await,
            Err(StorageError::ObjectNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_inventory_for_other_object_rejected() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert("obj1/inventory.json", inventory_json("someone-else"));
        let root = OcflRoot::with_layout(backend, None);
        assert!(matches!(
            root.load_object("obj1").await,
            Err(StorageError::Model(ModelError::InvalidInventory(_)))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_layout() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert(LAYOUT_FILE, r#"{"extension": "0099-made-up"}"#);
        assert!(matches!(
            OcflRoot::open(backend).await,
            Err(StorageError::Model(ModelError::UnsupportedLayout(_)))
        ));
    }
}
