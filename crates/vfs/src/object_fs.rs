//! Opening an OCFL object version as a servable view.

use std::sync::Arc;

use rusty_ocfl_model::{ObjectVersion, VersionSelector};
use rusty_ocfl_storage::{ContentBackend, OcflRoot, S3Config, StorageLocation};

use crate::builder::build_tree;
use crate::error::VfsError;
use crate::inode::INodeManager;
use crate::mapper::{map_version, FileMap};
use crate::view::ObjectView;

/// Describes the object version a view was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub object_id: String,
    /// Version name as spelled in the inventory (e.g., "v1").
    pub version: String,
    pub file_count: usize,
    /// OCFL spec the storage root declares, if any.
    pub root_spec: Option<String>,
    /// Storage layout extension name, if one is declared.
    pub layout: Option<String>,
    /// Object root path relative to the storage root.
    pub object_path: String,
}

impl ObjectInfo {
    /// Default filesystem name: `ocfl-` plus the last segment of the object id.
    pub fn fs_name(&self) -> String {
        let base: &str = self
            .object_id
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(&self.object_id);
        format!("ocfl-{}", base)
    }
}

/// A resolved object version ready to be mounted.
pub struct ObjectFs {
    pub view: Arc<ObjectView>,
    pub info: ObjectInfo,
}

/// Resolve, map, and build the view of one object version.
///
/// # Arguments
/// * `storage_root` - `s3://bucket[/prefix]` or a local directory
/// * `object_id` - OCFL object identifier
/// * `version` - Version token: "" for head, otherwise `vN` or `N`
/// * `s3_config` - Client overrides, used only for S3 storage roots
///
/// # Returns
/// The view and its description. Any resolution, mapping, or tree error
/// aborts before anything is served.
pub async fn open_object(
    storage_root: &str,
    object_id: &str,
    version: &str,
    s3_config: &S3Config,
) -> Result<ObjectFs, VfsError> {
    let selector: VersionSelector = VersionSelector::parse(version)?;
    let location: StorageLocation = StorageLocation::parse(storage_root)?;
    tracing::info!(storage_root = %location, object_id, version = %selector, "opening object");

    let backend: Arc<dyn ContentBackend> = location.connect(s3_config).await;
    open_object_with_backend(backend, object_id, selector).await
}

/// Like [`open_object`], over an already connected backend.
///
/// # Arguments
/// * `backend` - Backend rooted at the storage root
/// * `object_id` - OCFL object identifier
/// * `selector` - Version to resolve
pub async fn open_object_with_backend(
    backend: Arc<dyn ContentBackend>,
    object_id: &str,
    selector: VersionSelector,
) -> Result<ObjectFs, VfsError> {
    let root: OcflRoot = OcflRoot::open(Arc::clone(&backend)).await?;
    let object = root.load_object(object_id).await?;
    let version: ObjectVersion = object.inventory.resolve(&selector)?;

    let files: FileMap = map_version(&version, &object.path, backend.as_ref())?;
    let tree: INodeManager = build_tree(&files)?;

    let info = ObjectInfo {
        object_id: version.object_id().to_string(),
        version: version.version_name().to_string(),
        file_count: files.len(),
        root_spec: root.spec().map(str::to_string),
        layout: root.layout_name().map(str::to_string),
        object_path: object.path,
    };
    tracing::info!(
        object_id = %info.object_id,
        version = %info.version,
        files = info.file_count,
        backend = backend.kind(),
        "object view ready"
    );

    Ok(ObjectFs {
        view: Arc::new(ObjectView::new(tree, backend)),
        info,
    })
}
