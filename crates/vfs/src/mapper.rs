//! Mapping an object version's logical paths to backend locators.

use std::collections::BTreeMap;

use rusty_ocfl_model::ObjectVersion;
use rusty_ocfl_storage::ContentBackend;

use crate::error::VfsError;

/// Logical path to physical locator, one entry per file, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMap(BTreeMap<String, String>);

impl FileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, logical_path: impl Into<String>, locator: impl Into<String>) {
        self.0.insert(logical_path.into(), locator.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up the locator of a logical path.
    pub fn get(&self, logical_path: &str) -> Option<&str> {
        self.0.get(logical_path).map(String::as_str)
    }

    /// Iterate `(logical_path, locator)` pairs ordered by logical path.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, l)| (p.as_str(), l.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FileMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Map every logical path of `version` to a backend locator.
///
/// Each digest resolves to the first content path the manifest lists for
/// it. The locator is composed by the backend from
/// `object_path/content_path`.
///
/// # Arguments
/// * `version` - The resolved object version
/// * `object_path` - Object root path relative to the storage root
/// * `backend` - Backend that owns locator composition
///
/// # Returns
/// A map with one entry per logical path, or `MissingManifestEntry` for the
/// first digest without content paths (no partial map is returned).
pub fn map_version(
    version: &ObjectVersion,
    object_path: &str,
    backend: &dyn ContentBackend,
) -> Result<FileMap, VfsError> {
    let object_path: &str = object_path.trim_end_matches('/');
    let mut files: FileMap = FileMap::new();

    for (logical_path, digest) in version.state() {
        let content_path: &String = version
            .content_paths(digest)
            .and_then(|paths| paths.first())
            .ok_or_else(|| VfsError::MissingManifestEntry {
                digest: digest.to_string(),
                logical_path: logical_path.to_string(),
            })?;

        let relative: String = if object_path.is_empty() {
            content_path.clone()
        } else {
            format!("{}/{}", object_path, content_path)
        };
        files.insert(logical_path, backend.locator(&relative));
    }

    tracing::debug!(
        object_id = version.object_id(),
        version = version.version_name(),
        files = files.len(),
        "mapped version to content locators"
    );
    Ok(files)
}
