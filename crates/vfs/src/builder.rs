//! Building the inode tree from a flat file map.
//!
//! Construction runs in two phases so the result does not depend on the
//! order entries arrive in:
//!
//! 1. Validate every logical path, collect all directory prefixes, and reject
//!    any file path that is also a directory prefix.
//! 2. Create directories ordered by (depth, path), then attach each file to
//!    its parent.

use std::collections::BTreeSet;

use crate::error::VfsError;
use crate::inode::INodeManager;
use crate::mapper::FileMap;

/// Check a logical path: relative, non-empty, no empty/`.`/`..` components.
///
/// # Arguments
/// * `path` - Logical path from an object version's state
pub fn validate_logical_path(path: &str) -> Result<(), VfsError> {
    let invalid = |reason: &'static str| VfsError::InvalidLogicalPath {
        path: path.to_string(),
        reason,
    };

    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.starts_with('/') {
        return Err(invalid("absolute path"));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(invalid("empty path component")),
            "." | ".." => return Err(invalid("relative path component")),
            _ => {}
        }
    }
    Ok(())
}

/// Every proper directory prefix of `path` (e.g., "a/b/c" gives "a", "a/b").
fn dir_prefixes(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(i, _)| &path[..i])
}

/// Directory creation order: parents before children, then by path.
fn depth_then_path(path: &str) -> (usize, &str) {
    (path.matches('/').count(), path)
}

/// Build the inode tree for a file map.
///
/// # Arguments
/// * `files` - Logical path to locator
///
/// # Returns
/// The populated manager, or the first path error found. Inode numbering
/// is deterministic for a given map.
pub fn build_tree(files: &FileMap) -> Result<INodeManager, VfsError> {
    let mut dirs: BTreeSet<&str> = BTreeSet::new();
    for (path, _) in files.iter() {
        validate_logical_path(path)?;
        dirs.extend(dir_prefixes(path));
    }
    if let Some(conflict) = files.iter().map(|(p, _)| p).find(|p| dirs.contains(p)) {
        return Err(VfsError::StructuralConflict {
            path: conflict.to_string(),
        });
    }

    let mut ordered: Vec<&str> = dirs.into_iter().collect();
    ordered.sort_by(|a, b| depth_then_path(a).cmp(&depth_then_path(b)));

    let mut manager: INodeManager = INodeManager::new();
    for dir in ordered {
        manager.add_directory(dir)?;
    }
    for (path, locator) in files.iter() {
        manager.add_file(path, locator.to_string())?;
    }

    tracing::debug!(
        files = manager.file_count(),
        inodes = manager.inode_count(),
        "built inode tree"
    );
    Ok(manager)
}
