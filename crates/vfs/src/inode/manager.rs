//! INode manager for allocating and tracking inodes.

use std::collections::HashMap;

use super::dir::INodeDir;
use super::file::INodeFile;
use super::types::{INode, INodeId, INodeType, ROOT_INODE};
use crate::error::VfsError;

/// Owns every inode of a view, indexed by ID and by logical path.
///
/// Inodes are added with `&mut self` while the tree is built. Once the
/// manager is shared, it is only read, so it needs no locks.
#[derive(Debug)]
pub struct INodeManager {
    /// Next inode ID to allocate.
    next_id: INodeId,
    /// Directory inodes by ID.
    dirs: HashMap<INodeId, INodeDir>,
    /// File inodes by ID.
    files: HashMap<INodeId, INodeFile>,
    /// Logical path to inode ID index.
    path_index: HashMap<String, INodeId>,
}

impl Default for INodeManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a logical path into (parent path, entry name).
fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((parent, name)) => (parent, name),
        None => ("", path),
    }
}

impl INodeManager {
    /// Create a new inode manager holding only the root directory.
    pub fn new() -> Self {
        let mut dirs: HashMap<INodeId, INodeDir> = HashMap::new();
        dirs.insert(
            ROOT_INODE,
            INodeDir::new(ROOT_INODE, ROOT_INODE, String::new(), String::new()),
        );
        let mut path_index: HashMap<String, INodeId> = HashMap::new();
        path_index.insert(String::new(), ROOT_INODE);

        Self {
            next_id: ROOT_INODE + 1,
            dirs,
            files: HashMap::new(),
            path_index,
        }
    }

    fn allocate_id(&mut self) -> INodeId {
        let id: INodeId = self.next_id;
        self.next_id += 1;
        id
    }

    /// Attach a new entry to its parent directory.
    fn link(&mut self, path: &str) -> Result<(INodeId, INodeId, String), VfsError> {
        let (parent_path, name) = split_path(path);
        let parent_id: INodeId = *self.path_index.get(parent_path).ok_or_else(|| {
            VfsError::InvalidLogicalPath {
                path: path.to_string(),
                reason: "parent directory does not exist",
            }
        })?;
        if self.files.contains_key(&parent_id) {
            return Err(VfsError::StructuralConflict {
                path: parent_path.to_string(),
            });
        }
        if self.path_index.contains_key(path) {
            return Err(VfsError::StructuralConflict {
                path: path.to_string(),
            });
        }

        let id: INodeId = self.allocate_id();
        let name: String = name.to_string();
        let parent: &mut INodeDir = self
            .dirs
            .get_mut(&parent_id)
            .ok_or(VfsError::NotADirectory(parent_id))?;
        parent.add_child(name.clone(), id);
        self.path_index.insert(path.to_string(), id);
        Ok((id, parent_id, name))
    }

    /// Add a directory whose parent already exists.
    ///
    /// Adding an existing directory again returns its ID.
    ///
    /// # Arguments
    /// * `path` - Logical directory path (e.g., "a/b")
    ///
    /// # Returns
    /// The inode ID of the directory.
    pub fn add_directory(&mut self, path: &str) -> Result<INodeId, VfsError> {
        if let Some(&id) = self.path_index.get(path) {
            return if self.dirs.contains_key(&id) {
                Ok(id)
            } else {
                Err(VfsError::StructuralConflict {
                    path: path.to_string(),
                })
            };
        }

        let (id, parent_id, name) = self.link(path)?;
        self.dirs
            .insert(id, INodeDir::new(id, parent_id, name, path.to_string()));
        Ok(id)
    }

    /// Add a file whose parent directory already exists.
    ///
    /// # Arguments
    /// * `path` - Logical file path (e.g., "a/b.txt")
    /// * `locator` - Backend locator of the file content
    ///
    /// # Returns
    /// The inode ID of the file, or `StructuralConflict` if the path is taken.
    pub fn add_file(&mut self, path: &str, locator: String) -> Result<INodeId, VfsError> {
        let (id, parent_id, name) = self.link(path)?;
        self.files.insert(
            id,
            INodeFile::new(id, parent_id, name, path.to_string(), locator),
        );
        Ok(id)
    }

    /// Get an inode by ID.
    pub fn get(&self, id: INodeId) -> Option<&dyn INode> {
        if let Some(dir) = self.dirs.get(&id) {
            return Some(dir);
        }
        self.files.get(&id).map(|f| f as &dyn INode)
    }

    /// Get an inode by logical path ("" for the root).
    pub fn get_by_path(&self, path: &str) -> Option<&dyn INode> {
        let id: INodeId = *self.path_index.get(path)?;
        self.get(id)
    }

    /// Get a directory inode.
    ///
    /// # Returns
    /// The directory, `NotADirectory` for a file, or `InodeNotFound`.
    pub fn get_dir(&self, id: INodeId) -> Result<&INodeDir, VfsError> {
        match self.get(id) {
            Some(inode) => inode
                .as_any()
                .downcast_ref::<INodeDir>()
                .ok_or(VfsError::NotADirectory(id)),
            None => Err(VfsError::InodeNotFound(id)),
        }
    }

    /// Get a file inode.
    ///
    /// # Returns
    /// The file, `NotAFile` for a directory, or `InodeNotFound`.
    pub fn get_file(&self, id: INodeId) -> Result<&INodeFile, VfsError> {
        match self.get(id) {
            Some(inode) => inode
                .as_any()
                .downcast_ref::<INodeFile>()
                .ok_or(VfsError::NotAFile(id)),
            None => Err(VfsError::InodeNotFound(id)),
        }
    }

    /// Get the type of an inode.
    pub fn inode_type(&self, id: INodeId) -> Option<INodeType> {
        self.get(id).map(|inode| inode.inode_type())
    }

    /// Total number of inodes, root included.
    pub fn inode_count(&self) -> usize {
        self.dirs.len() + self.files.len()
    }

    /// Number of file inodes.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_manager_has_root() {
        let manager = INodeManager::new();
        let root = manager.get(ROOT_INODE).unwrap();
        assert_eq!(root.inode_type(), INodeType::Directory);
        assert_eq!(root.path(), "");
        assert_eq!(manager.inode_count(), 1);
        assert_eq!(manager.get_by_path("").unwrap().id(), ROOT_INODE);
    }

    #[test]
    fn test_add_directory_and_file() {
        let mut manager = INodeManager::new();
        let a: INodeId = manager.add_directory("a").unwrap();
        let b: INodeId = manager.add_directory("a/b").unwrap();
        let f: INodeId = manager.add_file("a/b/c.txt", "loc".to_string()).unwrap();

        assert_eq!(manager.add_directory("a").unwrap(), a);
        assert_eq!(manager.get_dir(a).unwrap().get_child("b"), Some(b));
        assert_eq!(manager.get_dir(b).unwrap().get_child("c.txt"), Some(f));

        let file = manager.get_file(f).unwrap();
        assert_eq!(file.parent_id(), b);
        assert_eq!(file.name(), "c.txt");
        assert_eq!(file.locator(), "loc");
        assert_eq!(manager.file_count(), 1);
        assert_eq!(manager.inode_count(), 4);
    }

    #[test]
    fn test_missing_parent_rejected() {
        let mut manager = INodeManager::new();
        assert!(matches!(
            manager.add_file("x/y.txt", "loc".into()),
            Err(VfsError::InvalidLogicalPath { .. })
        ));
    }

    #[test]
    fn test_file_dir_collisions() {
        let mut manager = INodeManager::new();
        manager.add_file("a", "loc".into()).unwrap();
        assert!(matches!(
            manager.add_directory("a"),
            Err(VfsError::StructuralConflict { .. })
        ));
        assert!(matches!(
            manager.add_file("a", "other".into()),
            Err(VfsError::StructuralConflict { .. })
        ));
    }

    #[test]
    fn test_typed_access_errors() {
        let mut manager = INodeManager::new();
        let f: INodeId = manager.add_file("f", "loc".into()).unwrap();

        assert!(matches!(manager.get_dir(f), Err(VfsError::NotADirectory(_))));
        assert!(matches!(manager.get_file(ROOT_INODE), Err(VfsError::NotAFile(_))));
        assert!(matches!(manager.get_file(999), Err(VfsError::InodeNotFound(999))));
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("a/b/c"), ("a/b", "c"));
        assert_eq!(split_path("top"), ("", "top"));
    }
}
