//! Directory inode implementation.

use std::any::Any;
use std::collections::BTreeMap;

use super::types::{INode, INodeId, INodeType};

/// Directory permissions (r-xr-xr-x).
pub const DIR_PERMS: u16 = 0o555;

/// Directory inode. Children are added while the tree is built and never
/// change afterwards.
#[derive(Debug)]
pub struct INodeDir {
    /// Inode ID.
    id: INodeId,
    /// Parent directory inode ID.
    parent_id: INodeId,
    /// Directory name.
    name: String,
    /// Logical path from root.
    path: String,
    /// Child entries ordered by name.
    children: BTreeMap<String, INodeId>,
}

impl INodeDir {
    /// Create a new, empty directory inode.
    ///
    /// # Arguments
    /// * `id` - Inode ID
    /// * `parent_id` - Parent directory inode ID
    /// * `name` - Directory name
    /// * `path` - Logical path from root
    pub fn new(id: INodeId, parent_id: INodeId, name: String, path: String) -> Self {
        Self {
            id,
            parent_id,
            name,
            path,
            children: BTreeMap::new(),
        }
    }

    /// Add a child entry.
    ///
    /// # Returns
    /// The inode previously registered under `name`, if any.
    pub(crate) fn add_child(&mut self, name: String, id: INodeId) -> Option<INodeId> {
        self.children.insert(name, id)
    }

    /// Get a child inode ID by name.
    pub fn get_child(&self, name: &str) -> Option<INodeId> {
        self.children.get(name).copied()
    }

    /// Iterate `(name, inode_id)` pairs ordered by name.
    pub fn children(&self) -> impl Iterator<Item = (&str, INodeId)> {
        self.children.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Get the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl INode for INodeDir {
    fn id(&self) -> INodeId {
        self.id
    }

    fn parent_id(&self) -> INodeId {
        self.parent_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn inode_type(&self) -> INodeType {
        INodeType::Directory
    }

    fn permissions(&self) -> u16 {
        DIR_PERMS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inode_dir_basic() {
        let dir: INodeDir = INodeDir::new(1, 1, "".to_string(), "".to_string());

        assert_eq!(dir.id(), 1);
        assert_eq!(dir.parent_id(), 1);
        assert_eq!(dir.path(), "");
        assert_eq!(dir.inode_type(), INodeType::Directory);
        assert_eq!(dir.permissions(), 0o555);
        assert_eq!(dir.child_count(), 0);
    }

    #[test]
    fn test_inode_dir_children_are_ordered() {
        let mut dir: INodeDir = INodeDir::new(1, 1, "".to_string(), "".to_string());

        assert_eq!(dir.add_child("zeta".to_string(), 2), None);
        assert_eq!(dir.add_child("alpha".to_string(), 3), None);
        assert_eq!(dir.add_child("mid".to_string(), 4), None);

        assert_eq!(dir.get_child("alpha"), Some(3));
        assert_eq!(dir.get_child("missing"), None);

        let names: Vec<&str> = dir.children().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
