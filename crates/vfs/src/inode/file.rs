//! File inode implementation.

use std::any::Any;

use super::size::SizeCell;
use super::types::{INode, INodeId, INodeType};

/// File permissions (r--r--r--).
pub const FILE_PERMS: u16 = 0o444;

/// File inode bound to one physical locator.
#[derive(Debug)]
pub struct INodeFile {
    /// Inode ID.
    id: INodeId,
    /// Parent directory inode ID.
    parent_id: INodeId,
    /// File name.
    name: String,
    /// Logical path from root.
    path: String,
    /// Backend locator of the content.
    locator: String,
    /// Lazily fetched size.
    size: SizeCell,
}

impl INodeFile {
    /// Create a new file inode with an unknown size.
    ///
    /// # Arguments
    /// * `id` - Inode ID
    /// * `parent_id` - Parent directory inode ID
    /// * `name` - File name
    /// * `path` - Logical path from root
    /// * `locator` - Backend locator of the file content
    pub fn new(id: INodeId, parent_id: INodeId, name: String, path: String, locator: String) -> Self {
        Self {
            id,
            parent_id,
            name,
            path,
            locator,
            size: SizeCell::new(),
        }
    }

    /// Get the backend locator.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Get the size cell.
    pub fn size(&self) -> &SizeCell {
        &self.size
    }
}

impl INode for INodeFile {
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
        INodeType::File
    }

    fn permissions(&self) -> u16 {
        FILE_PERMS
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
