//! The served view of one object version.
//!
//! [`ObjectView`] answers the node callbacks the kernel bridge needs:
//! attributes, navigation, open, read, and release. The tree is immutable,
//! so every method takes `&self` and any number of calls may run at once.
//! The only shared mutable state is each file's size memo.

use std::sync::Arc;

use futures::FutureExt;
use rusty_ocfl_storage::{ContentBackend, FileSession, StorageError};

use crate::error::VfsError;
use crate::inode::{INode, INodeFile, INodeId, INodeManager, INodeType, ROOT_INODE};

/// Attributes of one node, independent of the kernel bridge's types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAttributes {
    pub id: INodeId,
    pub kind: INodeType,
    pub size: u64,
    /// Permission bits (0o555 for directories, 0o444 for files).
    pub perm: u16,
    pub nlink: u32,
}

/// State returned by [`ObjectView::open`].
#[derive(Debug)]
pub struct OpenFile {
    /// Open local handle, or None for stateless backends.
    pub session: Option<FileSession>,
    /// Whether the kernel may keep cached pages across opens.
    pub keep_cache: bool,
}

/// A directory entry as listed by [`ObjectView::children`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub id: INodeId,
    pub kind: INodeType,
}

/// Read-only projection of an object version onto a node tree.
pub struct ObjectView {
    inodes: INodeManager,
    backend: Arc<dyn ContentBackend>,
}

impl ObjectView {
    /// Create a view over a built tree.
    ///
    /// # Arguments
    /// * `inodes` - Tree built from the version's file map
    /// * `backend` - Backend the file locators belong to
    pub fn new(inodes: INodeManager, backend: Arc<dyn ContentBackend>) -> Self {
        Self { inodes, backend }
    }

    pub fn inodes(&self) -> &INodeManager {
        &self.inodes
    }

    pub fn backend(&self) -> &Arc<dyn ContentBackend> {
        &self.backend
    }

    /// Number of files in the view.
    pub fn file_count(&self) -> usize {
        self.inodes.file_count()
    }

    /// Attributes of a directory. Needs no I/O.
    ///
    /// # Returns
    /// Attributes with mode 0o555, or `NotADirectory` / `InodeNotFound`.
    pub fn directory_attributes(&self, id: INodeId) -> Result<NodeAttributes, VfsError> {
        let dir = self.inodes.get_dir(id)?;
        Ok(NodeAttributes {
            id,
            kind: INodeType::Directory,
            size: 0,
            perm: dir.permissions(),
            nlink: 2,
        })
    }

    /// Attributes of a file, fetching its size on first use.
    ///
    /// Concurrent callers share a single in-flight size fetch. A successful
    /// size is kept for the life of the view; a failure is returned as
    /// `AttributeUnavailable` and the next call fetches again.
    pub async fn file_attributes(&self, id: INodeId) -> Result<NodeAttributes, VfsError> {
        let file: &INodeFile = self.inodes.get_file(id)?;
        let backend: Arc<dyn ContentBackend> = Arc::clone(&self.backend);
        let locator: String = file.locator().to_string();

        let size: u64 = file
            .size()
            .get_or_fetch(move || async move { backend.fetch_size(&locator).await }.boxed())
            .await
            .map_err(|source| {
                tracing::warn!(path = file.path(), error = %source, "size lookup failed");
                VfsError::AttributeUnavailable {
                    path: file.path().to_string(),
                    source,
                }
            })?;

        Ok(NodeAttributes {
            id,
            kind: INodeType::File,
            size,
            perm: file.permissions(),
            nlink: 1,
        })
    }

    /// Attributes of any node.
    pub async fn attributes(&self, id: INodeId) -> Result<NodeAttributes, VfsError> {
        match self.inodes.inode_type(id) {
            Some(INodeType::Directory) => self.directory_attributes(id),
            Some(INodeType::File) => self.file_attributes(id).await,
            None => Err(VfsError::InodeNotFound(id)),
        }
    }

    /// Find a child of a directory by name.
    ///
    /// # Returns
    /// The child's inode ID, `InodeNotFound` if there is no such entry, or
    /// `NotADirectory` if `parent` is a file.
    pub fn lookup(&self, parent: INodeId, name: &str) -> Result<INodeId, VfsError> {
        let dir = self.inodes.get_dir(parent)?;
        dir.get_child(name).ok_or(VfsError::InodeNotFound(parent))
    }

    /// Look up a child and return its attributes.
    pub async fn lookup_attributes(
        &self,
        parent: INodeId,
        name: &str,
    ) -> Result<NodeAttributes, VfsError> {
        let id: INodeId = self.lookup(parent, name)?;
        self.attributes(id).await
    }

    /// List a directory's entries ordered by name.
    pub fn children(&self, id: INodeId) -> Result<Vec<DirEntry>, VfsError> {
        let dir = self.inodes.get_dir(id)?;
        dir.children()
            .map(|(name, child)| {
                let kind: INodeType = self
                    .inodes
                    .inode_type(child)
                    .ok_or(VfsError::InodeNotFound(child))?;
                Ok(DirEntry {
                    name: name.to_string(),
                    id: child,
                    kind,
                })
            })
            .collect()
    }

    /// Parent of a node (the root is its own parent).
    pub fn parent(&self, id: INodeId) -> Result<INodeId, VfsError> {
        self.inodes
            .get(id)
            .map(|inode| inode.parent_id())
            .ok_or(VfsError::InodeNotFound(id))
    }

    /// Open a file for reading.
    ///
    /// Stateless backends need no handle; the local backend opens the file
    /// once and serves reads from that handle until release.
    pub async fn open(&self, id: INodeId) -> Result<OpenFile, VfsError> {
        let file: &INodeFile = self.inodes.get_file(id)?;
        let session: Option<FileSession> = self
            .backend
            .open_session(file.locator())
            .await
            .map_err(|source| VfsError::ReadFailed {
                path: file.path().to_string(),
                source,
            })?;
        Ok(OpenFile {
            session,
            keep_cache: true,
        })
    }

    /// Read up to `length` bytes at `offset`.
    ///
    /// Returns exactly the bytes obtained; short reads at the end of a file
    /// are normal. If the size is already known and `offset` is at or past
    /// it, returns no bytes without touching the backend.
    ///
    /// # Arguments
    /// * `id` - File inode
    /// * `session` - Handle from [`ObjectView::open`], if the backend gave one
    /// * `offset` - Byte offset
    /// * `length` - Maximum bytes to return
    pub async fn read(
        &self,
        id: INodeId,
        session: Option<&FileSession>,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, VfsError> {
        let file: &INodeFile = self.inodes.get_file(id)?;
        if let Some(size) = file.size().cached() {
            if offset >= size {
                return Ok(Vec::new());
            }
        }

        let result: Result<Vec<u8>, StorageError> = match session {
            Some(session) => session.read_range(offset, length).await,
            None => self.backend.read_range(file.locator(), offset, length).await,
        };
        result.map_err(|source| {
            tracing::warn!(path = file.path(), offset, length, error = %source, "read failed");
            VfsError::ReadFailed {
                path: file.path().to_string(),
                source,
            }
        })
    }

    /// Release an open file, closing its local handle if it has one.
    ///
    /// Close errors are reported once and never retried.
    pub fn release(&self, open: OpenFile) -> Result<(), VfsError> {
        match open.session {
            Some(session) => session.close().map_err(VfsError::ReleaseFailed),
            None => Ok(()),
        }
    }

    /// Root inode ID.
    pub fn root(&self) -> INodeId {
        ROOT_INODE
    }
}
