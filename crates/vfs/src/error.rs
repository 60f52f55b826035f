//! Error types for the VFS crate.

use std::sync::Arc;

use rusty_ocfl_model::ModelError;
use rusty_ocfl_storage::StorageError;
use thiserror::Error;

use crate::executor::ExecutorError;
use crate::inode::INodeId;

/// Errors that can occur while building or serving an object view.
#[derive(Debug, Error)]
pub enum VfsError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A state digest has no content path in the manifest.
    #[error("Missing manifest entry for digest {digest} (logical path {logical_path:?})")]
    MissingManifestEntry {
        digest: String,
        logical_path: String,
    },

    /// A path is used both as a file and as a directory.
    #[error("Structural conflict: {path:?} is both a file and a directory")]
    StructuralConflict { path: String },

    #[error("Invalid logical path {path:?}: {reason}")]
    InvalidLogicalPath { path: String, reason: &'static str },

    /// The file's size could not be fetched. Not cached; the next call retries.
    #[error("Attributes unavailable for {path:?}: {source}")]
    AttributeUnavailable {
        path: String,
        #[source]
        source: Arc<StorageError>,
    },

    #[error("Read failed for {path:?}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("Release failed: {0}")]
    ReleaseFailed(#[source] StorageError),

    #[error("Inode not found: {0}")]
    InodeNotFound(INodeId),

    #[error("Not a file: {0}")]
    NotAFile(INodeId),

    #[error("Not a directory: {0}")]
    NotADirectory(INodeId),

    #[error("Mount failed: {0}")]
    MountFailed(String),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),
}
