//! Read-only virtual filesystem projecting one OCFL object version.
//!
//! A version of an object in an OCFL storage root (on S3 or local disk) is
//! resolved, mapped to content locators, and built into an immutable inode
//! tree. File sizes are fetched lazily and content is read by byte range on
//! demand; nothing is copied up front.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: FUSE Interface (OcflVfs, feature "fuse")
//! Layer 2: Node callbacks (ObjectView: attributes, lookup, open, read)
//! Layer 1: Primitives (map_version, build_tree, INodeManager, SizeCell)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rusty_ocfl_vfs::{open_object, spawn_mount, OcflVfs, VfsOptions};
//! use rusty_ocfl_storage::S3Config;
//!
//! let object = open_object("s3://bucket/root", "ark:123/abc", "", &S3Config::default()).await?;
//! let options = VfsOptions::default().with_fs_name(object.info.fs_name());
//! let vfs = OcflVfs::new(object.view, options)?;
//! let session = spawn_mount(vfs, Path::new("/mnt/abc"))?;
//! ```

pub mod builder;
pub mod error;
pub mod executor;
pub mod inode;
pub mod mapper;
pub mod object_fs;
pub mod options;
pub mod view;

#[cfg(feature = "fuse")]
pub mod fuse;

pub use error::VfsError;
pub use executor::{AsyncExecutor, ExecutorConfig, ExecutorError};
pub use options::{KernelCacheOptions, VfsOptions};

pub use builder::{build_tree, validate_logical_path};
pub use inode::{INode, INodeDir, INodeFile, INodeId, INodeManager, INodeType, ROOT_INODE};
pub use mapper::{map_version, FileMap};
pub use object_fs::{open_object, open_object_with_backend, ObjectFs, ObjectInfo};
pub use view::{DirEntry, NodeAttributes, ObjectView, OpenFile};

#[cfg(feature = "fuse")]
pub use fuse::{mount, spawn_mount, OcflVfs};
