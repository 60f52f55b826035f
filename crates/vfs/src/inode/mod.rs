//! INode primitives for the virtual filesystem.
//!
//! This module provides the data structures for the read-only tree that
//! represents one object version: directories, files bound to a backend
//! locator, and the per-file size memo.

mod dir;
mod file;
mod manager;
mod size;
mod types;

pub use dir::{INodeDir, DIR_PERMS};
pub use file::{INodeFile, FILE_PERMS};
pub use manager::INodeManager;
pub use size::SizeCell;
pub use types::{INode, INodeId, INodeType, ROOT_INODE};
