//! Content storage for OCFL object mounts.
//!
//! This crate provides the physical side of serving an OCFL object:
//!
//! - **[`ContentBackend`]** - the interface every store implements: locator
//!   composition, size lookup, byte-range reads, and optional file sessions
//! - **[`S3Backend`]** - byte-range GET and HEAD requests against a bucket
//! - **[`LocalBackend`]** - positional reads from a storage root on disk
//! - **`MemoryBackend`** - in-memory content with call counters, for tests
//!   (behind the `test-util` feature)
//!
//! # Storage Roots
//!
//! [`StorageLocation`] parses a storage root (`s3://bucket/prefix` or a local
//! path) and connects the matching backend. [`OcflRoot`] then discovers the
//! root's layout and loads object inventories.

mod error;
pub mod local;
pub mod location;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod repository;
pub mod s3;
mod traits;

pub use error::StorageError;
pub use local::{FileSession, LocalBackend};
pub use location::StorageLocation;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryBackend;
pub use repository::{OcflObject, OcflRoot};
pub use s3::{S3Backend, S3Config};
pub use traits::ContentBackend;
