//! The content backend interface shared by every physical store.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::local::FileSession;

/// A physical store that serves object content by locator.
///
/// A locator is a backend-specific address: an object-store key for S3 or an
/// absolute filesystem path for local disk. Locators are composed by the
/// backend from storage-root-relative slash paths via [`ContentBackend::locator`].
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Short name for logging (e.g., "s3", "local").
    fn kind(&self) -> &'static str;

    /// Compose a locator from a storage-root-relative slash path.
    ///
    /// # Arguments
    /// * `relative` - Path relative to the storage root (e.g., "abc/v1/content/a.txt")
    fn locator(&self, relative: &str) -> String;

    /// Get the size of the content at `locator` in bytes.
    ///
    /// # Returns
    /// The size, `LocatorNotFound`, or `BackendUnavailable`.
    async fn fetch_size(&self, locator: &str) -> Result<u64, StorageError>;

    /// Read up to `length` bytes starting at `offset`.
    ///
    /// Short reads at the end of the content are normal. A range that starts
    /// at or past the end returns no bytes.
    ///
    /// # Arguments
    /// * `locator` - Backend locator
    /// * `offset` - Byte offset to start reading
    /// * `length` - Maximum number of bytes to return
    async fn read_range(
        &self,
        locator: &str,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, StorageError>;

    /// Read the entire content at `locator`.
    async fn read_all(&self, locator: &str) -> Result<Vec<u8>, StorageError>;

    /// Open a scoped handle for repeated reads of one locator.
    ///
    /// Stateless backends return `None` and serve reads through
    /// [`ContentBackend::read_range`].
    async fn open_session(&self, _locator: &str) -> Result<Option<FileSession>, StorageError> {
        Ok(None)
    }
}
