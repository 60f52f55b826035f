//! Local filesystem content backend.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::os::unix::io::IntoRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::traits::ContentBackend;

/// Serves content from a storage root on local disk.
///
/// Locators are absolute filesystem paths.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at `root`.
    ///
    /// # Arguments
    /// * `root` - Absolute path of the storage root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Map an I/O error on `locator` to a storage error.
fn map_io(locator: &str, err: io::Error) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::LocatorNotFound {
            locator: locator.to_string(),
        }
    } else {
        StorageError::unavailable(locator, err)
    }
}

/// Positional read of up to `length` bytes, looping until full or EOF.
fn pread(file: &File, offset: u64, length: u64) -> io::Result<Vec<u8>> {
    let mut buf: Vec<u8> = vec![0u8; length as usize];
    let mut filled: usize = 0;
    while filled < buf.len() {
        match file.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

async fn pread_blocking(
    file: Arc<File>,
    locator: &str,
    offset: u64,
    length: u64,
) -> Result<Vec<u8>, StorageError> {
    if length == 0 {
        return Ok(Vec::new());
    }
    let owned: String = locator.to_string();
    tokio::task::spawn_blocking(move || pread(&file, offset, length))
        .await
        .map_err(|e| StorageError::unavailable(&owned, e))?
        .map_err(|e| map_io(&owned, e))
}

#[async_trait]
impl ContentBackend for LocalBackend {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn locator(&self, relative: &str) -> String {
        let mut path: PathBuf = self.root.clone();
        for component in relative.split('/').filter(|c| !c.is_empty()) {
            path.push(component);
        }
        path.to_string_lossy().into_owned()
    }

    async fn fetch_size(&self, locator: &str) -> Result<u64, StorageError> {
        let metadata = tokio::fs::metadata(locator)
            .await
            .map_err(|e| map_io(locator, e))?;
        Ok(metadata.len())
    }

    async fn read_range(
        &self,
        locator: &str,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, StorageError> {
        let owned: String = locator.to_string();
        let file: File = tokio::task::spawn_blocking(move || File::open(owned))
            .await
            .map_err(|e| StorageError::unavailable(locator, e))?
            .map_err(|e| map_io(locator, e))?;
        pread_blocking(Arc::new(file), locator, offset, length).await
    }

    async fn read_all(&self, locator: &str) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(locator)
            .await
            .map_err(|e| map_io(locator, e))
    }

    async fn open_session(&self, locator: &str) -> Result<Option<FileSession>, StorageError> {
        let owned: String = locator.to_string();
        let file: File = tokio::task::spawn_blocking(move || File::open(owned))
            .await
            .map_err(|e| StorageError::unavailable(locator, e))?
            .map_err(|e| map_io(locator, e))?;
        tracing::trace!(locator, "opened local file session");
        Ok(Some(FileSession {
            file: Arc::new(file),
            locator: locator.to_string(),
        }))
    }
}

/// An open local file, shared by concurrent reads.
///
/// Clones share one descriptor. Reads use positional I/O, so they never
/// contend on a file cursor.
#[derive(Debug, Clone)]
pub struct FileSession {
    file: Arc<File>,
    locator: String,
}

impl FileSession {
    /// Get the locator this session was opened for.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Read up to `length` bytes at `offset`; EOF yields a short read.
    pub async fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>, StorageError> {
        pread_blocking(Arc::clone(&self.file), &self.locator, offset, length).await
    }

    /// Close the session and report any close error.
    ///
    /// If another clone of this session is still alive (a read in flight),
    /// the descriptor is closed when the last clone drops and no error can
    /// be observed here.
    pub fn close(self) -> Result<(), StorageError> {
        let file: File = match Arc::try_unwrap(self.file) {
            Ok(file) => file,
            Err(_shared) => {
                tracing::debug!(locator = %self.locator, "session still shared; deferring close");
                return Ok(());
            }
        };
        let fd = file.into_raw_fd();
        // SAFETY: `fd` was just released from an owned `File` and is closed exactly once.
        let rc: libc::c_int = unsafe { libc::close(fd) };
        if rc != 0 {
            return Err(StorageError::unavailable(
                &self.locator,
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }
}
