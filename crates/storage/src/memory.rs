//! In-memory content backend for tests and fixtures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StorageError;
use crate::traits::ContentBackend;

/// A backend holding content in a map keyed by locator.
///
/// Counts size and range calls, and can delay or fail size lookups so
/// callers can observe concurrent and failing behavior.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    size_calls: AtomicU64,
    read_calls: AtomicU64,
    pending_size_failures: AtomicU64,
    size_delay: Option<Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every `fetch_size` call by `delay`.
    pub fn with_size_delay(mut self, delay: Duration) -> Self {
        self.size_delay = Some(delay);
        self
    }

    /// Store content under a storage-root-relative path.
    pub fn insert(&self, relative: &str, data: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .insert(self.locator(relative), data.into());
    }

    /// Make the next `count` size lookups fail with `BackendUnavailable`.
    pub fn fail_next_sizes(&self, count: u64) {
        self.pending_size_failures.store(count, Ordering::SeqCst);
    }

    /// Number of `fetch_size` calls made so far.
    pub fn size_calls(&self) -> u64 {
        self.size_calls.load(Ordering::SeqCst)
    }

    /// Number of `read_range` calls made so far.
    pub fn read_calls(&self) -> u64 {
        self.read_calls.load(Ordering::SeqCst)
    }

    fn get(&self, locator: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .read()
            .get(locator)
            .cloned()
            .ok_or_else(|| StorageError::LocatorNotFound {
                locator: locator.to_string(),
            })
    }
}

#[async_trait]
impl ContentBackend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn locator(&self, relative: &str) -> String {
        relative.trim_start_matches('/').to_string()
    }

    async fn fetch_size(&self, locator: &str) -> Result<u64, StorageError> {
        self.size_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.size_delay {
            tokio::time::sleep(delay).await;
        }
        let should_fail: bool = self
            .pending_size_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(StorageError::unavailable(locator, "injected failure"));
        }
        self.get(locator).map(|data| data.len() as u64)
    }

    async fn read_range(
        &self,
        locator: &str,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, StorageError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let data: Vec<u8> = self.get(locator)?;
        let start: usize = (offset.min(data.len() as u64)) as usize;
        let end: usize = (offset.saturating_add(length).min(data.len() as u64)) as usize;
        Ok(data[start..end].to_vec())
    }

    async fn read_all(&self, locator: &str) -> Result<Vec<u8>, StorageError> {
        self.get(locator)
    }
}
