//! Single-flight size memoization for file inodes.
//!
//! ```text
//! Unattributed ──get_or_fetch──► Fetching(shared) ──Ok──► Attributed(size)
//!       ▲                               │
//!       └───────────── Err ─────────────┘
//! ```
//!
//! Concurrent callers that find a fetch in progress await the same shared
//! future, so the backend sees one size request per in-flight attempt.

use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use rusty_ocfl_storage::StorageError;

/// Result of a size fetch, cloneable for every waiter.
type SizeResult = Result<u64, Arc<StorageError>>;

/// Shared future for coordinating concurrent size fetches.
type SharedFetch = Shared<BoxFuture<'static, SizeResult>>;

enum SizeState {
    Unattributed,
    Fetching(SharedFetch),
    Attributed(u64),
}

impl std::fmt::Debug for SizeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeState::Unattributed => write!(f, "Unattributed"),
            SizeState::Fetching(_) => write!(f, "Fetching"),
            SizeState::Attributed(size) => write!(f, "Attributed({})", size),
        }
    }
}

/// A file size that is fetched on first use and then kept for the node's
/// lifetime. Failed fetches are not remembered.
#[derive(Debug)]
pub struct SizeCell {
    state: Mutex<SizeState>,
}

impl Default for SizeCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SizeCell {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SizeState::Unattributed),
        }
    }

    /// Get the size if it has already been fetched.
    pub fn cached(&self) -> Option<u64> {
        match &*self.state.lock() {
            SizeState::Attributed(size) => Some(*size),
            _ => None,
        }
    }

    /// Get the size, fetching it if no value is cached.
    ///
    /// If a fetch is already in flight, joins it instead of starting another.
    ///
    /// # Arguments
    /// * `fetch` - Starts the backend size request; called at most once per attempt
    ///
    /// # Returns
    /// The size, or the shared fetch error.
    pub async fn get_or_fetch<F>(&self, fetch: F) -> SizeResult
    where
        F: FnOnce() -> BoxFuture<'static, Result<u64, StorageError>>,
    {
        let shared: SharedFetch = {
            let mut state = self.state.lock();
            match &*state {
                SizeState::Attributed(size) => return Ok(*size),
                SizeState::Fetching(pending) => pending.clone(),
                SizeState::Unattributed => {
                    let pending: SharedFetch = fetch().map(|r| r.map_err(Arc::new)).boxed().shared();
                    *state = SizeState::Fetching(pending.clone());
                    pending
                }
            }
        };

        let result: SizeResult = shared.clone().await;

        let mut state = self.state.lock();
        if let SizeState::Fetching(current) = &*state {
            if current.ptr_eq(&shared) {
                *state = match &result {
                    Ok(size) => SizeState::Attributed(*size),
                    Err(_) => SizeState::Unattributed,
                };
            }
        }
        result
    }
}
