//! Error types for storage operations.

use rusty_ocfl_model::ModelError;
use thiserror::Error;

/// Errors that can occur while talking to a content backend or storage root.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {locator}")]
    LocatorNotFound { locator: String },

    #[error("Backend unavailable for {locator}: {message}")]
    BackendUnavailable { locator: String, message: String },

    #[error("Invalid storage root {root:?}: {reason}")]
    InvalidStorageRoot { root: String, reason: String },

    #[error("Object {object_id:?} not found at {object_path:?}")]
    ObjectNotFound {
        object_id: String,
        object_path: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl StorageError {
    /// Build a `BackendUnavailable` error from any displayable cause.
    pub(crate) fn unavailable(locator: &str, cause: impl std::fmt::Display) -> Self {
        StorageError::BackendUnavailable {
            locator: locator.to_string(),
            message: cause.to_string(),
        }
    }

    /// Check whether this error means the locator does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::LocatorNotFound { .. })
    }
}
