//! Error types for object model operations.

use thiserror::Error;

/// Errors that can occur while decoding or resolving OCFL metadata.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid version {0:?}: expected \"\" (head) or v<positive integer>")]
    InvalidVersionToken(String),

    #[error("Version {requested} not found; available versions: {available:?}")]
    VersionNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("JSON parse error: {0}")]
    InventoryParse(#[from] serde_json::Error),

    #[error("Invalid inventory: {0}")]
    InvalidInventory(String),

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedDigestAlgorithm(String),

    #[error("Unsupported storage layout extension: {0}")]
    UnsupportedLayout(String),

    #[error("Invalid layout config for {extension}: {reason}")]
    InvalidLayoutConfig {
        extension: String,
        reason: String,
    },
}
