//! Storage root addresses and backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::StorageError;
use crate::local::LocalBackend;
use crate::s3::{S3Backend, S3Config};
use crate::traits::ContentBackend;

const S3_SCHEME: &str = "s3://";

/// Where an OCFL storage root lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// `s3://bucket[/prefix]`
    S3 { bucket: String, prefix: String },
    /// An absolute local directory.
    Local(PathBuf),
}

impl StorageLocation {
    /// Parse a storage root string.
    ///
    /// `s3://bucket[/prefix]` selects S3; anything else is a local path,
    /// made absolute against the current directory.
    ///
    /// # Arguments
    /// * `root` - Storage root as given on the command line
    pub fn parse(root: &str) -> Result<Self, StorageError> {
        if let Some(rest) = root.strip_prefix(S3_SCHEME) {
            let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return Err(StorageError::InvalidStorageRoot {
                    root: root.to_string(),
                    reason: "missing bucket name".into(),
                });
            }
            return Ok(StorageLocation::S3 {
                bucket: bucket.to_string(),
                prefix: prefix.trim_matches('/').to_string(),
            });
        }

        if root.is_empty() {
            return Err(StorageError::InvalidStorageRoot {
                root: root.to_string(),
                reason: "empty path".into(),
            });
        }
        let path = PathBuf::from(root);
        let absolute: PathBuf = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(StorageLocation::Local(absolute))
    }

    /// Create the content backend for this location.
    ///
    /// # Arguments
    /// * `s3_config` - Client overrides, used only for S3 locations
    pub async fn connect(&self, s3_config: &S3Config) -> Arc<dyn ContentBackend> {
        match self {
            StorageLocation::S3 { bucket, prefix } => {
                tracing::debug!(%bucket, %prefix, "connecting to S3 storage root");
                Arc::new(S3Backend::connect(bucket.clone(), prefix.clone(), s3_config).await)
            }
            StorageLocation::Local(path) => {
                tracing::debug!(path = %path.display(), "using local storage root");
                Arc::new(LocalBackend::new(path.clone()))
            }
        }
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageLocation::S3 { bucket, prefix } if prefix.is_empty() => {
                write!(f, "{}{}", S3_SCHEME, bucket)
            }
            StorageLocation::S3 { bucket, prefix } => write!(f, "{}{}/{}", S3_SCHEME, bucket, prefix),
            StorageLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_s3() {
        assert_eq!(
            StorageLocation::parse("s3://bucket").unwrap(),
            StorageLocation::S3 {
                bucket: "bucket".into(),
                prefix: "".into()
            }
        );
        assert_eq!(
            StorageLocation::parse("s3://bucket/a/b/").unwrap(),
            StorageLocation::S3 {
                bucket: "bucket".into(),
                prefix: "a/b".into()
            }
        );
        assert!(matches!(
            StorageLocation::parse("s3://"),
            Err(StorageError::InvalidStorageRoot { .. })
        ));
    }

    #[test]
    fn test_parse_local() {
        assert_eq!(
            StorageLocation::parse("/data/ocfl").unwrap(),
            StorageLocation::Local(PathBuf::from("/data/ocfl"))
        );

        match StorageLocation::parse("relative/root").unwrap() {
            StorageLocation::Local(path) => {
                assert!(path.is_absolute());
                assert!(path.ends_with("relative/root"));
            }
            other => panic!("unexpected location {:?}", other),
        }

        assert!(StorageLocation::parse("").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(StorageLocation::parse("s3://b/p").unwrap().to_string(), "s3://b/p");
        assert_eq!(StorageLocation::parse("s3://b").unwrap().to_string(), "s3://b");
    }

    #[tokio::test]
    async fn test_connect_local() {
        let location = StorageLocation::Local(PathBuf::from("/srv/ocfl"));
        let backend = location.connect(&S3Config::default()).await;
        assert_eq!(backend.kind(), "local");
        assert_eq!(backend.locator("obj/inventory.json"), "/srv/ocfl/obj/inventory.json");
    }
}
