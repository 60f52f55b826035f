//! The resolved, immutable view of one object version.

use std::collections::BTreeMap;

use crate::digest::DigestAlgorithm;
use crate::inventory::User;
use crate::version::VersionNum;

/// One version of an OCFL object, ready for path mapping.
///
/// The state is keyed by logical path (the inverse of the inventory's
/// digest-keyed state), and all digests are lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectVersion {
    object_id: String,
    version: VersionNum,
    version_name: String,
    digest_algorithm: DigestAlgorithm,
    state: BTreeMap<String, String>,
    manifest: BTreeMap<String, Vec<String>>,
    created: Option<String>,
    message: Option<String>,
    user: Option<User>,
}

impl ObjectVersion {
    /// Create a new object version.
    ///
    /// # Arguments
    /// * `object_id` - OCFL object identifier
    /// * `version` - Version number
    /// * `digest_algorithm` - Algorithm the digests were computed with
    /// * `state` - Logical path to digest
    /// * `manifest` - Digest to object-root-relative content paths
    pub fn new(
        object_id: String,
        version: VersionNum,
        digest_algorithm: DigestAlgorithm,
        state: BTreeMap<String, String>,
        manifest: BTreeMap<String, Vec<String>>,
    ) -> Self {
        let state = state
            .into_iter()
            .map(|(path, digest)| (path, digest.to_ascii_lowercase()))
            .collect();
        let manifest = manifest
            .into_iter()
            .map(|(digest, paths)| (digest.to_ascii_lowercase(), paths))
            .collect();
        Self {
            object_id,
            version,
            version_name: version.to_string(),
            digest_algorithm,
            state,
            manifest,
            created: None,
            message: None,
            user: None,
        }
    }

    /// Set the version name as spelled in the inventory (e.g., `v001`).
    pub fn with_name(mut self, name: String) -> Self {
        self.version_name = name;
        self
    }

    /// Attach the version's descriptive metadata.
    pub fn with_metadata(
        mut self,
        created: Option<String>,
        message: Option<String>,
        user: Option<User>,
    ) -> Self {
        self.created = created;
        self.message = message;
        self.user = user;
        self
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn version(&self) -> VersionNum {
        self.version
    }

    /// Version name as spelled in the inventory.
    pub fn version_name(&self) -> &str {
        &self.version_name
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    /// Iterate `(logical_path, digest)` pairs ordered by logical path.
    pub fn state(&self) -> impl Iterator<Item = (&str, &str)> {
        self.state.iter().map(|(p, d)| (p.as_str(), d.as_str()))
    }

    /// Number of logical files in this version.
    pub fn file_count(&self) -> usize {
        self.state.len()
    }

    /// Look up the digest of a logical path.
    pub fn digest_for(&self, logical_path: &str) -> Option<&str> {
        self.state.get(logical_path).map(String::as_str)
    }

    /// Look up the content paths stored for a digest.
    ///
    /// # Returns
    /// The manifest's ordered content paths, or None if the digest is absent.
    pub fn content_paths(&self, digest: &str) -> Option<&[String]> {
        self.manifest
            .get(&digest.to_ascii_lowercase())
            .map(Vec::as_slice)
    }

    pub fn created(&self) -> Option<&str> {
        self.created.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lowercases_digests() {
        let state = BTreeMap::from([("a.txt".to_string(), "ABCD".to_string())]);
        let manifest = BTreeMap::from([("AbCd".to_string(), vec!["v1/content/a.txt".to_string()])]);
        let version = ObjectVersion::new(
            "obj".into(),
            VersionNum::new(1).unwrap(),
            DigestAlgorithm::Sha512,
            state,
            manifest,
        );

        assert_eq!(version.digest_for("a.txt"), Some("abcd"));
        assert_eq!(version.content_paths("ABCD").unwrap().len(), 1);
        assert_eq!(version.version_name(), "v1");
        assert_eq!(version.created(), None);
    }

    #[test]
    fn test_state_is_ordered() {
        let state = BTreeMap::from([
            ("z".to_string(), "1".to_string()),
            ("a/b".to_string(), "2".to_string()),
            ("a".to_string(), "3".to_string()),
        ]);
        let version = ObjectVersion::new(
            "obj".into(),
            VersionNum::new(3).unwrap(),
            DigestAlgorithm::Sha256,
            state,
            BTreeMap::new(),
        );
        let paths: Vec<&str> = version.state().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a", "a/b", "z"]);
    }
}
