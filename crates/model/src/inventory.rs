//! OCFL `inventory.json` decoding and version resolution.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::digest::DigestAlgorithm;
use crate::error::ModelError;
use crate::object::ObjectVersion;
use crate::version::{VersionNum, VersionSelector};

/// Name of the inventory file at the root of every OCFL object.
pub const INVENTORY_FILE: &str = "inventory.json";

/// Default content directory when the inventory does not declare one.
pub const DEFAULT_CONTENT_DIRECTORY: &str = "content";

/// An OCFL object inventory.
///
/// Field names follow the OCFL JSON encoding; `manifest` maps digests to
/// object-root-relative content paths, and each version's `state` maps
/// digests to logical paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    /// Object identifier.
    pub id: String,
    /// Inventory type URI (e.g., "https://ocfl.io/1.1/spec/#inventory").
    #[serde(rename = "type")]
    pub inventory_type: String,
    /// Digest algorithm name used for `manifest` and `state` keys.
    pub digest_algorithm: String,
    /// Name of the most recent version.
    pub head: String,
    /// Content directory name, if not the default `content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_directory: Option<String>,
    /// Digest to content paths.
    pub manifest: BTreeMap<String, Vec<String>>,
    /// Version name to version record.
    pub versions: BTreeMap<String, InventoryVersion>,
}

/// One version record inside an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryVersion {
    /// RFC 3339 creation timestamp.
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Digest to logical paths.
    pub state: BTreeMap<String, Vec<String>>,
}

/// The agent that created a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Inventory {
    /// Decode and validate an inventory from raw JSON bytes.
    ///
    /// # Arguments
    /// * `data` - Contents of an `inventory.json` file
    ///
    /// # Returns
    /// The validated inventory.
    pub fn decode(data: &[u8]) -> Result<Self, ModelError> {
        let inventory: Inventory = serde_json::from_slice(data)?;
        inventory.validate()?;
        Ok(inventory)
    }

    /// Check the structural rules this crate relies on.
    ///
    /// Checks the id, the digest algorithm, version names, and that `head`
    /// names the highest version. Manifest coverage of state digests is left
    /// to path mapping, which reports the specific missing digest.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.id.is_empty() {
            return Err(ModelError::InvalidInventory("empty object id".into()));
        }
        DigestAlgorithm::parse(&self.digest_algorithm)?;

        if self.versions.is_empty() {
            return Err(ModelError::InvalidInventory("no versions".into()));
        }

        let mut seen: BTreeSet<VersionNum> = BTreeSet::new();
        for name in self.versions.keys() {
            let num: VersionNum = VersionNum::from_inventory_name(name).ok_or_else(|| {
                ModelError::InvalidInventory(format!("invalid version name {:?}", name))
            })?;
            if !seen.insert(num) {
                return Err(ModelError::InvalidInventory(format!(
                    "duplicate version number {}",
                    num
                )));
            }
        }

        if !self.versions.contains_key(&self.head) {
            return Err(ModelError::InvalidInventory(format!(
                "head {:?} is not a listed version",
                self.head
            )));
        }
        let head_num: Option<VersionNum> = VersionNum::from_inventory_name(&self.head);
        if head_num != seen.iter().next_back().copied() {
            return Err(ModelError::InvalidInventory(format!(
                "head {:?} is not the latest version",
                self.head
            )));
        }

        Ok(())
    }

    /// Get the parsed digest algorithm.
    pub fn algorithm(&self) -> Result<DigestAlgorithm, ModelError> {
        DigestAlgorithm::parse(&self.digest_algorithm)
    }

    /// Get the content directory name.
    pub fn content_directory(&self) -> &str {
        self.content_directory
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_DIRECTORY)
    }

    /// List version names ordered by version number.
    pub fn version_names(&self) -> Vec<String> {
        let mut names: Vec<(u32, &String)> = self
            .versions
            .keys()
            .map(|name| {
                let num: u32 = VersionNum::from_inventory_name(name).map_or(0, |n| n.get());
                (num, name)
            })
            .collect();
        names.sort();
        names.into_iter().map(|(_, name)| name.clone()).collect()
    }

    /// Find the inventory's name for a version number.
    ///
    /// Names are matched numerically, so `v1` finds `v001` in a padded
    /// inventory.
    fn find_version(&self, num: VersionNum) -> Option<(&String, &InventoryVersion)> {
        self.versions
            .iter()
            .find(|(name, _)| VersionNum::from_inventory_name(name) == Some(num))
    }

    /// Resolve a version selector to an immutable object version.
    ///
    /// # Arguments
    /// * `selector` - Head or an explicit version number
    ///
    /// # Returns
    /// The resolved version, or `VersionNotFound` listing available names.
    pub fn resolve(&self, selector: &VersionSelector) -> Result<ObjectVersion, ModelError> {
        let (name, record) = match selector {
            VersionSelector::Head => self
                .versions
                .get_key_value(&self.head)
                .ok_or_else(|| self.not_found(&self.head))?,
            VersionSelector::Num(num) => self
                .find_version(*num)
                .ok_or_else(|| self.not_found(&num.to_string()))?,
        };

        let num: VersionNum = VersionNum::from_inventory_name(name)
            .ok_or_else(|| ModelError::InvalidInventory(format!("invalid version name {:?}", name)))?;

        let mut state: BTreeMap<String, String> = BTreeMap::new();
        for (digest, logical_paths) in &record.state {
            for logical_path in logical_paths {
                if state
                    .insert(logical_path.clone(), digest.to_ascii_lowercase())
                    .is_some()
                {
                    return Err(ModelError::InvalidInventory(format!(
                        "logical path {:?} appears more than once in {}",
                        logical_path, name
                    )));
                }
            }
        }

        let mut manifest: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (digest, content_paths) in &self.manifest {
            if manifest
                .insert(digest.to_ascii_lowercase(), content_paths.clone())
                .is_some()
            {
                return Err(ModelError::InvalidInventory(format!(
                    "manifest digest {} listed more than once",
                    digest
                )));
            }
        }

        Ok(ObjectVersion::new(
            self.id.clone(),
            num,
            self.algorithm()?,
            state,
            manifest,
        )
        .with_name(name.clone())
        .with_metadata(
            Some(record.created.clone()),
            record.message.clone(),
            record.user.clone(),
        ))
    }

    fn not_found(&self, requested: &str) -> ModelError {
        ModelError::VersionNotFound {
            requested: requested.to_string(),
            available: self.version_names(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST_A: &str = "43a43fe8a8a082d3b5343dfaf2fd0c8b8e370675b1f376e92e9994612c33ea255b11298269d72f797399ebb94edeefe53df243643676548f584fb8603ca53a0f";
    const DIGEST_B: &str = "aabbccddeeff00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff0011223344556677889900";

    fn sample_json() -> String {
        format!(
            r#"{{
                "digestAlgorithm": "sha512",
                "head": "v2",
                "id": "ark:123/abc",
                "manifest": {{
                    "{a}": ["v1/content/a_file.txt"],
                    "{b}": ["v2/content/b_file.txt", "v2/content/copy/b_file.txt"]
                }},
                "type": "https://ocfl.io/1.0/spec/#inventory",
                "versions": {{
                    "v1": {{
                        "created": "2019-01-01T02:03:04Z",
                        "message": "An version with one file",
                        "state": {{ "{a}": ["a_file.txt"] }},
                        "user": {{ "address": "mailto:a_person@example.org", "name": "A Person" }}
                    }},
                    "v2": {{
                        "created": "2019-01-02T02:03:04Z",
                        "state": {{ "{a}": ["a_file.txt"], "{b}": ["dir/b_file.txt"] }}
                    }}
                }}
            }}"#,
            a = DIGEST_A,
            b = DIGEST_B
        )
    }

    #[test]
    fn test_decode_sample() {
        let inventory = Inventory::decode(sample_json().as_bytes()).unwrap();
        assert_eq!(inventory.id, "ark:123/abc");
        assert_eq!(inventory.head, "v2");
        assert_eq!(inventory.algorithm().unwrap(), DigestAlgorithm::Sha512);
        assert_eq!(inventory.content_directory(), "content");
        assert_eq!(inventory.version_names(), vec!["v1", "v2"]);
        let v1 = &inventory.versions["v1"];
        assert_eq!(v1.user.as_ref().unwrap().name, "A Person");
    }

    #[test]
    fn test_resolve_head_and_explicit() {
        let inventory = Inventory::decode(sample_json().as_bytes()).unwrap();

        let head = inventory.resolve(&VersionSelector::Head).unwrap();
        assert_eq!(head.version().get(), 2);
        assert_eq!(head.file_count(), 2);
        assert_eq!(head.digest_for("dir/b_file.txt"), Some(DIGEST_B));

        let v1 = inventory.resolve(&VersionSelector::parse("v1").unwrap()).unwrap();
        assert_eq!(v1.version_name(), "v1");
        assert_eq!(v1.file_count(), 1);
        assert_eq!(v1.message(), Some("An version with one file"));
        assert_eq!(
            v1.content_paths(DIGEST_A).unwrap(),
            &["v1/content/a_file.txt".to_string()]
        );
    }

    #[test]
    fn test_resolve_missing_version_lists_available() {
        let inventory = Inventory::decode(sample_json().as_bytes()).unwrap();
        let err = inventory
            .resolve(&VersionSelector::parse("v99").unwrap())
            .unwrap_err();
        match err {
            ModelError::VersionNotFound { requested, available } => {
                assert_eq!(requested, "v99");
                assert_eq!(available, vec!["v1", "v2"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_zero_padded_names_match_by_number() {
        let json = format!(
            r#"{{
                "digestAlgorithm": "sha512", "head": "v002", "id": "padded",
                "type": "https://ocfl.io/1.1/spec/#inventory",
                "manifest": {{ "{a}": ["v001/content/x"] }},
                "versions": {{
                    "v001": {{ "created": "2020-01-01T00:00:00Z", "state": {{ "{a}": ["x"] }} }},
                    "v002": {{ "created": "2020-01-02T00:00:00Z", "state": {{ "{a}": ["x", "y"] }} }}
                }}
            }}"#,
            a = DIGEST_A
        );
        let inventory = Inventory::decode(json.as_bytes()).unwrap();
        let v1 = inventory.resolve(&VersionSelector::parse("v1").unwrap()).unwrap();
        assert_eq!(v1.version_name(), "v001");
        let head = inventory.resolve(&VersionSelector::Head).unwrap();
        assert_eq!(head.file_count(), 2);
    }

    #[test]
    fn test_digests_are_lowercased() {
        let upper = DIGEST_A.to_ascii_uppercase();
        let json = format!(
            r#"{{
                "digestAlgorithm": "sha512", "head": "v1", "id": "case",
                "type": "https://ocfl.io/1.1/spec/#inventory",
                "manifest": {{ "{u}": ["v1/content/x"] }},
                "versions": {{ "v1": {{ "created": "2020-01-01T00:00:00Z", "state": {{ "{u}": ["x"] }} }} }}
            }}"#,
            u = upper
        );
        let inventory = Inventory::decode(json.as_bytes()).unwrap();
        let version = inventory.resolve(&VersionSelector::Head).unwrap();
        assert_eq!(version.digest_for("x"), Some(DIGEST_A));
        assert!(version.content_paths(DIGEST_A).is_some());
    }

    #[test]
    fn test_invalid_inventories() {
        let bad_algorithm = sample_json().replace("\"sha512\"", "\"md5\"");
        assert!(matches!(
            Inventory::decode(bad_algorithm.as_bytes()),
            Err(ModelError::UnsupportedDigestAlgorithm(_))
        ));

        let bad_head = sample_json().replace("\"head\": \"v2\"", "\"head\": \"v1\"");
        assert!(matches!(
            Inventory::decode(bad_head.as_bytes()),
            Err(ModelError::InvalidInventory(_))
        ));

        let missing_head = sample_json().replace("\"head\": \"v2\"", "\"head\": \"v3\"");
        assert!(matches!(
            Inventory::decode(missing_head.as_bytes()),
            Err(ModelError::InvalidInventory(_))
        ));

        assert!(matches!(
            Inventory::decode(b"{ not json"),
            Err(ModelError::InventoryParse(_))
        ));
    }

    #[test]
    fn test_duplicate_logical_path_rejected() {
        let json = format!(
            r#"{{
                "digestAlgorithm": "sha512", "head": "v1", "id": "dup",
                "type": "https://ocfl.io/1.1/spec/#inventory",
                "manifest": {{ "{a}": ["v1/content/x"], "{b}": ["v1/content/y"] }},
                "versions": {{ "v1": {{ "created": "2020-01-01T00:00:00Z",
                    "state": {{ "{a}": ["same"], "{b}": ["same"] }} }} }}
            }}"#,
            a = DIGEST_A,
            b = DIGEST_B
        );
        let inventory = Inventory::decode(json.as_bytes()).unwrap();
        assert!(matches!(
            inventory.resolve(&VersionSelector::Head),
            Err(ModelError::InvalidInventory(_))
        ));
    }
}
