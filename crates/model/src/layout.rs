//! Storage root layout extensions.
//!
//! A storage root declares its layout in `ocfl_layout.json`; the layout's
//! parameters live in `extensions/<extension>/config.json`. A layout maps an
//! object id to the object's root path below the storage root.

use serde::{Deserialize, Serialize};

use crate::digest::DigestAlgorithm;
use crate::error::ModelError;

/// Name of the layout declaration file at the storage root.
pub const LAYOUT_FILE: &str = "ocfl_layout.json";

pub const FLAT_DIRECT: &str = "0002-flat-direct-storage-layout";
pub const HASH_AND_ID_N_TUPLE: &str = "0003-hash-and-id-n-tuple-storage-layout";
pub const HASHED_N_TUPLE: &str = "0004-hashed-n-tuple-storage-layout";

/// Longest encoded id kept verbatim by the hash-and-id layout.
const MAX_ENCODED_ID_LEN: usize = 100;

/// Contents of `ocfl_layout.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDeclaration {
    pub extension: String,
    #[serde(default)]
    pub description: String,
}

impl LayoutDeclaration {
    /// Decode an `ocfl_layout.json` document.
    pub fn decode(data: &[u8]) -> Result<Self, ModelError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Storage-root-relative path of this extension's config file.
    pub fn config_path(&self) -> String {
        format!("extensions/{}/config.json", self.extension)
    }
}

fn default_algorithm() -> DigestAlgorithm {
    DigestAlgorithm::Sha256
}

fn default_tuple() -> usize {
    3
}

/// Parameters of `0003-hash-and-id-n-tuple-storage-layout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashAndIdNTupleConfig {
    #[serde(default)]
    pub extension_name: Option<String>,
    #[serde(default = "default_algorithm")]
    pub digest_algorithm: DigestAlgorithm,
    #[serde(default = "default_tuple")]
    pub tuple_size: usize,
    #[serde(default = "default_tuple")]
    pub number_of_tuples: usize,
}

impl Default for HashAndIdNTupleConfig {
    fn default() -> Self {
        Self {
            extension_name: Some(HASH_AND_ID_N_TUPLE.to_string()),
            digest_algorithm: default_algorithm(),
            tuple_size: default_tuple(),
            number_of_tuples: default_tuple(),
        }
    }
}

/// Parameters of `0004-hashed-n-tuple-storage-layout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedNTupleConfig {
    #[serde(default)]
    pub extension_name: Option<String>,
    #[serde(default = "default_algorithm")]
    pub digest_algorithm: DigestAlgorithm,
    #[serde(default = "default_tuple")]
    pub tuple_size: usize,
    #[serde(default = "default_tuple")]
    pub number_of_tuples: usize,
    #[serde(default)]
    pub short_object_root: bool,
}

impl Default for HashedNTupleConfig {
    fn default() -> Self {
        Self {
            extension_name: Some(HASHED_N_TUPLE.to_string()),
            digest_algorithm: default_algorithm(),
            tuple_size: default_tuple(),
            number_of_tuples: default_tuple(),
            short_object_root: false,
        }
    }
}

/// A supported storage layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLayout {
    /// The object id is the object path.
    FlatDirect,
    /// Digest tuples followed by the percent-encoded object id.
    HashAndIdNTuple(HashAndIdNTupleConfig),
    /// Digest tuples followed by the digest (or its remainder).
    HashedNTuple(HashedNTupleConfig),
}

impl StorageLayout {
    /// Build a layout from its extension name and optional config document.
    ///
    /// A missing config means the extension's defaults.
    ///
    /// # Arguments
    /// * `extension` - Extension name from `ocfl_layout.json`
    /// * `config` - Raw `config.json` bytes, if the file exists
    pub fn from_extension(extension: &str, config: Option<&[u8]>) -> Result<Self, ModelError> {
        let layout = match extension {
            FLAT_DIRECT => StorageLayout::FlatDirect,
            HASH_AND_ID_N_TUPLE => {
                let cfg: HashAndIdNTupleConfig = match config {
                    Some(data) => parse_config(extension, data)?,
                    None => HashAndIdNTupleConfig::default(),
                };
                check_name(extension, cfg.extension_name.as_deref())?;
                StorageLayout::HashAndIdNTuple(cfg)
            }
            HASHED_N_TUPLE => {
                let cfg: HashedNTupleConfig = match config {
                    Some(data) => parse_config(extension, data)?,
                    None => HashedNTupleConfig::default(),
                };
                check_name(extension, cfg.extension_name.as_deref())?;
                StorageLayout::HashedNTuple(cfg)
            }
            other => return Err(ModelError::UnsupportedLayout(other.to_string())),
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Extension name of this layout.
    pub fn name(&self) -> &'static str {
        match self {
            StorageLayout::FlatDirect => FLAT_DIRECT,
            StorageLayout::HashAndIdNTuple(_) => HASH_AND_ID_N_TUPLE,
            StorageLayout::HashedNTuple(_) => HASHED_N_TUPLE,
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        match self {
            StorageLayout::FlatDirect => Ok(()),
            StorageLayout::HashAndIdNTuple(cfg) => check_tuples(
                self.name(),
                cfg.digest_algorithm,
                cfg.tuple_size,
                cfg.number_of_tuples,
                false,
            ),
            StorageLayout::HashedNTuple(cfg) => check_tuples(
                self.name(),
                cfg.digest_algorithm,
                cfg.tuple_size,
                cfg.number_of_tuples,
                cfg.short_object_root,
            ),
        }
    }

    /// Compute the object root path for an object id.
    ///
    /// # Arguments
    /// * `object_id` - OCFL object identifier
    ///
    /// # Returns
    /// Slash-separated path relative to the storage root.
    pub fn object_path(&self, object_id: &str) -> String {
        match self {
            StorageLayout::FlatDirect => object_id.to_string(),
            StorageLayout::HashAndIdNTuple(cfg) => {
                let digest: String = cfg.digest_algorithm.hex_digest(object_id.as_bytes());
                let mut parts: Vec<String> = tuples(&digest, cfg.tuple_size, cfg.number_of_tuples);
                let mut encoded: String = percent_encode_id(object_id);
                if encoded.len() > MAX_ENCODED_ID_LEN {
                    encoded.truncate(MAX_ENCODED_ID_LEN);
                    encoded.push('-');
                    encoded.push_str(&digest);
                }
                parts.push(encoded);
                parts.join("/")
            }
            StorageLayout::HashedNTuple(cfg) => {
                let digest: String = cfg.digest_algorithm.hex_digest(object_id.as_bytes());
                let mut parts: Vec<String> = tuples(&digest, cfg.tuple_size, cfg.number_of_tuples);
                if cfg.short_object_root {
                    parts.push(digest[cfg.tuple_size * cfg.number_of_tuples..].to_string());
                } else {
                    parts.push(digest);
                }
                parts.join("/")
            }
        }
    }
}

fn parse_config<T: for<'de> Deserialize<'de>>(extension: &str, data: &[u8]) -> Result<T, ModelError> {
    serde_json::from_slice(data).map_err(|e| ModelError::InvalidLayoutConfig {
        extension: extension.to_string(),
        reason: e.to_string(),
    })
}

fn check_name(extension: &str, declared: Option<&str>) -> Result<(), ModelError> {
    match declared {
        Some(name) if name != extension => Err(ModelError::InvalidLayoutConfig {
            extension: extension.to_string(),
            reason: format!("config names extension {:?}", name),
        }),
        _ => Ok(()),
    }
}

fn check_tuples(
    extension: &str,
    algorithm: DigestAlgorithm,
    tuple_size: usize,
    number_of_tuples: usize,
    short_object_root: bool,
) -> Result<(), ModelError> {
    let invalid = |reason: String| ModelError::InvalidLayoutConfig {
        extension: extension.to_string(),
        reason,
    };

    if (tuple_size == 0) != (number_of_tuples == 0) {
        return Err(invalid(
            "tupleSize and numberOfTuples must both be zero or both be non-zero".into(),
        ));
    }
    let used: usize = tuple_size * number_of_tuples;
    if used > algorithm.hex_len() {
        return Err(invalid(format!(
            "{} tuples of size {} exceed the {} digest length",
            number_of_tuples, tuple_size, algorithm
        )));
    }
    if short_object_root && used >= algorithm.hex_len() {
        return Err(invalid("shortObjectRoot leaves no digest remainder".into()));
    }
    Ok(())
}

fn tuples(digest: &str, tuple_size: usize, number_of_tuples: usize) -> Vec<String> {
    (0..number_of_tuples)
        .map(|i| digest[i * tuple_size..(i + 1) * tuple_size].to_string())
        .collect()
}

/// Percent-encode every byte outside `[A-Za-z0-9_-]` as lowercase hex.
fn percent_encode_id(object_id: &str) -> String {
    let mut out = String::with_capacity(object_id.len());
    for byte in object_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push_str(&format!("{:02x}", byte));
        }
    }
    out
}
