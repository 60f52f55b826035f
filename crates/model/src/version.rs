//! Version numbers and user-supplied version tokens.

use std::fmt;

use crate::error::ModelError;

/// A positive OCFL version number (`v1` is 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionNum(u32);

impl VersionNum {
    /// Create a version number, rejecting zero.
    pub fn new(num: u32) -> Option<Self> {
        if num == 0 {
            None
        } else {
            Some(Self(num))
        }
    }

    /// Get the numeric value.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Parse a version directory name as found in an inventory.
    ///
    /// Inventory names may be zero-padded (`v003`), so leading zeros are
    /// accepted here but not in user tokens.
    ///
    /// # Arguments
    /// * `name` - Version name (e.g., "v1", "v003")
    ///
    /// # Returns
    /// The version number, or None if the name is not a valid version name.
    pub fn from_inventory_name(name: &str) -> Option<Self> {
        let digits: &str = name.strip_prefix('v')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u32>().ok().and_then(Self::new)
    }
}

impl fmt::Display for VersionNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Which version of an object to project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    /// The inventory's head (latest) version.
    Head,
    /// An explicit version number.
    Num(VersionNum),
}

impl VersionSelector {
    /// Parse a user-supplied version token.
    ///
    /// An empty token selects head. Otherwise an optional leading `v` is
    /// stripped and the remainder must be a canonical positive decimal
    /// integer: no sign, no leading zeros, no other characters.
    ///
    /// # Arguments
    /// * `token` - Version token (e.g., "", "v2", "2")
    ///
    /// # Returns
    /// The selector, or `InvalidVersionToken`.
    pub fn parse(token: &str) -> Result<Self, ModelError> {
        if token.is_empty() {
            return Ok(VersionSelector::Head);
        }

        let digits: &str = token.strip_prefix('v').unwrap_or(token);
        let canonical: bool = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && !digits.starts_with('0');
        if !canonical {
            return Err(ModelError::InvalidVersionToken(token.to_string()));
        }

        digits
            .parse::<u32>()
            .ok()
            .and_then(VersionNum::new)
            .map(VersionSelector::Num)
            .ok_or_else(|| ModelError::InvalidVersionToken(token.to_string()))
    }

    /// Check whether this selects the head version.
    pub fn is_head(&self) -> bool {
        matches!(self, VersionSelector::Head)
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Head => write!(f, "head"),
            VersionSelector::Num(n) => write!(f, "{}", n),
        }
    }
}
