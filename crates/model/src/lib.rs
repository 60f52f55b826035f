//! OCFL object model for the read-only object mount.
//!
//! This crate provides the pure, I/O-free parts of reading an OCFL object:
//! - `inventory`: decoding and validating `inventory.json`
//! - `version`: version tokens (`""`, `v3`, `3`) and inventory version names
//! - `object`: the resolved, immutable [`ObjectVersion`]
//! - `layout`: storage root layout extensions mapping object ids to paths
//!
//! # Example
//!
//! ```ignore
//! use rusty_ocfl_model::{Inventory, VersionSelector};
//!
//! let inventory = Inventory::decode(&json)?;
//! let version = inventory.resolve(&VersionSelector::parse("v1")?)?;
//! for (logical_path, digest) in version.state() {
//!     println!("{logical_path} -> {digest}");
//! }
//! ```

pub mod digest;
pub mod error;
pub mod inventory;
pub mod layout;
pub mod object;
pub mod version;

pub use digest::DigestAlgorithm;
pub use error::ModelError;
pub use inventory::{Inventory, InventoryVersion, User, INVENTORY_FILE};
pub use layout::{
    HashAndIdNTupleConfig, HashedNTupleConfig, LayoutDeclaration, StorageLayout, LAYOUT_FILE,
};
pub use object::ObjectVersion;
pub use version::{VersionNum, VersionSelector};
