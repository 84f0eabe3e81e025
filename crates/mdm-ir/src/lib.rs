#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # mdm-ir
//!
//! Shared records for the master-data attribute engine.
//!
//! This crate provides the JSON-compatible [`Value`] union that attribute maps
//! are made of, the hierarchy entities (item types, categories, families,
//! items) that carry those maps, the associations linking those entities,
//! and a small helper that nests a flat list of hierarchy nodes into a tree.

/// Links between hierarchy entities.
pub mod association;
/// Entity records and identifiers.
pub mod entity;
/// Nesting of flat hierarchy lists into trees.
pub mod tree;
/// Tagged JSON value union.
pub mod value;

/// Association records.
pub use association::{Association, BELONGS_TO, DEFAULT_ASSOCIATION_KIND, EntityRef};
/// Entity records and the shared hierarchy-node contract.
pub use entity::{
    AttributeMap, Category, EntityId, EntityKind, Family, HierarchyNode, Item, ItemType,
};
/// Tree nesting entry points.
pub use tree::{TreeNode, build_tree};
/// Attribute value union.
pub use value::Value;

use thiserror::Error;

/// Errors that can occur when working with the shared records
#[derive(Error, Debug)]
pub enum Error {
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
}

impl Error {
    /// Build a type-mismatch error from the expected and actual type names.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, Error>;
