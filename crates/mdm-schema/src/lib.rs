//! # mdm-schema
//!
//! Attribute definition model, per-kind config rules, and group merge logic.
//!
//! An attribute definition pairs a code with one of the closed set of
//! [`AttributeKind`]s; the kind and its structured config travel together as
//! one [`AttributeConfig`] variant, so a definition can never hold a config
//! shaped for a different kind. Definitions are bundled into
//! [`AttributeGroup`]s, and groups contributed by several hierarchy levels are
//! merged into one [`DefinitionSet`] by [`inheritance::merge_groups`].

pub mod config;
pub mod inheritance;
pub mod kind;
pub mod loader;
pub mod model;
pub mod registry;
pub mod temporal;

pub use config::{AttributeConfig, ConfigIssue};
pub use inheritance::{ConflictPolicy, merge_groups};
pub use kind::AttributeKind;
pub use loader::{Catalog, CatalogLoader};
pub use model::{
    AttributeDefinition, AttributeGroup, DefinitionSet, PopulatedGroup, RawAttributeDefinition,
};
pub use registry::CatalogRegistry;

use thiserror::Error;

/// Errors that can occur when working with attribute definitions
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config for attribute '{code}': {field} {reason}")]
    Config {
        code: String,
        field: String,
        reason: String,
    },

    #[error("Unknown attribute kind: {0}")]
    UnknownKind(String),

    #[error("Conflicting definitions for attribute '{code}': {first} in group {first_group}, {second} in group {second_group}")]
    Conflict {
        code: String,
        first: AttributeKind,
        first_group: String,
        second: AttributeKind,
        second_group: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid catalog format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a structural config error for one field of one definition
    pub fn config(
        code: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            code: code.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
