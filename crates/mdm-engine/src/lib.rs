#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # mdm-engine
//!
//! Effective-schema resolution, hierarchy maintenance, and the write services
//! for item types, categories, families, items, associations, definitions,
//! and groups.
//!
//! Every service call is a short sequence of repository reads, pure
//! validation, and one or more repository writes. The engine holds no state
//! of its own beyond its [`EngineConfig`].

mod hierarchy;
pub mod import;
pub mod policies;
pub mod resolver;
pub mod service;

pub use import::{ImportSummary, audit_catalog, import_catalog};
pub use policies::{CategoryPolicy, EngineConfig};
pub use resolver::{ResolvedSchema, resolve};
pub use service::{CatalogService, CategoryUpdate, FamilyUpdate, ItemTypeUpdate, ItemUpdate, NewItem};

use mdm_ir::{EntityId, EntityKind};
use thiserror::Error;

/// Errors that can occur in engine operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: EntityId },

    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: EntityKind, id: EntityId },

    #[error("{0}")]
    Containment(String),

    #[error("No category given for item type {item_type} and no default category applies")]
    MissingCategory { item_type: EntityId },

    #[error("Attributes cannot be set when creating a {entity}; attach attribute groups instead")]
    AttributesOnCreate { entity: EntityKind },

    #[error("Parent {entity} not found: {id}")]
    ParentNotFound { entity: EntityKind, id: EntityId },

    #[error("Invalid association: {0}")]
    InvalidAssociation(String),

    #[error("{entity} {id} cannot be moved under its own subtree")]
    CycleDetected { entity: EntityKind, id: EntityId },

    #[error("{entity} {id} is still in use: {reason}")]
    InUse {
        entity: EntityKind,
        id: EntityId,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] mdm_validation::Error),

    #[error(transparent)]
    Schema(#[from] mdm_schema::Error),

    #[error(transparent)]
    Store(#[from] mdm_store::Error),
}

/// Failure classes callers map to their own responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StructuralConfig,
    ValueValidation,
    UnknownAttribute,
    MissingRequired,
    ReadonlyViolation,
    NotFound,
    Containment,
    BadRequest,
    Conflict,
    Storage,
}

impl Error {
    pub fn not_found(entity: EntityKind, id: impl Into<EntityId>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Classify the error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } | Error::ParentNotFound { .. } => ErrorKind::NotFound,
            Error::Containment(_) => ErrorKind::Containment,
            Error::MissingCategory { .. }
            | Error::AttributesOnCreate { .. }
            | Error::InvalidAssociation(_)
            | Error::CycleDetected { .. } => ErrorKind::BadRequest,
            Error::AlreadyExists { .. } | Error::InUse { .. } => ErrorKind::Conflict,
            Error::Validation(err) => match err {
                mdm_validation::Error::Config(schema) => schema_kind(schema),
                mdm_validation::Error::InvalidDefault { .. } | mdm_validation::Error::Value { .. } => {
                    ErrorKind::ValueValidation
                }
                mdm_validation::Error::UnknownAttribute { .. } => ErrorKind::UnknownAttribute,
                mdm_validation::Error::MissingRequired { .. } => ErrorKind::MissingRequired,
                mdm_validation::Error::Readonly { .. } => ErrorKind::ReadonlyViolation,
            },
            Error::Schema(err) => schema_kind(err),
            Error::Store(err) => match err {
                mdm_store::Error::NotFound { .. } => ErrorKind::NotFound,
                mdm_store::Error::Duplicate { .. }
                | mdm_store::Error::DuplicateAssociation { .. }
                | mdm_store::Error::InUse { .. } => ErrorKind::Conflict,
                mdm_store::Error::Storage { .. } => ErrorKind::Storage,
            },
        }
    }
}

fn schema_kind(err: &mdm_schema::Error) -> ErrorKind {
    match err {
        mdm_schema::Error::Config { .. } | mdm_schema::Error::UnknownKind(_) => {
            ErrorKind::StructuralConfig
        }
        mdm_schema::Error::Conflict { .. } => ErrorKind::Conflict,
        mdm_schema::Error::NotFound(_) => ErrorKind::NotFound,
        mdm_schema::Error::InvalidFormat(_) | mdm_schema::Error::Io(_) => ErrorKind::BadRequest,
    }
}

pub type Result<T> = std::result::Result<T, Error>;
