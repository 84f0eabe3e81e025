//! # mdm-store
//!
//! Repository capability for catalog entities.
//!
//! The engine only talks to storage through the [`Repository`] trait. The
//! in-memory [`MemoryStore`] (feature `memory`, on by default) backs tests and
//! the command-line front end.

#[cfg(feature = "memory")]
pub mod memory;
pub mod repository;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use repository::{AssociationFilter, Repository};

use mdm_ir::{EntityId, EntityKind, EntityRef};
use thiserror::Error;

/// Errors that can occur when reading or writing catalog entities
#[derive(Error, Debug)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: EntityId },

    #[error("{entity} code already in use: {code}")]
    Duplicate { entity: EntityKind, code: String },

    #[error("Association {kind} from {from} to {to} already exists")]
    DuplicateAssociation {
        from: EntityRef,
        to: EntityRef,
        kind: String,
    },

    #[error("{entity} {id} is referenced by {references} other entities")]
    InUse {
        entity: EntityKind,
        id: EntityId,
        references: usize,
    },

    #[error("Storage error: {details}")]
    Storage { details: String },
}

impl Error {
    pub fn not_found(entity: EntityKind, id: impl Into<EntityId>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn duplicate(entity: EntityKind, code: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            code: code.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
