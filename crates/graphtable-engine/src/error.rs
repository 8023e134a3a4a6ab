//! Error types for key encoding, catalog construction and engine operations.
//!
//! Layering follows the data flow: [`KeyError`] and [`CatalogError`] are
//! raised while validating inputs, [`graphtable_store::StoreError`] comes
//! back from the adapter, and [`EngineError`] wraps all of them for callers.

use graphtable_store::StoreError;

use crate::catalog::Category;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid entity id {id:?}: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Invalid kind tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: String },

    #[error("Malformed key {key:?}: {reason}")]
    Malformed { key: String, reason: String },
}

/// Catalog construction failures. Always fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog has no kinds")]
    Empty,

    #[error("Kind tag {0} is registered more than once")]
    DuplicateTag(String),

    #[error(transparent)]
    InvalidTag(#[from] KeyError),

    #[error("Relationship {relationship} references {participant}, which is not a registered entity kind")]
    UnknownParticipant {
        relationship: String,
        participant: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] CatalogError),

    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    #[error("Unknown kind tag: {0}")]
    UnknownKind(String),

    /// The operation does not apply to this kind's structural category.
    #[error("Kind {tag} is {actual}, expected {expected}")]
    InvalidRelationshipKind {
        tag: String,
        expected: Category,
        actual: Category,
    },

    /// A concurrent writer changed the owner first. Never retried here.
    #[error("Owner of {many_id} under {kind} changed concurrently")]
    OwnerReassignConflict { kind: String, many_id: String },

    #[error("Corrupt record ({primary_key}, {sort_key}): {reason}")]
    CorruptRecord {
        primary_key: String,
        sort_key: String,
        reason: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether a caller may reasonably retry after fresh reads.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::OwnerReassignConflict { .. } => true,
            EngineError::Store(err) => err.is_unavailable(),
            _ => false,
        }
    }
}
