//! Error types for scene operations.

use thiserror::Error;

use crate::backend::BackendTag;

/// Error type for mesh, submesh and material operations.
///
/// Absence (an unknown submesh name, an unresolved material name) is not an
/// error; those lookups return `None` or are silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("Cannot assign material '{material}' created by the {found} backend to a {expected} object")]
    BackendMismatch {
        material: String,
        expected: BackendTag,
        found: BackendTag,
    },

    #[error("Material '{0}' has already been destroyed")]
    MaterialDestroyed(String),

    #[error("Object '{0}' has already been destroyed")]
    ObjectDestroyed(String),

    #[error("Name already in use: {0}")]
    DuplicateName(String),

    #[error("Backend operation failed: {0}")]
    Backend(String),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
