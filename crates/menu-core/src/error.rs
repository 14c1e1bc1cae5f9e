//! Domain errors

use thiserror::Error;

use crate::domain::MenuId;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Menu not found: {0}")]
    MenuNotFound(MenuId),

    #[error("Sub menu cannot have children: {name}")]
    MenuDepthExceeded { name: String },

    #[error("Submitted menu id {0} does not match a persisted sibling")]
    UnknownMenuId(MenuId),

    #[error("Menu id {0} submitted more than once")]
    DuplicateMenuId(MenuId),

    #[error("Persisted menu tree is corrupt: {0}")]
    CorruptMenuTree(String),

    #[error("Batch insert returned {actual} ids for {expected} rows")]
    IdInferenceViolation { expected: usize, actual: usize },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Coarse error classes used when reporting a failed synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The submission does not describe a valid two-level tree over the persisted ids
    Structural,
    Validation,
    NotFound,
    /// Storage rejected a write or could not be reached
    Persistence,
    /// Storage did not hand back one id per inserted row
    IdInference,
}

impl DomainError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DomainError::MenuDepthExceeded { .. }
            | DomainError::UnknownMenuId(_)
            | DomainError::DuplicateMenuId(_)
            | DomainError::CorruptMenuTree(_) => ErrorCategory::Structural,
            DomainError::ValidationError(_) => ErrorCategory::Validation,
            DomainError::MenuNotFound(_) => ErrorCategory::NotFound,
            DomainError::ConstraintViolation(_) | DomainError::DatabaseError(_) => {
                ErrorCategory::Persistence
            }
            DomainError::IdInferenceViolation { .. } => ErrorCategory::IdInference,
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::ValidationError(errors.to_string())
    }
}
