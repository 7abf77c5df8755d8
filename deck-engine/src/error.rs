//! The engine-level error taxonomy.

use thiserror::Error;

use crate::approval::ApprovalError;
use crate::lock::LockError;
use crate::placement::PlacementError;
use deck_core::{CoreError, StoreError};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by engine operations.
///
/// Every variant maps to a stable classification string via
/// [`EngineError::kind`], which the automation layer serializes alongside
/// the human-readable message.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A placement or dimension input was malformed or unresolvable.
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// A slide index was stale or out of bounds.
    #[error("Slide index {requested} out of range ({available} slides)")]
    SlideNotFound {
        /// The index the caller supplied.
        requested: usize,
        /// The number of slides currently in the document.
        available: usize,
    },

    /// A shape index was stale or out of bounds.
    #[error("Shape index {requested} out of range ({available} shapes)")]
    ShapeNotFound {
        /// The index the caller supplied.
        requested: usize,
        /// The number of shapes currently on the slide.
        available: usize,
    },

    /// Exclusive access to the document could not be acquired.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// The approval token was invalid, expired, or mis-scoped.
    #[error(transparent)]
    Approval(#[from] ApprovalError),

    /// The operation does not apply to the targeted element.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A validation call received malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The document store collaborator failed unexpectedly.
    #[error("Document store error: {0}")]
    Document(#[from] StoreError),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Stable classification string for structured responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Placement(_) => "invalid_placement",
            Self::SlideNotFound { .. } | Self::ShapeNotFound { .. } => "element_not_found",
            Self::Lock(_) => "file_lock",
            Self::Approval(_) => "approval_token",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::Validation(_) => "validation",
            Self::Document(_) | Self::Internal(_) => "internal",
        }
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SlideNotFound {
                requested,
                available,
            } => Self::SlideNotFound {
                requested,
                available,
            },
            CoreError::ShapeNotFound {
                requested,
                available,
            } => Self::ShapeNotFound {
                requested,
                available,
            },
            CoreError::InvalidOperation(message) => Self::InvalidOperation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = EngineError::SlideNotFound {
            requested: 9,
            available: 2,
        };
        assert_eq!(err.kind(), "element_not_found");

        let err = EngineError::from(PlacementError::BothAuto);
        assert_eq!(err.kind(), "invalid_placement");

        let err = EngineError::Internal("collaborator exploded".to_string());
        assert_eq!(err.kind(), "internal");
    }

    #[test]
    fn test_core_error_mapping_preserves_bounds() {
        let err = EngineError::from(CoreError::ShapeNotFound {
            requested: 4,
            available: 1,
        });
        assert!(matches!(
            err,
            EngineError::ShapeNotFound {
                requested: 4,
                available: 1
            }
        ));
    }
}
