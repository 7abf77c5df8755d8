//! Error types for document graph operations.

use thiserror::Error;

/// Result type for document graph operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while addressing or editing the document graph.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A slide index was outside the current slide collection.
    #[error("Slide index {requested} out of range ({available} slides)")]
    SlideNotFound {
        /// The index the caller supplied.
        requested: usize,
        /// The number of slides currently in the document.
        available: usize,
    },

    /// A shape index was outside a slide's current shape collection.
    #[error("Shape index {requested} out of range ({available} shapes)")]
    ShapeNotFound {
        /// The index the caller supplied.
        requested: usize,
        /// The number of shapes currently on the slide.
        available: usize,
    },

    /// An operation was applied to a shape of the wrong content kind.
    #[error("Invalid operation on shape: {0}")]
    InvalidOperation(String),
}
