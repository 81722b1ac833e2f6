//! Error types for model construction.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the validating model factory.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The triangle sequence was empty.
    #[error("no triangles found")]
    NoTriangles,

    /// A triangle failed geometric validation.
    #[error("invalid triangle at index {index}: {details}")]
    InvalidTriangle {
        /// 0-based index into the parsed triangle sequence.
        index: usize,
        /// What was wrong (non-finite component, degenerate geometry).
        details: String,
    },
}
