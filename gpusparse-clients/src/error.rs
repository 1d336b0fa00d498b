use gpusparse_core::{SparseError, Status};
use thiserror::Error;

/// Failure reported by the validation harness.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("sparse operation failed: {0}")]
    Sparse(#[from] SparseError),

    #[error("expected status {expected}, got {actual}")]
    UnexpectedStatus { expected: Status, actual: Status },

    #[error("length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("mismatch at index {index}: expected {expected}, got {actual}")]
    Mismatch {
        index: usize,
        expected: f32,
        actual: f32,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
