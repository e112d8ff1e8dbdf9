//! Error types for sharmonics.

use thiserror::Error;

/// Result alias for sharmonics operations.
pub type ShResult<T> = std::result::Result<T, ShError>;

/// Errors that can occur when evaluating, projecting or rotating SH data.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ShError {
    /// A caller-supplied argument is outside its valid domain.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },
    /// An operation received no data to work on.
    #[error("empty input: {context}")]
    EmptyInput { context: &'static str },
    /// Two lengths that must agree do not.
    #[error("dimension mismatch for {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    /// A degenerate value or an undefined recurrence branch was reached.
    #[error("numeric degeneracy: {reason}")]
    NumericDegeneracy { reason: &'static str },
    /// The operation was cancelled through its cancel token.
    #[error("cancelled after {completed} samples")]
    Cancelled { completed: usize },
}
