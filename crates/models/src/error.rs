//! Model Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A model (de)serialization error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document is not valid JSON, or does not have the expected shape.
    /// Don't retry with the same input.
    #[display("invalid {_0} document")]
    InvalidDocument(#[error(not(source))] &'static str),
    /// The value could not be encoded as JSON.
    #[display("failed to encode {_0} document")]
    Encode(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Documents are either well-formed or they aren't.
        false
    }
}
