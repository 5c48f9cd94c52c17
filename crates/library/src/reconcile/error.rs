//! Error types for the [`reconcile`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};

/// A reconciliation error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a reconciliation failure.
///
/// Whatever step failed, the steps before it have already been written to
/// disk and are not rolled back.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Copying or writing one of the controller's files failed.
    #[display("failed to write controller files")]
    Storage,
    /// The controller id was rejected, or the index couldn't be persisted.
    #[display("repository update failed")]
    Repository,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Every step is safe to repeat.
        true
    }
}
