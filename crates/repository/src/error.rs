//! Repository Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A repository error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The directory is missing `index.json` or `category.json`, or one of
    /// them couldn't be decoded. Pick another directory.
    #[display("not a controller repository: {}", _0.display())]
    RepositoryInvalid(#[error(not(source))] PathBuf),
    /// The controller has no `version.json`.
    #[display("controller not found: {_0}")]
    ControllerNotFound(#[error(not(source))] String),
    /// The id can't be used as a directory name.
    #[display("invalid controller id: {_0:?}")]
    InvalidControllerId(#[error(not(source))] String),
    /// A storage operation (read, write, list) failed.
    #[display("repository storage error")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::ControllerNotFound("ctrl1".into()).to_string(), "controller not found: ctrl1");
        assert_eq!(ErrorKind::InvalidControllerId("a/b".into()).to_string(), "invalid controller id: \"a/b\"");
        let err = ErrorKind::RepositoryInvalid("/srv/repo".into());
        assert_eq!(err.to_string(), "not a controller repository: /srv/repo");
    }
}
