//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// ### Operational Errors
/// - [`ErrorKind::NoRepository`]
/// - [`ErrorKind::NoPackage`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Repository`]
/// - [`ErrorKind::Package`]
/// - [`ErrorKind::Reconcile`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An operation needed an open repository, but none was opened.
    #[display("no repository selected")]
    NoRepository,
    /// An operation needed a package, but none was selected or loaded.
    #[display("no package selected")]
    NoPackage,
    /// Opening the repository or reading from it failed.
    #[display("repository error")]
    Repository,
    /// The package archive couldn't be decoded.
    #[display("package error")]
    Package,
    /// Applying a package to the repository failed part way.
    #[display("failed to apply package")]
    Reconcile,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Reconcile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Reconcile.is_retryable());
        assert!(!ErrorKind::NoRepository.is_retryable());
        assert!(!ErrorKind::Package.is_retryable());
    }
}
