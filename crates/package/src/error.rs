//! Package Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A package decoding error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for package operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a package couldn't be decoded.
///
/// Only problems with the archive itself (or with the scratch area it's
/// extracted into) are errors. Optional files inside a valid archive that
/// fail to decode are skipped, see
/// [`ParsedPackage::skipped`](crate::ParsedPackage::skipped).
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The file couldn't be opened, isn't a zip archive, or an entry couldn't
    /// be read.
    #[display("could not read package archive")]
    Archive,
    /// Entries disagree on which controller the package contains.
    #[display("package contains more than one controller: {first} and {second}")]
    MalformedPackage { first: String, second: String },
    /// No entry names a controller directory.
    #[display("could not find a controller id in package")]
    MissingControllerId,
    /// An entry's path is absolute or would escape the extraction directory.
    #[display("unsafe entry path in package: {_0}")]
    UnsafeEntry(#[error(not(source))] String),
    /// Creating, writing to, or removing the scratch directory failed.
    #[display("scratch directory operation failed")]
    Scratch,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The archive won't change between attempts, but the scratch
        // directory lives on a filesystem that might.
        matches!(self, Self::Scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ErrorKind::MalformedPackage { first: "ctrl2".into(), second: "ctrl3".into() };
        assert_eq!(err.to_string(), "package contains more than one controller: ctrl2 and ctrl3");
        let err = ErrorKind::UnsafeEntry("ctrl/../../x".into());
        assert_eq!(err.to_string(), "unsafe entry path in package: ctrl/../../x");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Scratch.is_retryable());
        assert!(!ErrorKind::MissingControllerId.is_retryable());
    }
}
