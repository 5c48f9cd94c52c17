//! Configuration Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A configuration file named explicitly does not exist.
    #[display("configuration file not found: {}", _0.display())]
    MissingFile(#[error(not(source))] PathBuf),
    /// The merged configuration could not be deserialized.
    #[display("invalid configuration")]
    Load,
    #[display("scratch directory is not a directory: {}", _0.display())]
    InvalidScratchDir(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
