//! Filesystem primitives shared by the package decoder and the repository.
//!
//! Every path goes through [`validate_path`] before it touches the disk, so
//! neither a hostile archive entry nor a hostile controller id can reach
//! outside the root a [`LocalBackend`] was opened on.

pub mod error;
mod local;
mod path;

pub use crate::local::{LocalBackend, Transfer, same_file};
pub use crate::path::{validate as validate_path, validate_segment};
