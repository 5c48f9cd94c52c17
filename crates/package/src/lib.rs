//! Controller package decoding.
//!
//! A package is a zip archive holding exactly one controller directory:
//!
//! ```text
//! <id>/version.json          optional, RepoVersion
//! <id>/index.json            optional, a single IndexEntry
//! <id>/versions/<code>.json  optional, ControllerLayout
//! <id>/icon.png              optional
//! <id>/screenshots/*.png     optional (or *.jpg)
//! ```
//!
//! [`decode`] extracts it into a private scratch directory and returns a
//! [`ParsedPackage`] describing what was found. Nothing is written to any
//! repository here; see `ctrlrepo-library` for that.

mod decode;
pub mod error;
mod package;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::decode::{decode, decode_in};
pub use crate::package::ParsedPackage;
