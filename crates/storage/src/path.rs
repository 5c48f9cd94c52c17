//! Path validation and security utilities.
//!
//! Every path handed to a [`LocalBackend`](crate::LocalBackend) is relative to
//! its root, and that includes paths read out of package archives, which are
//! attacker-controlled as far as we're concerned. Nothing may escape the root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path for security and correctness.
/// Ensures that paths don't escape the storage root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ctrlrepo_storage::validate_path;
/// assert!(validate_path("repo_json/ctrl1/version.json").is_ok());
/// assert!(validate_path("ctrl1/versions/../icon.png").is_ok()); // (never leaves the root)
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("ctrl1/../../escape").is_err());
/// assert_eq!(
///     validate_path("ctrl1//./screenshots/").unwrap(),
///     Path::new("ctrl1/screenshots")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls; reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Validates a single path segment, such as a controller id that's about to
/// become a directory name.
///
/// Unlike [`validate`], nothing is normalized: the segment must already be
/// exactly one plain component.
///
/// ```
/// use ctrlrepo_storage::validate_segment;
/// assert!(validate_segment("com.example.pad").is_ok());
/// assert!(validate_segment("a/b").is_err());
/// assert!(validate_segment("..").is_err());
/// assert!(validate_segment("").is_err());
/// ```
pub fn validate_segment(segment: &str) -> Result<&str> {
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(s)), None)
            if s == segment && !segment.contains(['/', '\\', '\0']) && !segment.trim().is_empty() =>
        {
            Ok(segment)
        },
        _ => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(segment))),
    }
}
