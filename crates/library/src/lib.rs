//! Applying controller packages to a repository.
//!
//! [`reconcile::apply_update`] is the engine: it takes a decoded
//! [`ParsedPackage`](ctrlrepo_package::ParsedPackage) and an open
//! [`Repository`](ctrlrepo_repository::Repository) and merges one into the
//! other. [`Session`] wraps the engine in the select/load/apply workflow a
//! front end drives.

pub mod error;
pub mod reconcile;
mod session;

pub use crate::reconcile::{Applied, apply_update, merge_history};
pub use crate::session::{Overrides, Session};
