//! The on-disk controller repository.
//!
//! ```text
//! <root>/index.json                           Vec<IndexEntry>, in display order
//! <root>/category.json                        Vec<Category>, read-only
//! <root>/repo_json/<id>/version.json          RepoVersion
//! <root>/repo_json/<id>/versions/<code>.json  ControllerLayout
//! <root>/repo_json/<id>/icon.png
//! <root>/repo_json/<id>/screenshots/*.png|*.jpg
//! ```
//!
//! [`Repository`] owns the index and hands out [`ControllerPaths`]; writing
//! packages into it is the reconciler's job (see `ctrlrepo-library`).

pub mod error;
mod paths;
mod repo;

pub use crate::paths::{CATEGORY_FILE, CONTROLLERS_DIR, ControllerPaths, INDEX_FILE};
pub use crate::repo::{ControllerDetails, Repository, Upsert};
