//! An editing session: one repository, at most one package.
//!
//! A [`Session`] is what a front end holds on to while the operator picks a
//! repository, picks (or loads) a package, tweaks its metadata and applies it.
//! Operations called out of order fail with
//! [`NoRepository`](ErrorKind::NoRepository) or
//! [`NoPackage`](ErrorKind::NoPackage).

use crate::error::{ErrorKind, Result};
use crate::reconcile::{Applied, apply_update};
use ctrlrepo_models::{Category, IndexEntry};
use ctrlrepo_package::{ParsedPackage, decode, decode_in};
use ctrlrepo_repository::Repository;
use exn::{OptionExt, ResultExt};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Operator edits applied to a package right before it's reconciled.
///
/// Empty strings and `None` mean "keep what the package says". Edits to the
/// index entry are dropped if the package has no index entry, and edits to
/// the version record if it has no version record.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub categories: Option<BTreeSet<i64>>,
    pub author: String,
    pub description: String,
    pub name: String,
    pub introduction: String,
}
impl Overrides {
    pub fn apply_to(&self, package: &mut ParsedPackage) {
        if let Some(entry) = &mut package.index_entry {
            if let Some(categories) = &self.categories {
                entry.categories = categories.clone();
            }
            replace_unless_empty(&mut entry.name, &self.name);
            replace_unless_empty(&mut entry.introduction, &self.introduction);
        }
        if let Some(version) = &mut package.version_info {
            replace_unless_empty(&mut version.author, &self.author);
            replace_unless_empty(&mut version.description, &self.description);
        }
    }
}

fn replace_unless_empty(field: &mut String, value: &str) {
    if !value.is_empty() {
        value.clone_into(field);
    }
}

#[derive(Debug, Default)]
pub struct Session {
    repository: Option<Repository>,
    package: Option<ParsedPackage>,
    scratch_parent: Option<PathBuf>,
}
impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract packages under `dir` instead of the system's temporary
    /// directory.
    pub fn with_scratch_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(dir.into());
        self
    }

    /// Open the repository at `root`, replacing any repository opened before.
    /// A package that's already selected is re-checked against the new index.
    pub fn open_repository(&mut self, root: impl AsRef<Path>) -> Result<&Repository> {
        let repository = Repository::open(root).or_raise(|| ErrorKind::Repository)?;
        if let Some(package) = &mut self.package {
            package.mark_update(repository.index());
        }
        Ok(&*self.repository.insert(repository))
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.repository.as_ref()
    }

    pub fn package(&self) -> Option<&ParsedPackage> {
        self.package.as_ref()
    }

    /// Decode the package at `archive` and hold on to it, releasing the
    /// previously held package.
    ///
    /// Whether the package is an update is only known if a repository is
    /// already open.
    pub fn select_package(&mut self, archive: impl AsRef<Path>) -> Result<&ParsedPackage> {
        let mut package = match &self.scratch_parent {
            Some(parent) => decode_in(archive, parent),
            None => decode(archive),
        }
        .or_raise(|| ErrorKind::Package)?;
        if let Some(repository) = &self.repository {
            package.mark_update(repository.index());
        }
        Ok(self.hold(package))
    }

    /// Turn a controller that's already in the repository into a package, so
    /// that its metadata can be edited and re-applied.
    pub fn load_controller(&mut self, id: &str) -> Result<&ParsedPackage> {
        let repository = self.repository.as_ref().ok_or_raise(|| ErrorKind::NoRepository)?;
        let details = repository.load_controller_details(id).or_raise(|| ErrorKind::Repository)?;
        let package = ParsedPackage::from_repository(
            details.id,
            Some(details.version),
            details.layout,
            details.entry,
            details.icon,
            details.screenshots,
        );
        Ok(self.hold(package))
    }

    /// Apply `overrides` to the held package, then merge it into the
    /// repository.
    ///
    /// The package stays held afterwards (now marked as an update), so the
    /// same package can be tweaked and applied again.
    pub fn apply_update(&mut self, overrides: &Overrides) -> Result<Applied> {
        let repository = self.repository.as_mut().ok_or_raise(|| ErrorKind::NoRepository)?;
        let package = self.package.as_mut().ok_or_raise(|| ErrorKind::NoPackage)?;
        overrides.apply_to(package);
        let applied = apply_update(repository, package)?;
        package.mark_update(repository.index());
        Ok(applied)
    }

    pub fn categories(&self) -> Result<&[Category]> {
        Ok(self.repository.as_ref().ok_or_raise(|| ErrorKind::NoRepository)?.categories())
    }

    pub fn index(&self) -> Result<&[IndexEntry]> {
        Ok(self.repository.as_ref().ok_or_raise(|| ErrorKind::NoRepository)?.index())
    }

    /// Release the held package's scratch directory. Dropping the session
    /// does the same, but swallows any error.
    pub fn close(mut self) -> Result<()> {
        match self.package.take() {
            Some(package) => package.cleanup().or_raise(|| ErrorKind::Package),
            None => Ok(()),
        }
    }

    fn hold(&mut self, package: ParsedPackage) -> &ParsedPackage {
        if let Some(previous) = self.package.take()
            && let Err(e) = previous.cleanup()
        {
            tracing::warn!(error = %e, "failed to release previous package");
        }
        self.package.insert(package)
    }
}
