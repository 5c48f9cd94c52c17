use crate::error::{ErrorKind, Result};
use ctrlrepo_models::{ControllerLayout, IndexEntry, RepoVersion, VersionCode};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Everything that was found in a controller package.
///
/// Optional files that were absent (or failed to decode) are `None`; the paths
/// of files that were present but undecodable are listed in `skipped`.
///
/// A package decoded from an archive owns the scratch directory its files were
/// extracted into, and `icon`/`screenshots` point inside it. The directory is
/// removed by [`cleanup`](Self::cleanup), or when the package is dropped.
#[derive(Debug)]
pub struct ParsedPackage {
    pub controller_id: String,
    /// From `version.json`'s `latest.versionCode`, falling back to the
    /// layout's own `versionCode`. Zero if neither was available.
    pub version_code: VersionCode,
    pub layout: Option<ControllerLayout>,
    pub version_info: Option<RepoVersion>,
    pub index_entry: Option<IndexEntry>,
    pub icon: Option<PathBuf>,
    /// Sorted by file name.
    pub screenshots: Vec<PathBuf>,
    /// BLAKE3 digest of the archive the package was decoded from.
    pub digest: Option<String>,
    /// Package-relative paths of optional files that couldn't be decoded.
    pub skipped: Vec<PathBuf>,
    /// Whether the controller is already present in the repository index.
    pub is_update: bool,
    /// The repository's index entry for this controller at the time
    /// [`mark_update`](Self::mark_update) was called.
    pub current_index: Option<IndexEntry>,
    scratch: Option<TempDir>,
}

impl ParsedPackage {
    pub(crate) fn extracted(controller_id: String, scratch: TempDir, digest: String) -> Self {
        Self {
            controller_id,
            version_code: 0,
            layout: None,
            version_info: None,
            index_entry: None,
            icon: None,
            screenshots: vec![],
            digest: Some(digest),
            skipped: vec![],
            is_update: false,
            current_index: None,
            scratch: Some(scratch),
        }
    }

    /// Build a package out of files that already live in a repository, so that
    /// an existing controller can be edited and re-applied.
    ///
    /// There's no scratch directory: `icon` and `screenshots` are the
    /// repository's own files. The package is marked as an update.
    pub fn from_repository(
        controller_id: impl Into<String>,
        version_info: Option<RepoVersion>,
        layout: Option<ControllerLayout>,
        index_entry: Option<IndexEntry>,
        icon: Option<PathBuf>,
        screenshots: Vec<PathBuf>,
    ) -> Self {
        let version_code = version_info.as_ref().map_or(0, |v| v.latest.version_code);
        Self {
            controller_id: controller_id.into(),
            version_code,
            layout,
            version_info,
            current_index: index_entry.clone(),
            index_entry,
            icon,
            screenshots,
            digest: None,
            skipped: vec![],
            is_update: true,
            scratch: None,
        }
    }

    /// Where the archive was extracted to, if this package came from one.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// The version code to file the layout under: the package's own, or the
    /// layout's if the package didn't name one.
    pub fn resolved_version_code(&self) -> VersionCode {
        match (self.version_code, &self.layout) {
            (0, Some(layout)) => layout.version_code,
            (code, _) => code,
        }
    }

    /// Compare against a repository index and record whether this package
    /// updates a controller that's already there.
    pub fn mark_update(&mut self, index: &[IndexEntry]) {
        self.current_index = index.iter().find(|entry| entry.id == self.controller_id).cloned();
        self.is_update = self.current_index.is_some();
    }

    /// Remove the scratch directory. Packages without one are a no-op.
    pub fn cleanup(mut self) -> Result<()> {
        match self.scratch.take() {
            Some(scratch) => {
                let path = scratch.path().to_path_buf();
                scratch.close().or_raise(|| ErrorKind::Scratch)?;
                tracing::debug!(controller = %self.controller_id, path = %path.display(), "removed scratch directory");
                Ok(())
            },
            None => Ok(()),
        }
    }
}
