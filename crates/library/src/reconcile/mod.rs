//! Merging a parsed package into a repository.
//!
//! The primary entry point is [`apply_update`], which copies the package's
//! files into the controller's directory, merges its version record with the
//! one already there (see [`merge_history`]), and upserts its index entry.
//!
//! Each step writes to disk as it goes. If a step fails, the steps before it
//! stay written; the index is only persisted once every controller file has
//! been written.

pub mod error;
mod history;

pub use self::history::merge_history;
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::reconcile::error::{ErrorKind as ReconcileErrorKind, Result as ReconcileResult};
use ctrlrepo_models::RepoVersion;
use ctrlrepo_package::ParsedPackage;
use ctrlrepo_repository::{Repository, Upsert};
use ctrlrepo_storage::Transfer;
use exn::ResultExt;
use std::path::PathBuf;
use tracing::instrument;

/// What [`apply_update`] did, for the caller to report.
#[derive(Debug, Clone)]
pub struct Applied {
    pub controller_id: String,
    /// `None` if the package had no icon.
    pub icon: Option<Transfer>,
    /// Storage paths of the screenshots now on disk. Empty if the package had
    /// none, in which case the existing screenshots were left alone.
    pub screenshots: Vec<PathBuf>,
    /// Storage path the layout was written to, if the package had one.
    pub layout: Option<PathBuf>,
    /// The version record as written to `version.json`.
    pub version: RepoVersion,
    /// `None` if the package had no index entry.
    pub index: Option<Upsert>,
}

/// Merge `package` into the repository.
///
/// Steps, in order:
///
/// 1. Create the controller directory.
/// 2. Copy the icon (unless it already *is* the repository's icon).
/// 3. Replace the screenshot directory with exactly the package's screenshots.
/// 4. Merge the package's version record into the existing one.
/// 5. Write the layout to `versions/<code>.json`.
/// 6. Normalise and write `version.json`, even if the package had no version
///    record.
/// 7. Upsert the package's index entry.
/// 8. Persist the index.
///
/// # Errors
/// Returns [`Exn<LibraryErrorKind::Reconcile>`](LibraryErrorKind::Reconcile)
/// raised from an inner [`Exn<ReconcileErrorKind>`](ReconcileErrorKind).
pub fn apply_update(repository: &mut Repository, package: &ParsedPackage) -> LibraryResult<Applied> {
    apply_update_inner(repository, package).or_raise(|| LibraryErrorKind::Reconcile)
}

#[instrument(skip_all, fields(controller = %package.controller_id))]
fn apply_update_inner(repository: &mut Repository, package: &ParsedPackage) -> ReconcileResult<Applied> {
    let paths = repository.paths(&package.controller_id).or_raise(|| ReconcileErrorKind::Repository)?;
    let backend = repository.backend();

    backend.create_dir_all(paths.controller_dir()).or_raise(|| ReconcileErrorKind::Storage)?;

    let icon = match &package.icon {
        Some(source) => Some(backend.import_file(source, paths.icon_file()).or_raise(|| ReconcileErrorKind::Storage)?),
        None => None,
    };

    let screenshots = match package.screenshots.is_empty() {
        true => vec![],
        false => backend
            .replace_dir(paths.screenshot_dir(), &package.screenshots)
            .or_raise(|| ReconcileErrorKind::Storage)?,
    };

    // An existing record that can't be read is replaced, not merged.
    let existing: Option<RepoVersion> = match backend.read_document(paths.version_file()) {
        Ok(version) => Some(version),
        Err(e) if e.is_not_found() => None,
        Err(e) => {
            tracing::warn!(error = %e, "existing version record is unreadable; replacing it");
            None
        },
    };
    let mut version = match &package.version_info {
        Some(incoming) => merge_history(existing, incoming, package.screenshots.len()),
        None => existing.unwrap_or_default(),
    };

    let layout = match &package.layout {
        Some(layout) => {
            let code = package.resolved_version_code();
            let target = paths.layout_file(code);
            backend.write_document(&target, layout).or_raise(|| ReconcileErrorKind::Storage)?;
            tracing::debug!(code, path = %target.display(), "wrote layout");
            Some(target)
        },
        None => None,
    };

    if !version.latest.is_set()
        && let Some(layout) = &package.layout
    {
        version.latest = layout.revision();
    }
    let on_disk = repository.screenshots_on_disk(&package.controller_id).or_raise(|| ReconcileErrorKind::Storage)?;
    version.screenshot = version.screenshot.max(u32::try_from(on_disk.len()).unwrap_or(u32::MAX));
    backend.write_document(paths.version_file(), &version).or_raise(|| ReconcileErrorKind::Storage)?;

    let index = package.index_entry.clone().map(|entry| repository.upsert(entry));
    repository.persist().or_raise(|| ReconcileErrorKind::Repository)?;

    tracing::info!(
        latest = %version.latest,
        history = version.history.len(),
        screenshots = screenshots.len(),
        index = ?index,
        "applied package"
    );
    Ok(Applied { controller_id: package.controller_id.clone(), icon, screenshots, layout, version, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlrepo_models::{ControllerLayout, Document, IndexEntry, Version};
    use std::fs;

    fn repository() -> (tempfile::TempDir, Repository) {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("index.json"), r#"[{"id": "ctrl0", "name": "Zero"}]"#).unwrap();
        fs::write(temp_dir.path().join("category.json"), "[]").unwrap();
        let repository = Repository::open(temp_dir.path()).unwrap();
        (temp_dir, repository)
    }

    fn package(id: &str) -> ParsedPackage {
        ParsedPackage::from_repository(id, None, None, None, None, vec![])
    }

    fn read_version(temp_dir: &tempfile::TempDir, id: &str) -> RepoVersion {
        RepoVersion::from_json(fs::read(temp_dir.path().join("repo_json").join(id).join("version.json")).unwrap())
            .unwrap()
    }

    #[test]
    fn test_empty_package_still_writes_version_record() {
        let (temp_dir, mut repository) = repository();
        let applied = apply_update(&mut repository, &package("ctrl1")).unwrap();
        assert!(applied.icon.is_none());
        assert!(applied.layout.is_none());
        assert!(applied.index.is_none());
        let written = fs::read_to_string(temp_dir.path().join("repo_json/ctrl1/version.json")).unwrap();
        assert!(written.contains("\"history\": []"));
        assert_eq!(repository.index().len(), 1);
    }

    #[test]
    fn test_layout_backfills_latest() {
        let (temp_dir, mut repository) = repository();
        let mut pkg = package("ctrl1");
        pkg.layout = Some(ControllerLayout { version: "3.1".into(), version_code: 3, ..Default::default() });
        let applied = apply_update(&mut repository, &pkg).unwrap();
        assert_eq!(applied.layout, Some(PathBuf::from("repo_json/ctrl1/versions/3.json")));
        assert!(temp_dir.path().join("repo_json/ctrl1/versions/3.json").is_file());
        assert_eq!(read_version(&temp_dir, "ctrl1").latest, Version::new(3, "3.1"));
    }

    #[test]
    fn test_layout_is_filed_under_package_version_code() {
        let (temp_dir, mut repository) = repository();
        let mut pkg = package("ctrl1");
        pkg.version_code = 8;
        pkg.layout = Some(ControllerLayout { version_code: 3, ..Default::default() });
        apply_update(&mut repository, &pkg).unwrap();
        assert!(temp_dir.path().join("repo_json/ctrl1/versions/8.json").is_file());
        assert!(!temp_dir.path().join("repo_json/ctrl1/versions/3.json").exists());
    }

    #[test]
    fn test_version_record_merges_with_existing() {
        let (temp_dir, mut repository) = repository();
        let dir = temp_dir.path().join("repo_json/ctrl1");
        fs::create_dir_all(&dir).unwrap();
        let existing = RepoVersion { latest: Version::new(1, "1.0"), ..Default::default() };
        fs::write(dir.join("version.json"), existing.to_json().unwrap()).unwrap();

        let mut pkg = package("ctrl1");
        pkg.version_info = Some(RepoVersion { latest: Version::new(2, "2.0"), ..Default::default() });
        let applied = apply_update(&mut repository, &pkg).unwrap();
        assert_eq!(applied.version.latest, Version::new(2, "2.0"));
        assert_eq!(applied.version.history, vec![Version::new(1, "1.0")]);
        assert_eq!(read_version(&temp_dir, "ctrl1"), applied.version);
    }

    #[test]
    fn test_unreadable_existing_record_is_replaced() {
        let (temp_dir, mut repository) = repository();
        let dir = temp_dir.path().join("repo_json/ctrl1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("version.json"), "{ definitely not").unwrap();
        let mut pkg = package("ctrl1");
        pkg.version_info = Some(RepoVersion { latest: Version::new(2, "2.0"), ..Default::default() });
        apply_update(&mut repository, &pkg).unwrap();
        assert_eq!(read_version(&temp_dir, "ctrl1").latest, Version::new(2, "2.0"));
    }

    #[test]
    fn test_screenshot_count_covers_files_on_disk() {
        let (temp_dir, mut repository) = repository();
        let shots = temp_dir.path().join("repo_json/ctrl1/screenshots");
        fs::create_dir_all(&shots).unwrap();
        fs::write(shots.join("a.png"), b"a").unwrap();
        fs::write(shots.join("b.jpg"), b"b").unwrap();
        let applied = apply_update(&mut repository, &package("ctrl1")).unwrap();
        assert!(applied.screenshots.is_empty());
        assert_eq!(applied.version.screenshot, 2);
        // Without screenshots in the package, the existing ones stay.
        assert!(shots.join("a.png").is_file());
    }

    #[test]
    fn test_index_upsert_and_persist() {
        let (temp_dir, mut repository) = repository();
        let mut pkg = package("ctrl1");
        pkg.index_entry = Some(IndexEntry { id: "ctrl1".into(), name: "One".into(), ..Default::default() });
        assert_eq!(apply_update(&mut repository, &pkg).unwrap().index, Some(Upsert::Appended));
        pkg.index_entry = Some(IndexEntry { id: "ctrl1".into(), name: "Uno".into(), ..Default::default() });
        assert_eq!(apply_update(&mut repository, &pkg).unwrap().index, Some(Upsert::Replaced));

        let persisted = <Vec<IndexEntry>>::from_json(fs::read(temp_dir.path().join("index.json")).unwrap()).unwrap();
        let names: Vec<_> = persisted.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Zero", "Uno"]);
    }

    #[test]
    fn test_invalid_controller_id() {
        let (_temp_dir, mut repository) = repository();
        let err = apply_update(&mut repository, &package("..")).unwrap_err();
        assert!(matches!(&*err, LibraryErrorKind::Reconcile));
    }

    #[test]
    fn test_missing_icon_source_aborts_before_index() {
        let (temp_dir, mut repository) = repository();
        let mut pkg = package("ctrl1");
        pkg.icon = Some(temp_dir.path().join("nowhere/icon.png"));
        pkg.index_entry = Some(IndexEntry { id: "ctrl1".into(), ..Default::default() });
        assert!(apply_update(&mut repository, &pkg).is_err());
        assert!(repository.find("ctrl1").is_none());
        assert!(!temp_dir.path().join("repo_json/ctrl1/version.json").exists());
    }
}
