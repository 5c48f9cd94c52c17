use crate::error::{ErrorKind, Result};
use crate::paths::{CATEGORY_FILE, CONTROLLERS_DIR, ControllerPaths, INDEX_FILE};
use ctrlrepo_models::{Category, ControllerLayout, IndexEntry, RepoVersion, is_screenshot_image};
use ctrlrepo_storage::LocalBackend;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Outcome of [`Repository::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Upsert {
    /// An entry with the same id was replaced, keeping its position.
    #[display("replaced")]
    Replaced,
    /// The entry was added to the end of the index.
    #[display("appended")]
    Appended,
}

/// Everything the repository holds about one controller.
#[derive(Debug, Clone)]
pub struct ControllerDetails {
    pub id: String,
    pub version: RepoVersion,
    /// The layout for `version.latest`, if it exists and decodes.
    pub layout: Option<ControllerLayout>,
    pub entry: Option<IndexEntry>,
    /// Absolute path to the icon, if there is one.
    pub icon: Option<PathBuf>,
    /// Absolute paths, sorted by file name.
    pub screenshots: Vec<PathBuf>,
}

/// A controller repository on disk.
///
/// The repository holds the authoritative in-memory copy of `index.json` for
/// as long as it's alive; changes made with [`upsert`](Self::upsert) only
/// reach the disk on [`persist`](Self::persist). `category.json` is read once
/// and never written.
///
/// There's no locking: two processes working on the same root will overwrite
/// each other's index.
#[derive(Debug)]
pub struct Repository {
    backend: LocalBackend,
    index: Vec<IndexEntry>,
    categories: Vec<Category>,
}
impl Repository {
    /// Open the repository rooted at `root`.
    ///
    /// # Errors
    /// Returns [`RepositoryInvalid`](ErrorKind::RepositoryInvalid) if `root`
    /// isn't a directory, or if either `index.json` or `category.json` is
    /// missing or can't be decoded.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let invalid = || ErrorKind::RepositoryInvalid(root.to_path_buf());
        if !root.is_dir() {
            exn::bail!(invalid());
        }
        let backend = LocalBackend::new(std::path::absolute(root).or_raise(invalid)?).or_raise(invalid)?;
        let index: Vec<IndexEntry> = backend.read_document(INDEX_FILE).or_raise(invalid)?;
        let categories: Vec<Category> = backend.read_document(CATEGORY_FILE).or_raise(invalid)?;
        tracing::info!(controllers = index.len(), categories = categories.len(), "opened repository");
        Ok(Self { backend, index, categories })
    }

    /// Absolute path of the repository root.
    pub fn root(&self) -> &Path {
        self.backend.root()
    }

    /// Filesystem access scoped to the repository root.
    pub fn backend(&self) -> &LocalBackend {
        &self.backend
    }

    /// The index, in file order.
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn find(&self, id: &str) -> Option<&IndexEntry> {
        self.index.iter().find(|entry| entry.id == id)
    }

    /// Storage paths for a controller's files.
    pub fn paths(&self, id: &str) -> Result<ControllerPaths> {
        ControllerPaths::new(id)
    }

    /// Replace the entry with the same id in place, or append a new one.
    /// Only the in-memory index changes.
    pub fn upsert(&mut self, entry: IndexEntry) -> Upsert {
        match self.index.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => {
                *existing = entry;
                Upsert::Replaced
            },
            None => {
                self.index.push(entry);
                Upsert::Appended
            },
        }
    }

    /// Write the in-memory index back to `index.json`.
    pub fn persist(&self) -> Result<()> {
        self.backend.write_document(INDEX_FILE, &self.index).or_raise(|| ErrorKind::Storage)?;
        tracing::debug!(controllers = self.index.len(), "persisted index");
        Ok(())
    }

    /// Load a controller's version record, its latest layout, and its files.
    ///
    /// A missing or undecodable layout isn't an error, the controller may
    /// simply not have one for its current version yet.
    ///
    /// # Errors
    /// Returns [`ControllerNotFound`](ErrorKind::ControllerNotFound) if the
    /// controller has no `version.json`, and [`Storage`](ErrorKind::Storage)
    /// if it can't be read or decoded.
    #[instrument(skip(self))]
    pub fn load_controller_details(&self, id: &str) -> Result<ControllerDetails> {
        let paths = self.paths(id)?;
        let version: RepoVersion = match self.backend.read_document(paths.version_file()) {
            Ok(version) => version,
            Err(e) if e.is_not_found() => exn::bail!(ErrorKind::ControllerNotFound(id.to_owned())),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Storage),
        };

        let layout = match self.backend.read_document(paths.layout_file(version.latest.version_code)) {
            Ok(layout) => Some(layout),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::warn!(controller = id, code = version.latest.version_code, error = %e, "unreadable layout");
                None
            },
        };

        let icon = match self.backend.exists(paths.icon_file()).or_raise(|| ErrorKind::Storage)? {
            true => Some(self.backend.absolute_path(paths.icon_file()).or_raise(|| ErrorKind::Storage)?),
            false => None,
        };
        let screenshots = self
            .screenshots_on_disk(id)?
            .into_iter()
            .map(|p| self.backend.absolute_path(p).or_raise(|| ErrorKind::Storage))
            .collect::<Result<Vec<_>>>()?;

        Ok(ControllerDetails { id: id.to_owned(), version, layout, entry: self.find(id).cloned(), icon, screenshots })
    }

    /// Ids of every controller directory under `repo_json/`, whether it's
    /// indexed or not.
    pub fn controller_ids_on_disk(&self) -> Result<Vec<String>> {
        let dirs = self.backend.list_dirs(CONTROLLERS_DIR).or_raise(|| ErrorKind::Storage)?;
        Ok(dirs.iter().filter_map(|d| d.file_name()).map(|name| name.to_string_lossy().into_owned()).collect())
    }

    /// Storage paths of a controller's screenshots, sorted by file name.
    pub fn screenshots_on_disk(&self, id: &str) -> Result<Vec<PathBuf>> {
        let dir = self.paths(id)?.screenshot_dir();
        self.backend.list_files(dir, |p| is_screenshot_image(p)).or_raise(|| ErrorKind::Storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlrepo_models::{Document, Version};
    use std::fs;

    const INDEX: &str = r#"[
        {"id": "ctrl1", "name": "First", "categories": [1]},
        {"id": "ctrl2", "name": "Second"}
    ]"#;
    const CATEGORIES: &str = r#"[{"id": 1, "lang": [{"locale": "en", "text": "Action"}]}]"#;

    fn repository() -> (tempfile::TempDir, Repository) {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(INDEX_FILE), INDEX).unwrap();
        fs::write(temp_dir.path().join(CATEGORY_FILE), CATEGORIES).unwrap();
        let repo = Repository::open(temp_dir.path()).unwrap();
        (temp_dir, repo)
    }

    fn entry(id: &str, name: &str) -> IndexEntry {
        IndexEntry { id: id.into(), name: name.into(), ..Default::default() }
    }

    #[test]
    fn test_open() {
        let (temp_dir, repo) = repository();
        assert_eq!(repo.root(), temp_dir.path());
        assert_eq!(repo.index().len(), 2);
        assert_eq!(repo.categories()[0].label("en"), Some("Action"));
        assert_eq!(repo.find("ctrl2").map(|e| e.name.as_str()), Some("Second"));
        assert!(repo.find("ctrl3").is_none());
    }

    #[test]
    fn test_open_invalid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Repository::open(temp_dir.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::RepositoryInvalid(_)));

        fs::write(temp_dir.path().join(INDEX_FILE), INDEX).unwrap();
        fs::write(temp_dir.path().join(CATEGORY_FILE), "{").unwrap();
        let err = Repository::open(temp_dir.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::RepositoryInvalid(_)));

        let err = Repository::open(temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::RepositoryInvalid(_)));
    }

    #[test]
    fn test_upsert() {
        let (_temp_dir, mut repo) = repository();
        assert_eq!(repo.upsert(entry("ctrl1", "Renamed")), Upsert::Replaced);
        assert_eq!(repo.upsert(entry("ctrl3", "Third")), Upsert::Appended);
        let ids: Vec<_> = repo.index().iter().map(|e| (e.id.as_str(), e.name.as_str())).collect();
        assert_eq!(ids, vec![("ctrl1", "Renamed"), ("ctrl2", "Second"), ("ctrl3", "Third")]);
    }

    #[test]
    fn test_persist() {
        let (temp_dir, mut repo) = repository();
        repo.upsert(entry("ctrl3", "Third"));
        repo.persist().unwrap();

        let written = fs::read_to_string(temp_dir.path().join(INDEX_FILE)).unwrap();
        assert!(written.starts_with("[\n  {\n    \"id\": \"ctrl1\","));
        assert!(written.ends_with("]\n"));
        let reopened = Repository::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.index(), repo.index());
        // Categories are never rewritten.
        assert_eq!(fs::read_to_string(temp_dir.path().join(CATEGORY_FILE)).unwrap(), CATEGORIES);
    }

    #[test]
    fn test_load_controller_details() {
        let (temp_dir, repo) = repository();
        let version = RepoVersion { latest: Version::new(2, "2.0"), ..Default::default() };
        let dir = temp_dir.path().join("repo_json/ctrl1");
        fs::create_dir_all(dir.join("versions")).unwrap();
        fs::create_dir_all(dir.join("screenshots")).unwrap();
        fs::write(dir.join("version.json"), version.to_json().unwrap()).unwrap();
        fs::write(dir.join("versions/2.json"), r#"{"name": "Pad", "versionCode": 2}"#).unwrap();
        fs::write(dir.join("icon.png"), b"icon").unwrap();
        fs::write(dir.join("screenshots/b.png"), b"b").unwrap();
        fs::write(dir.join("screenshots/a.png"), b"a").unwrap();
        fs::write(dir.join("screenshots/readme.md"), b"r").unwrap();

        let details = repo.load_controller_details("ctrl1").unwrap();
        assert_eq!(details.version, version);
        assert_eq!(details.layout.map(|l| l.name), Some("Pad".to_owned()));
        assert_eq!(details.entry.map(|e| e.name), Some("First".to_owned()));
        assert_eq!(details.icon, Some(dir.join("icon.png")));
        assert_eq!(details.screenshots, vec![dir.join("screenshots/a.png"), dir.join("screenshots/b.png")]);
    }

    #[test]
    fn test_load_controller_details_without_layout() {
        let (temp_dir, repo) = repository();
        let dir = temp_dir.path().join("repo_json/ctrl2");
        fs::create_dir_all(dir.join("versions")).unwrap();
        fs::write(dir.join("version.json"), r#"{"latest": {"versionCode": 3}}"#).unwrap();
        fs::write(dir.join("versions/3.json"), "garbage").unwrap();
        let details = repo.load_controller_details("ctrl2").unwrap();
        assert!(details.layout.is_none());
        assert!(details.icon.is_none());
        assert!(details.screenshots.is_empty());
    }

    #[test]
    fn test_load_controller_details_errors() {
        let (temp_dir, repo) = repository();
        let err = repo.load_controller_details("ctrl9").unwrap_err();
        assert!(matches!(&*err, ErrorKind::ControllerNotFound(id) if id == "ctrl9"));

        let err = repo.load_controller_details("../ctrl1").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidControllerId(_)));

        fs::create_dir_all(temp_dir.path().join("repo_json/ctrl1")).unwrap();
        fs::write(temp_dir.path().join("repo_json/ctrl1/version.json"), "[").unwrap();
        let err = repo.load_controller_details("ctrl1").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
    }

    #[test]
    fn test_controller_ids_on_disk() {
        let (temp_dir, repo) = repository();
        assert!(repo.controller_ids_on_disk().unwrap().is_empty());
        fs::create_dir_all(temp_dir.path().join("repo_json/zeta")).unwrap();
        fs::create_dir_all(temp_dir.path().join("repo_json/alpha")).unwrap();
        fs::write(temp_dir.path().join("repo_json/stray.json"), b"{}").unwrap();
        assert_eq!(repo.controller_ids_on_disk().unwrap(), vec!["alpha".to_owned(), "zeta".to_owned()]);
    }
}
