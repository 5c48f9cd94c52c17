//! Local filesystem storage backend.
//!
//! All paths are relative to the configured root directory and validated
//! before use. Everything here is plain blocking `std::fs`: callers run to
//! completion on their own thread.

use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use ctrlrepo_models::Document;
use exn::OptionExt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Outcome of bringing an external file into the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// The file was copied; carries the number of bytes written.
    Copied(u64),
    /// Source and destination resolve to the same file; nothing was done.
    SameFile,
}

/// Local filesystem storage backend rooted at an absolute directory.
///
/// # Examples
///
/// ```no_run
/// use ctrlrepo_storage::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("/path/to/repository")?;
/// let index = backend.read("index.json")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new backend rooted at `root`.
    ///
    /// # Errors
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute, or exists but isn't a directory. A missing root is created.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            fs::create_dir_all(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a relative storage path.
    pub fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn map_io_error(e: io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(abs_path.try_exists().map_err(ErrorKind::Io)?)
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).map_err(|e| Self::map_io_error(e, path))?)
    }

    /// Like [`read`](Self::read), but a missing file is `Ok(None)`.
    pub fn read_optional(&self, path: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
        match self.read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write `data` to `path`, creating parent directories as needed.
    ///
    /// The data goes to a temporary sibling first and is renamed into place,
    /// so readers never observe a half-written file.
    pub fn write(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let abs_path = self.absolute_path(path)?;
        // Validated paths are never empty, so there's always a parent.
        let parent = abs_path.parent().ok_or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
        fs::create_dir_all(parent).map_err(|e| Self::map_io_error(e, path))?;
        let mut temp = NamedTempFile::new_in(parent).map_err(|e| Self::map_io_error(e, path))?;
        temp.write_all(data).map_err(ErrorKind::Io)?;
        temp.as_file().sync_all().map_err(ErrorKind::Io)?;
        carry_permissions(&abs_path, temp.path(), 0o644).map_err(ErrorKind::Io)?;
        temp.persist(&abs_path).map_err(|e| Self::map_io_error(e.error, path))?;
        Ok(())
    }

    /// Decode a JSON document.
    pub fn read_document<T: Document>(&self, path: impl AsRef<Path>) -> Result<T> {
        let bytes = self.read(path)?;
        T::from_json(bytes).map_err(ErrorKind::document)
    }

    /// Encode and [`write`](Self::write) a JSON document.
    pub fn write_document<T: Document>(&self, path: impl AsRef<Path>, document: &T) -> Result<()> {
        let bytes = document.to_json().map_err(ErrorKind::document)?;
        self.write(path, &bytes)
    }

    pub fn create_dir_all(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let abs_path = self.absolute_path(path)?;
        Ok(fs::create_dir_all(&abs_path).map_err(|e| Self::map_io_error(e, path))?)
    }

    /// Recursively delete a directory. A directory that doesn't exist is
    /// already deleted.
    pub fn remove_dir_all(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let abs_path = self.absolute_path(path)?;
        match fs::remove_dir_all(&abs_path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => exn::bail!(Self::map_io_error(e, path)),
            _ => Ok(()),
        }
    }

    /// List the regular files directly inside `dir` that satisfy `filter`,
    /// as storage paths sorted by file name.
    ///
    /// To stay consistent with [`read_optional`](Self::read_optional), a
    /// directory that doesn't exist results in an empty list, not an error.
    pub fn list_files(&self, dir: impl AsRef<Path>, filter: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
        self.list(dir.as_ref(), |ft| ft.is_file(), filter)
    }

    /// List the sub-directories directly inside `dir`, as storage paths
    /// sorted by name.
    pub fn list_dirs(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        self.list(dir.as_ref(), |ft| ft.is_dir(), |_| true)
    }

    fn list(
        &self,
        dir: &Path,
        kind: impl Fn(&fs::FileType) -> bool,
        filter: impl Fn(&Path) -> bool,
    ) -> Result<Vec<PathBuf>> {
        let abs_dir = self.absolute_path(dir)?;
        let entries = match fs::read_dir(&abs_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => exn::bail!(Self::map_io_error(e, dir)),
        };
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Self::map_io_error(e, dir))?;
            // Symlinks aren't followed; a broken one is silently dropped.
            let file_type = entry.file_type().map_err(|e| Self::map_io_error(e, dir))?;
            let relative = dir.join(entry.file_name());
            if kind(&file_type) && filter(&relative) {
                found.push(relative);
            }
        }
        found.sort();
        Ok(found)
    }

    /// Copy a file from anywhere on disk to `to` inside the backend,
    /// overwriting whatever is there.
    ///
    /// When `from` and the destination are the same file (for example a
    /// package that was loaded out of this very repository) nothing is
    /// copied: opening the destination for writing would truncate the source.
    pub fn import_file(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<Transfer> {
        let (from, to) = (from.as_ref(), to.as_ref());
        let abs_to = self.absolute_path(to)?;
        if same_file(from, &abs_to) {
            tracing::debug!(from = %from.display(), to = %abs_to.display(), "source is destination; skipping copy");
            return Ok(Transfer::SameFile);
        }
        if let Some(parent) = abs_to.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::map_io_error(e, to))?;
        }
        let bytes = fs::copy(from, &abs_to).map_err(|e| Self::map_io_error(e, from))?;
        Ok(Transfer::Copied(bytes))
    }

    /// Replace the directory `dir` with one containing exactly `sources`
    /// (flattened to their file names). Returns the storage paths written.
    ///
    /// The new contents are staged in a temporary sibling directory before the
    /// old directory is removed, so sources that live inside `dir` itself are
    /// still readable while staging.
    pub fn replace_dir(&self, dir: impl AsRef<Path>, sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let dir = validate_path(dir.as_ref())?;
        let abs_dir = self.root.join(&dir);
        let parent = abs_dir.parent().ok_or_raise(|| ErrorKind::InvalidPath(dir.clone()))?;
        fs::create_dir_all(parent).map_err(|e| Self::map_io_error(e, &dir))?;

        let staging = Builder::new().prefix(".staging-").tempdir_in(parent).map_err(|e| Self::map_io_error(e, &dir))?;
        let mut written = Vec::with_capacity(sources.len());
        for source in sources {
            let name = source.file_name().ok_or_raise(|| ErrorKind::InvalidPath(source.clone()))?;
            fs::copy(source, staging.path().join(name)).map_err(|e| Self::map_io_error(e, source))?;
            written.push(dir.join(name));
        }

        carry_permissions(&abs_dir, staging.path(), 0o755).map_err(ErrorKind::Io)?;
        self.remove_dir_all(&dir)?;
        let staged = staging.keep();
        if let Err(e) = fs::rename(&staged, &abs_dir) {
            _ = fs::remove_dir_all(&staged);
            exn::bail!(Self::map_io_error(e, &dir));
        }
        Ok(written)
    }
}

/// Whether two paths resolve to the same file on disk. Paths that can't be
/// resolved (usually because one doesn't exist yet) are never the same.
pub fn same_file(a: impl AsRef<Path>, b: impl AsRef<Path>) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Give `target` the permissions of `existing`, or `mode` when `existing`
/// isn't there yet. Temporary files and directories start out owner-only.
#[cfg(unix)]
fn carry_permissions(existing: &Path, target: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let permissions = match fs::metadata(existing) {
        Ok(metadata) => metadata.permissions(),
        Err(_) => fs::Permissions::from_mode(mode),
    };
    fs::set_permissions(target, permissions)
}

#[cfg(not(unix))]
fn carry_permissions(_existing: &Path, _target: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
