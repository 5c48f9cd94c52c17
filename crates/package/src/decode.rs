//! Archive scanning and extraction.
//!
//! Decoding happens in three passes over a zip archive:
//!
//! 1. Scan entry names (without decompressing anything) to find the single
//!    controller id every entry lives under, rejecting unsafe paths.
//! 2. Extract every entry into a fresh scratch directory.
//! 3. Read the well-known files back out of the scratch directory.
//!
//! Scratch space is only allocated once the archive is known to be well-formed,
//! and is owned by a [`TempDir`](tempfile::TempDir) from then on, so any error
//! in the later passes removes it again.

use crate::error::{ErrorKind, Result};
use crate::package::ParsedPackage;
use ctrlrepo_models::{ControllerLayout, Document, IndexEntry, RepoVersion, is_screenshot_image};
use ctrlrepo_storage::{LocalBackend, validate_path, validate_segment};
use exn::{OptionExt, ResultExt};
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::instrument;
use zip::ZipArchive;

const SCRATCH_PREFIX: &str = "ctrlrepo-";

/// Decode a package archive, extracting it under the system's temporary
/// directory.
///
/// # Errors
/// - [`Archive`](ErrorKind::Archive) if the archive can't be read.
/// - [`MalformedPackage`](ErrorKind::MalformedPackage) if entries belong to
///   more than one controller.
/// - [`MissingControllerId`](ErrorKind::MissingControllerId) if no entry
///   belongs to a controller.
/// - [`UnsafeEntry`](ErrorKind::UnsafeEntry) if an entry would be extracted
///   outside the scratch directory.
pub fn decode(archive: impl AsRef<Path>) -> Result<ParsedPackage> {
    decode_in(archive, std::env::temp_dir())
}

/// Like [`decode`], but the scratch directory is created inside
/// `scratch_parent`.
#[instrument(skip_all, fields(archive = %archive.as_ref().display()))]
pub fn decode_in(archive: impl AsRef<Path>, scratch_parent: impl AsRef<Path>) -> Result<ParsedPackage> {
    let bytes = fs::read(archive.as_ref()).or_raise(|| ErrorKind::Archive)?;
    let digest = blake3::hash(&bytes).to_string();
    let mut zip = ZipArchive::new(Cursor::new(bytes)).or_raise(|| ErrorKind::Archive)?;

    let controller_id = scan_controller_id(&mut zip)?;
    tracing::debug!(controller = %controller_id, entries = zip.len(), "found controller in package");

    let scratch_parent = std::path::absolute(scratch_parent.as_ref()).or_raise(|| ErrorKind::Scratch)?;
    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(&scratch_parent)
        .or_raise(|| ErrorKind::Scratch)?;
    let backend = LocalBackend::new(scratch.path()).or_raise(|| ErrorKind::Scratch)?;
    extract(&mut zip, &backend)?;

    let mut package = ParsedPackage::extracted(controller_id, scratch, digest);
    load(&backend, &mut package)?;
    tracing::info!(
        controller = %package.controller_id,
        version_code = package.version_code,
        screenshots = package.screenshots.len(),
        skipped = package.skipped.len(),
        "decoded package"
    );
    Ok(package)
}

/// The portion of an entry name that identifies its controller, or `None` for
/// bare top-level files that don't belong to any controller.
fn controller_segment(name: &str) -> Option<&str> {
    name.split_once('/').map(|(first, _)| first)
}

fn scan_controller_id<R: Read + Seek>(zip: &mut ZipArchive<R>) -> Result<String> {
    let mut controller_id: Option<String> = None;
    for i in 0..zip.len() {
        // Raw access reads the header only; nothing is decompressed.
        let entry = zip.by_index_raw(i).or_raise(|| ErrorKind::Archive)?;
        let name = entry.name();
        let Some(segment) = controller_segment(name) else {
            tracing::trace!(entry = name, "ignoring top-level entry");
            continue;
        };
        if validate_segment(segment).is_err() || validate_path(name).is_err() {
            exn::bail!(ErrorKind::UnsafeEntry(name.to_owned()));
        }
        match &controller_id {
            None => controller_id = Some(segment.to_owned()),
            Some(first) if first != segment => exn::bail!(ErrorKind::MalformedPackage {
                first: first.clone(),
                second: segment.to_owned(),
            }),
            Some(_) => {},
        }
    }
    controller_id.ok_or_raise(|| ErrorKind::MissingControllerId)
}

fn extract<R: Read + Seek>(zip: &mut ZipArchive<R>, backend: &LocalBackend) -> Result<()> {
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).or_raise(|| ErrorKind::Archive)?;
        if controller_segment(entry.name()).is_none() {
            continue;
        }
        let target = backend.absolute_path(entry.name()).or_raise(|| ErrorKind::UnsafeEntry(entry.name().to_owned()))?;
        if entry.is_dir() {
            fs::create_dir_all(&target).or_raise(|| ErrorKind::Scratch)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).or_raise(|| ErrorKind::Scratch)?;
        }
        let mut out = File::create(&target).or_raise(|| ErrorKind::Scratch)?;
        io::copy(&mut entry, &mut out).or_raise(|| ErrorKind::Archive)?;
    }
    Ok(())
}

fn load(backend: &LocalBackend, package: &mut ParsedPackage) -> Result<()> {
    let base = PathBuf::from(&package.controller_id);

    package.version_info = read_optional::<RepoVersion>(backend, &base.join("version.json"), &mut package.skipped);
    if let Some(version) = &package.version_info {
        package.version_code = version.latest.version_code;
    }

    let index_path = base.join("index.json");
    package.index_entry = match read_optional::<IndexEntry>(backend, &index_path, &mut package.skipped) {
        Some(entry) if entry.id.is_empty() => Some(IndexEntry { id: package.controller_id.clone(), ..entry }),
        Some(entry) if entry.id != package.controller_id => {
            tracing::warn!(
                controller = %package.controller_id,
                named = %entry.id,
                "package index entry names another controller; ignoring it"
            );
            package.skipped.push(index_path);
            None
        },
        entry => entry,
    };

    let versions_dir = base.join("versions");
    let mut candidates = backend
        .list_files(&versions_dir, |p| p.extension().is_some_and(|ext| ext == "json"))
        .or_raise(|| ErrorKind::Scratch)?;
    // The layout `version.json` points at goes first, if the package has it.
    if package.version_code != 0 {
        let named = versions_dir.join(format!("{}.json", package.version_code));
        if let Some(pos) = candidates.iter().position(|p| *p == named) {
            let preferred = candidates.remove(pos);
            candidates.insert(0, preferred);
        }
    }
    for candidate in candidates {
        if let Some(layout) = read_optional::<ControllerLayout>(backend, &candidate, &mut package.skipped) {
            if package.version_code == 0 {
                package.version_code = layout.version_code;
            }
            package.layout = Some(layout);
            break;
        }
    }

    let icon = base.join("icon.png");
    if backend.list_files(&base, |p| *p == icon).or_raise(|| ErrorKind::Scratch)?.is_empty() {
        package.icon = None;
    } else {
        package.icon = Some(backend.absolute_path(&icon).or_raise(|| ErrorKind::Scratch)?);
    }

    package.screenshots = backend
        .list_files(base.join("screenshots"), |p| is_screenshot_image(p))
        .or_raise(|| ErrorKind::Scratch)?
        .into_iter()
        .map(|p| backend.absolute_path(p))
        .collect::<std::result::Result<Vec<_>, _>>()
        .or_raise(|| ErrorKind::Scratch)?;
    Ok(())
}

/// Read and decode an optional document. Missing files are `None`; files that
/// exist but can't be read or decoded are `None` too, and get recorded in
/// `skipped`.
fn read_optional<T: Document>(backend: &LocalBackend, path: &Path, skipped: &mut Vec<PathBuf>) -> Option<T> {
    let decoded = match backend.read_optional(path) {
        Ok(None) => return None,
        Ok(Some(bytes)) => T::from_json(bytes).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    match decoded {
        Ok(document) => Some(document),
        Err(error) => {
            tracing::warn!(path = %path.display(), kind = T::KIND, %error, "skipping undecodable package file");
            skipped.push(path.to_path_buf());
            None
        },
    }
}
