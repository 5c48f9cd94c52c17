//! Helpers for building package archives in tests.

use std::io::Write;
use tempfile::NamedTempFile;
use zip::ZipWriter;
use zip::write::FileOptions;

/// A small but complete `version.json` for controller revision `2.0`.
pub const VERSION_JSON: &str = r#"{
  "screenshot": 0,
  "description": "A test controller",
  "author": "tester",
  "latest": {"versionCode": 2, "versionName": "2.0"},
  "history": [{"versionCode": 1, "versionName": "1.0"}]
}"#;

enum Entry {
    File(String, Vec<u8>),
    Directory(String),
}

/// Builds a zip archive on disk, entry by entry, in the order given.
#[derive(Default)]
pub struct PackageBuilder {
    entries: Vec<Entry>,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        self.entries.push(Entry::File(name.to_owned(), contents.as_ref().to_vec()));
        self
    }

    pub fn directory(mut self, name: &str) -> Self {
        self.entries.push(Entry::Directory(name.to_owned()));
        self
    }

    /// Write the archive to a temporary `.zip` file, deleted when dropped.
    ///
    /// # Panics
    /// Panics if the archive can't be written.
    pub fn build(self) -> NamedTempFile {
        let mut archive = tempfile::Builder::new().suffix(".zip").tempfile().expect("create archive file");
        let mut zip = ZipWriter::new(archive.as_file_mut());
        let options = FileOptions::default();
        for entry in self.entries {
            match entry {
                Entry::File(name, contents) => {
                    zip.start_file(name, options).expect("start zip entry");
                    zip.write_all(&contents).expect("write zip entry");
                },
                Entry::Directory(name) => zip.add_directory(name, options).expect("add zip directory"),
            }
        }
        zip.finish().expect("finish archive");
        drop(zip);
        archive
    }
}
