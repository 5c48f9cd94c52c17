//! Where a controller's files live, relative to the repository root.
//!
//! ```text
//! repo_json/<id>/version.json
//! repo_json/<id>/versions/<code>.json
//! repo_json/<id>/icon.png
//! repo_json/<id>/screenshots/*
//! ```

use crate::error::{ErrorKind, Result};
use ctrlrepo_models::VersionCode;
use ctrlrepo_storage::validate_segment;
use exn::ResultExt;
use std::path::PathBuf;

/// Directory (under the root) that holds one sub-directory per controller.
pub const CONTROLLERS_DIR: &str = "repo_json";
pub const INDEX_FILE: &str = "index.json";
pub const CATEGORY_FILE: &str = "category.json";

/// Storage paths for a single controller. Construction validates the id, so
/// every path handed out stays inside the controller's own directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerPaths {
    dir: PathBuf,
}
impl ControllerPaths {
    pub fn new(controller_id: &str) -> Result<Self> {
        let id = validate_segment(controller_id).or_raise(|| ErrorKind::InvalidControllerId(controller_id.to_owned()))?;
        Ok(Self { dir: PathBuf::from(CONTROLLERS_DIR).join(id) })
    }

    pub fn controller_dir(&self) -> PathBuf {
        self.dir.clone()
    }

    pub fn version_file(&self) -> PathBuf {
        self.dir.join("version.json")
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.dir.join("versions")
    }

    pub fn layout_file(&self, code: VersionCode) -> PathBuf {
        self.layouts_dir().join(format!("{code}.json"))
    }

    pub fn icon_file(&self) -> PathBuf {
        self.dir.join("icon.png")
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.dir.join("screenshots")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[test]
    fn test_paths() {
        let paths = ControllerPaths::new("ctrl1").unwrap();
        assert_eq!(paths.controller_dir(), Path::new("repo_json/ctrl1"));
        assert_eq!(paths.version_file(), Path::new("repo_json/ctrl1/version.json"));
        assert_eq!(paths.layout_file(12), Path::new("repo_json/ctrl1/versions/12.json"));
        assert_eq!(paths.icon_file(), Path::new("repo_json/ctrl1/icon.png"));
        assert_eq!(paths.screenshot_dir(), Path::new("repo_json/ctrl1/screenshots"));
    }

    #[rstest]
    #[case("")]
    #[case("..")]
    #[case("ctrl1/../ctrl2")]
    #[case("/etc")]
    fn test_invalid_ids(#[case] id: &str) {
        let err = ControllerPaths::new(id).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidControllerId(i) if i == id));
    }
}
