use crate::null_as_default;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Numeric identifier of a layout revision. Zero means "unset".
pub type VersionCode = i64;

/// A single layout revision: its numeric code and human-readable name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Version {
    pub version_code: VersionCode,
    pub version_name: String,
}
impl Version {
    pub fn new(version_code: VersionCode, version_name: impl Into<String>) -> Self {
        Self { version_code, version_name: version_name.into() }
    }

    /// Whether this version actually identifies a revision.
    pub fn is_set(&self) -> bool {
        self.version_code != 0
    }
}
impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.version_name, self.version_code)
    }
}

/// A controller's `version.json`: descriptive metadata plus its version
/// history.
///
/// `history` should never hold `latest`'s version code, nor two entries with
/// the same code. It is always written as an array (never `null`, never
/// omitted).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoVersion {
    pub screenshot: u32,
    pub description: String,
    pub author: String,
    pub latest: Version,
    #[serde(deserialize_with = "null_as_default")]
    pub history: Vec<Version>,
}
impl RepoVersion {
    /// Whether `history` already holds an entry for `code`.
    pub fn has_history(&self, code: VersionCode) -> bool {
        self.history.iter().any(|v| v.version_code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    #[test]
    fn test_decode_repo_version() {
        let json = r#"{
            "screenshot": 2,
            "description": "desc",
            "author": "someone",
            "latest": {"versionCode": 3, "versionName": "1.2"},
            "history": [{"versionCode": 1, "versionName": "1.0"}]
        }"#;
        let version = RepoVersion::from_json(json).unwrap();
        assert_eq!(version.screenshot, 2);
        assert_eq!(version.latest, Version::new(3, "1.2"));
        assert!(version.has_history(1));
        assert!(!version.has_history(3));
    }

    #[test]
    fn test_null_history_decodes_as_empty() {
        let version = RepoVersion::from_json(r#"{"latest": {"versionCode": 1}, "history": null}"#).unwrap();
        assert!(version.history.is_empty());
        assert_eq!(version.latest.version_name, "");
    }

    #[test]
    fn test_empty_history_is_written_as_array() {
        let encoded = String::from_utf8(RepoVersion::default().to_json().unwrap()).unwrap();
        assert!(encoded.contains("\"history\": []"));
        assert!(encoded.contains("\"versionCode\": 0"));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::new(4, "2.0").to_string(), "2.0 (4)");
        assert!(!Version::default().is_set());
    }
}
