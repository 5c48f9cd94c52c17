use crate::null_as_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One controller's row in the repository-wide catalog (`index.json`).
///
/// The `id` is the identity key; it matches the controller's directory name
/// under `repo_json/`. `device` and `categories` are sets of numeric ids and
/// are written back sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexEntry {
    pub id: String,
    pub lang: String,
    pub name: String,
    pub introduction: String,
    #[serde(deserialize_with = "null_as_default")]
    pub device: BTreeSet<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: BTreeSet<i64>,
}

/// Reference data from `category.json`. Never written by this workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub lang: Vec<CategoryLabel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryLabel {
    pub locale: String,
    pub text: String,
}

impl Category {
    /// The category's display text for `locale`, falling back to the first
    /// label when there's no exact match.
    pub fn label(&self, locale: &str) -> Option<&str> {
        self.lang
            .iter()
            .find(|l| l.locale.eq_ignore_ascii_case(locale))
            .or_else(|| self.lang.first())
            .map(|l| l.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use rstest::rstest;

    #[test]
    fn test_decode_index_entry() {
        let json = r#"{
            "id": "ctrl1",
            "lang": "en",
            "name": "Pad",
            "introduction": "A pad",
            "device": [2, 1, 2],
            "categories": [5]
        }"#;
        let entry = IndexEntry::from_json(json).unwrap();
        assert_eq!(entry.id, "ctrl1");
        assert_eq!(entry.device, BTreeSet::from([1, 2]));
        assert_eq!(entry.categories, BTreeSet::from([5]));
    }

    #[test]
    fn test_null_and_missing_sets_decode_as_empty() {
        let entry = IndexEntry::from_json(r#"{"id": "ctrl1", "device": null}"#).unwrap();
        assert!(entry.device.is_empty());
        assert!(entry.categories.is_empty());
        assert_eq!(entry.name, "");
    }

    #[rstest]
    #[case("zh_CN", Some("手柄"))]
    #[case("EN", Some("Gamepad"))]
    #[case("de", Some("Gamepad"))]
    fn test_category_label(#[case] locale: &str, #[case] expected: Option<&str>) {
        let category = Category {
            id: 1,
            lang: vec![
                CategoryLabel { locale: "en".into(), text: "Gamepad".into() },
                CategoryLabel { locale: "zh_CN".into(), text: "手柄".into() },
            ],
        };
        assert_eq!(category.label(locale), expected);
    }

    #[test]
    fn test_category_without_labels() {
        let category = Category { id: 7, lang: vec![] };
        assert_eq!(category.label("en"), None);
    }
}
