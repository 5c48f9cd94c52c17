//! Typed entities for controller repositories and controller packages.
//!
//! Everything persisted by the repository (or shipped inside a package) is a
//! JSON document, and every document has a typed counterpart here:
//!
//! | File                         | Type                        |
//! |------------------------------|-----------------------------|
//! | `<root>/index.json`          | `Vec<`[`IndexEntry`]`>`     |
//! | `<root>/category.json`       | `Vec<`[`Category`]`>`       |
//! | `<id>/index.json` (package)  | [`IndexEntry`]              |
//! | `<id>/version.json`          | [`RepoVersion`]             |
//! | `<id>/versions/<code>.json`  | [`ControllerLayout`]        |
//!
//! Decoding goes straight into the typed structs via the [`Document`] trait,
//! there is no intermediate `serde_json::Value` step. Decoding is lenient
//! about *missing* fields (they take their default value) and about `null`
//! arrays, but a document with the wrong shape is an error.

pub mod error;
mod image;
mod index;
mod layout;
mod version;

pub use crate::image::{ImageKind, is_screenshot_image};
pub use crate::index::{Category, CategoryLabel, IndexEntry};
pub use crate::layout::{
    BaseInfo, Button, ButtonStyle, ControllerLayout, Direction, DirectionStyle, Event, Percentage, PressEvent,
    RockerStyle, ViewData, ViewGroup,
};
pub use crate::version::{RepoVersion, Version, VersionCode};

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A JSON document that lives in a repository or a package.
///
/// Encoding is stable so that the persisted files stay human-diffable: keys
/// come out in declaration order, indented by two spaces, with a trailing
/// newline.
pub trait Document: Serialize + DeserializeOwned {
    /// Short name of the document, used in error messages.
    const KIND: &'static str;

    /// Decode a document from raw JSON bytes.
    fn from_json(bytes: impl AsRef<[u8]>) -> Result<Self> {
        serde_json::from_slice(bytes.as_ref()).or_raise(|| ErrorKind::InvalidDocument(Self::KIND))
    }

    /// Encode a document as pretty-printed JSON bytes.
    fn to_json(&self) -> Result<Vec<u8>> {
        let mut out = serde_json::to_vec_pretty(self).or_raise(|| ErrorKind::Encode(Self::KIND))?;
        out.push(b'\n');
        Ok(out)
    }
}

impl Document for Vec<IndexEntry> {
    const KIND: &'static str = "index";
}
impl Document for Vec<Category> {
    const KIND: &'static str = "category";
}
impl Document for IndexEntry {
    const KIND: &'static str = "index entry";
}
impl Document for RepoVersion {
    const KIND: &'static str = "version";
}
impl Document for ControllerLayout {
    const KIND: &'static str = "layout";
}

/// Older tooling wrote empty arrays as `null`. Treat them as empty.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
