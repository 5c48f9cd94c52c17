//! Controller layouts (`versions/<code>.json`).
//!
//! A layout is the full on-screen description of one controller revision: a
//! palette of named styles and an ordered list of view groups holding the
//! buttons and direction pads. The repository never interprets layouts beyond
//! reading the version code and name; the remaining structure is typed so that
//! renderers downstream don't have to guess.
//!
//! Keys on the layout root and on direction controls that aren't modelled
//! here are kept in `extra` and written back untouched.

use crate::version::{Version, VersionCode};
use crate::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerLayout {
    pub id: String,
    pub name: String,
    /// Semantic version string (the human-readable name of the revision).
    pub version: String,
    pub version_code: VersionCode,
    pub author: String,
    pub description: String,
    pub controller_version: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub button_styles: Vec<ButtonStyle>,
    #[serde(deserialize_with = "null_as_default")]
    pub direction_styles: Vec<DirectionStyle>,
    #[serde(deserialize_with = "null_as_default")]
    pub view_groups: Vec<ViewGroup>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
impl ControllerLayout {
    /// The revision this layout describes.
    pub fn revision(&self) -> Version {
        Version::new(self.version_code, self.version.clone())
    }

    /// Total number of buttons and direction controls across all view groups.
    pub fn control_count(&self) -> usize {
        self.view_groups.iter().map(|g| g.view_data.button_list.len() + g.view_data.direction_list.len()).sum()
    }

    /// Look up a button style by name.
    pub fn button_style(&self, name: &str) -> Option<&ButtonStyle> {
        self.button_styles.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonStyle {
    pub name: String,
    pub text_color: i64,
    pub text_size: i64,
    pub stroke_color: i64,
    pub stroke_width: i64,
    pub corner_radius: i64,
    pub fill_color: i64,
    pub text_color_pressed: i64,
    pub text_size_pressed: i64,
    pub stroke_color_pressed: i64,
    pub stroke_width_pressed: i64,
    pub corner_radius_pressed: i64,
    pub fill_color_pressed: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectionStyle {
    pub name: String,
    pub style_type: String,
    pub button_style: ButtonStyle,
    pub rocker_style: RockerStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RockerStyle {
    pub rocker_size: i64,
    pub bg_corner_radius: i64,
    pub bg_stroke_width: i64,
    pub bg_stroke_color: i64,
    pub bg_fill_color: i64,
    pub rocker_corner_radius: i64,
    pub rocker_stroke_width: i64,
    pub rocker_stroke_color: i64,
    pub rocker_fill_color: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewGroup {
    pub id: String,
    pub name: String,
    pub visibility: String,
    pub view_data: ViewData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewData {
    #[serde(deserialize_with = "null_as_default")]
    pub button_list: Vec<Button>,
    #[serde(deserialize_with = "null_as_default")]
    pub direction_list: Vec<Direction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Button {
    pub id: String,
    pub text: String,
    pub style: String,
    pub base_info: BaseInfo,
    pub event: Event,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Direction {
    pub id: String,
    pub style: String,
    pub base_info: BaseInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Position and size of a control. Positions are in thousandths of the
/// screen's width/height.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BaseInfo {
    pub visibility_type: String,
    pub x_position: i64,
    pub y_position: i64,
    pub size_type: String,
    pub absolute_width: i64,
    pub absolute_height: i64,
    pub percentage_width: Percentage,
    pub percentage_height: Percentage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Percentage {
    pub reference: String,
    pub size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    pub pointer_follow: bool,
    // Yes, capitalised. That's what the launcher writes.
    #[serde(rename = "Movable")]
    pub movable: bool,
    pub press_event: PressEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PressEvent {
    pub auto_keep: bool,
    pub auto_click: bool,
    pub open_menu: bool,
    pub switch_touch_mode: bool,
    pub input: bool,
    pub quick_input: bool,
    pub output_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub output_keycodes: Vec<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub bind_view_group: Vec<String>,
}
