//! Raw DSON document layout.
//!
//! Only the fields the asset model needs are declared; serde skips the
//! rest (vertex arrays, polygon lists, delta values). Every section is
//! optional because library files, scene files and presets each carry a
//! different subset.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DsonFile {
    pub file_version: Option<String>,
    pub asset_info: Option<AssetInfo>,
    pub geometry_library: Vec<GeometryEntry>,
    pub node_library: Vec<NodeEntry>,
    pub uv_set_library: Vec<UvSetEntry>,
    pub modifier_library: Vec<ModifierEntry>,
    pub image_library: Vec<ImageEntry>,
    pub material_library: Vec<MaterialEntry>,
    pub scene: Option<Scene>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AssetInfo {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub contributor: Option<Contributor>,
    pub revision: Option<String>,
    pub modified: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Contributor {
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ChannelEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub channel_type: Option<String>,
    pub label: Option<String>,
    pub value: Option<Value>,
    pub current_value: Option<Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// `{"count": n, "values": [...]}` where only the count matters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Counted {
    pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StringList {
    pub values: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NodeEntry {
    pub id: String,
    pub url: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub parent: Option<String>,
    pub rotation_order: Option<String>,
    pub inherits_scale: Option<bool>,
    pub center_point: Vec<ChannelEntry>,
    pub end_point: Vec<ChannelEntry>,
    pub orientation: Vec<ChannelEntry>,
    pub rotation: Vec<ChannelEntry>,
    pub translation: Vec<ChannelEntry>,
    pub scale: Vec<ChannelEntry>,
    pub general_scale: Option<ChannelEntry>,
    /// Geometry instances, in scene nodes.
    pub geometries: Vec<GeometryEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GeometryEntry {
    pub id: String,
    pub url: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub geometry_type: Option<String>,
    pub vertices: Option<Counted>,
    pub polylist: Option<Counted>,
    pub polygon_groups: Option<StringList>,
    pub polygon_material_groups: Option<StringList>,
    pub default_uv_set: Option<String>,
    pub edge_interpolation_mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UvSetEntry {
    pub id: String,
    pub url: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub parent: Option<String>,
    pub vertex_count: usize,
    pub uvs: Option<Counted>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FormulaEntry {
    pub output: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MorphEntry {
    pub deltas: Option<Counted>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ModifierEntry {
    pub id: String,
    pub url: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub parent: Option<String>,
    pub channel: Option<ChannelEntry>,
    pub region: Option<String>,
    pub group: Option<String>,
    pub formulas: Vec<FormulaEntry>,
    pub morph: Option<MorphEntry>,
    pub skin: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ImageMapEntry {
    pub url: Option<String>,
    pub label: Option<String>,
    pub operation: Option<String>,
    pub transparency: Option<f64>,
    pub invert: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ImageEntry {
    pub id: String,
    pub url: Option<String>,
    pub name: Option<String>,
    pub map_gamma: Option<f64>,
    pub map: Vec<ImageMapEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MaterialEntry {
    pub id: String,
    pub url: Option<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub geometry: Option<String>,
    pub uv_set: Option<String>,
    pub groups: Vec<String>,
    /// Channel properties (`"diffuse": {"channel": {...}, "image": "#map"}`)
    /// and anything else the material carries.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Scene {
    pub nodes: Vec<NodeEntry>,
    pub uvs: Vec<UvSetEntry>,
    pub modifiers: Vec<ModifierEntry>,
    pub materials: Vec<MaterialEntry>,
    pub images: Vec<ImageEntry>,
}
