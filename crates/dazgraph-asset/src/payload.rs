//! Typed asset payloads.
//!
//! Payloads are decoded once, when a file is parsed. References inside a
//! payload are stored normalized and qualified against the file they were
//! read from, so a payload can be merged onto an asset from another file
//! without its references changing meaning.

use dazgraph_url::NormalizedRef;
use serde_json::Value;

/// A DSON channel (a typed, animatable property).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Channel {
    pub id: String,
    pub channel_type: Option<String>,
    pub label: Option<String>,
    pub value: Option<Value>,
    pub current_value: Option<Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Image map driving this channel, for material channels.
    pub image: Option<NormalizedRef>,
}

impl Channel {
    /// Create a channel carrying only a value.
    pub fn with_value(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            value: Some(value),
            ..Default::default()
        }
    }

    /// The value in effect: `current_value` when present, else `value`.
    pub fn effective_value(&self) -> Option<&Value> {
        self.current_value.as_ref().or(self.value.as_ref())
    }

    /// The effective value as a float.
    pub fn as_f64(&self) -> Option<f64> {
        self.effective_value().and_then(Value::as_f64)
    }

    fn merge(&mut self, overlay: &Channel) {
        merge_opt(&mut self.channel_type, &overlay.channel_type);
        merge_opt(&mut self.label, &overlay.label);
        merge_opt(&mut self.value, &overlay.value);
        merge_opt(&mut self.current_value, &overlay.current_value);
        merge_opt(&mut self.min, &overlay.min);
        merge_opt(&mut self.max, &overlay.max);
        merge_opt(&mut self.image, &overlay.image);
    }
}

/// Top-level `asset_info` of a file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileInfo {
    pub asset_type: Option<String>,
    pub file_version: Option<String>,
    pub revision: Option<String>,
    pub modified: Option<String>,
    pub author: Option<String>,
}

/// Figure, bone and plain node payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePayload {
    pub name: Option<String>,
    pub label: Option<String>,
    pub node_type: Option<String>,
    pub rotation_order: Option<String>,
    pub inherits_scale: Option<bool>,
    pub center_point: Vec<Channel>,
    pub end_point: Vec<Channel>,
    pub orientation: Vec<Channel>,
    pub rotation: Vec<Channel>,
    pub translation: Vec<Channel>,
    pub scale: Vec<Channel>,
    pub general_scale: Option<Channel>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryPayload {
    pub name: Option<String>,
    pub label: Option<String>,
    pub geometry_type: Option<String>,
    pub vertex_count: usize,
    pub polygon_count: usize,
    pub polygon_groups: Vec<String>,
    pub material_groups: Vec<String>,
    pub default_uv_set: Option<NormalizedRef>,
    pub edge_interpolation_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UvSetPayload {
    pub name: Option<String>,
    pub label: Option<String>,
    pub vertex_count: usize,
    pub uv_count: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialPayload {
    pub name: Option<String>,
    pub label: Option<String>,
    pub geometry: Option<NormalizedRef>,
    pub uv_set: Option<NormalizedRef>,
    pub groups: Vec<String>,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifierPayload {
    pub name: Option<String>,
    pub label: Option<String>,
    /// `morph`, `skin`, or `channel` for plain property modifiers.
    pub modifier_type: Option<String>,
    pub channel: Option<Channel>,
    pub region: Option<String>,
    pub group: Option<String>,
    /// Targets written by this modifier's formulas.
    pub formula_outputs: Vec<NormalizedRef>,
    pub morph_deltas: usize,
}

/// One layer of an image asset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageMap {
    pub url: Option<NormalizedRef>,
    pub label: Option<String>,
    pub operation: Option<String>,
    pub transparency: Option<f64>,
    pub invert: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImagePayload {
    pub name: Option<String>,
    pub map_gamma: Option<f64>,
    pub maps: Vec<ImageMap>,
}

/// Decoded content of an asset.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetPayload {
    File(FileInfo),
    Node(NodePayload),
    Geometry(GeometryPayload),
    UvSet(UvSetPayload),
    Material(MaterialPayload),
    Modifier(ModifierPayload),
    Image(ImagePayload),
    /// Anything without a dedicated payload type.
    Other(Value),
}

impl AssetPayload {
    /// Name carried by the payload, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            AssetPayload::File(_) => None,
            AssetPayload::Node(p) => p.name.as_deref(),
            AssetPayload::Geometry(p) => p.name.as_deref(),
            AssetPayload::UvSet(p) => p.name.as_deref(),
            AssetPayload::Material(p) => p.name.as_deref(),
            AssetPayload::Modifier(p) => p.name.as_deref(),
            AssetPayload::Image(p) => p.name.as_deref(),
            AssetPayload::Other(v) => v.get("name").and_then(Value::as_str),
        }
    }

    /// Merge overlay values into this payload.
    ///
    /// Fields present in the overlay replace those here; channels are
    /// matched by id. Returns false if the payload types differ.
    pub fn merge(&mut self, overlay: &AssetPayload) -> bool {
        match (self, overlay) {
            (AssetPayload::File(base), AssetPayload::File(o)) => {
                merge_opt(&mut base.asset_type, &o.asset_type);
                merge_opt(&mut base.file_version, &o.file_version);
                merge_opt(&mut base.revision, &o.revision);
                merge_opt(&mut base.modified, &o.modified);
                merge_opt(&mut base.author, &o.author);
            }
            (AssetPayload::Node(base), AssetPayload::Node(o)) => {
                merge_opt(&mut base.name, &o.name);
                merge_opt(&mut base.label, &o.label);
                merge_opt(&mut base.node_type, &o.node_type);
                merge_opt(&mut base.rotation_order, &o.rotation_order);
                merge_opt(&mut base.inherits_scale, &o.inherits_scale);
                merge_channels(&mut base.center_point, &o.center_point);
                merge_channels(&mut base.end_point, &o.end_point);
                merge_channels(&mut base.orientation, &o.orientation);
                merge_channels(&mut base.rotation, &o.rotation);
                merge_channels(&mut base.translation, &o.translation);
                merge_channels(&mut base.scale, &o.scale);
                match (&mut base.general_scale, &o.general_scale) {
                    (Some(b), Some(o)) => b.merge(o),
                    (b @ None, Some(o)) => *b = Some(o.clone()),
                    _ => {}
                }
            }
            (AssetPayload::Geometry(base), AssetPayload::Geometry(o)) => {
                merge_opt(&mut base.name, &o.name);
                merge_opt(&mut base.label, &o.label);
                merge_opt(&mut base.geometry_type, &o.geometry_type);
                merge_count(&mut base.vertex_count, o.vertex_count);
                merge_count(&mut base.polygon_count, o.polygon_count);
                merge_vec(&mut base.polygon_groups, &o.polygon_groups);
                merge_vec(&mut base.material_groups, &o.material_groups);
                merge_opt(&mut base.default_uv_set, &o.default_uv_set);
                merge_opt(&mut base.edge_interpolation_mode, &o.edge_interpolation_mode);
            }
            (AssetPayload::UvSet(base), AssetPayload::UvSet(o)) => {
                merge_opt(&mut base.name, &o.name);
                merge_opt(&mut base.label, &o.label);
                merge_count(&mut base.vertex_count, o.vertex_count);
                merge_count(&mut base.uv_count, o.uv_count);
            }
            (AssetPayload::Material(base), AssetPayload::Material(o)) => {
                merge_opt(&mut base.name, &o.name);
                merge_opt(&mut base.label, &o.label);
                merge_opt(&mut base.geometry, &o.geometry);
                merge_opt(&mut base.uv_set, &o.uv_set);
                merge_vec(&mut base.groups, &o.groups);
                merge_channels(&mut base.channels, &o.channels);
            }
            (AssetPayload::Modifier(base), AssetPayload::Modifier(o)) => {
                merge_opt(&mut base.name, &o.name);
                merge_opt(&mut base.label, &o.label);
                merge_opt(&mut base.modifier_type, &o.modifier_type);
                match (&mut base.channel, &o.channel) {
                    (Some(b), Some(o)) => b.merge(o),
                    (b @ None, Some(o)) => *b = Some(o.clone()),
                    _ => {}
                }
                merge_opt(&mut base.region, &o.region);
                merge_opt(&mut base.group, &o.group);
                merge_vec(&mut base.formula_outputs, &o.formula_outputs);
                merge_count(&mut base.morph_deltas, o.morph_deltas);
            }
            (AssetPayload::Image(base), AssetPayload::Image(o)) => {
                merge_opt(&mut base.name, &o.name);
                merge_opt(&mut base.map_gamma, &o.map_gamma);
                merge_vec(&mut base.maps, &o.maps);
            }
            (AssetPayload::Other(base), AssetPayload::Other(o)) => match (base, o) {
                (Value::Object(b), Value::Object(o)) => {
                    for (key, value) in o {
                        b.insert(key.clone(), value.clone());
                    }
                }
                (b, o) => *b = o.clone(),
            },
            _ => return false,
        }
        true
    }
}

#[inline]
fn merge_opt<T: Clone>(base: &mut Option<T>, overlay: &Option<T>) {
    if overlay.is_some() {
        base.clone_from(overlay);
    }
}

#[inline]
fn merge_count(base: &mut usize, overlay: usize) {
    if overlay != 0 {
        *base = overlay;
    }
}

#[inline]
fn merge_vec<T: Clone>(base: &mut Vec<T>, overlay: &[T]) {
    if !overlay.is_empty() {
        *base = overlay.to_vec();
    }
}

fn merge_channels(base: &mut Vec<Channel>, overlay: &[Channel]) {
    for channel in overlay {
        match base.iter_mut().find(|c| c.id == channel.id) {
            Some(existing) => existing.merge(channel),
            None => base.push(channel.clone()),
        }
    }
}
