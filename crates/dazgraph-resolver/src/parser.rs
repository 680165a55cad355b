//! DSON file parsing.

use std::path::{Path, PathBuf};

use dazgraph_asset::{
    AssetError, AssetKind, AssetPayload, AssetRecord, Channel, FileInfo, GeometryPayload,
    ImageMap, ImagePayload, MaterialPayload, ModifierPayload, NodePayload, Result, UvSetPayload,
};
use dazgraph_url::{join, NormalizedRef, Normalizer};
use log::debug;
use serde_json::Value;

use crate::dson::{
    ChannelEntry, DsonFile, GeometryEntry, ImageEntry, MaterialEntry, ModifierEntry, NodeEntry,
    UvSetEntry,
};

/// A reference from one file to an asset defined elsewhere, with values
/// that override the referenced asset for this occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceLink {
    /// Local id of the occurrence in the referencing file.
    pub id: Option<String>,
    /// Reference to the shared asset, as written in the file.
    pub url: String,
    /// Expected kind of the shared asset, `Node` standing for any node kind.
    /// `None` accepts whatever the reference names.
    pub kind: Option<AssetKind>,
    /// Parent reference, as written in the file.
    pub parent: Option<String>,
    /// Values overriding the shared asset's payload.
    pub overlay: AssetPayload,
}

/// Everything one file contributes to a session.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    /// Key the file is registered under.
    pub file_ref: NormalizedRef,
    /// `asset_info.id`, when it differs from how the file was reached.
    pub declared_id: Option<NormalizedRef>,
    /// The file's top-level record.
    pub file_record: AssetRecord,
    /// Library definitions.
    pub assets: Vec<AssetRecord>,
    /// Scene occurrences of assets, in file order.
    pub instances: Vec<InstanceLink>,
}

/// Turns a file on disk into the assets it defines.
///
/// Parsing must not touch any session: the resolver registers what the
/// parser returns. This keeps parsing free to run on several threads.
pub trait FileParser {
    fn parse(&self, path: &Path, file_ref: &NormalizedRef, normalizer: &Normalizer)
        -> Result<ParsedFile>;
}

impl<T: FileParser + ?Sized> FileParser for &T {
    fn parse(
        &self,
        path: &Path,
        file_ref: &NormalizedRef,
        normalizer: &Normalizer,
    ) -> Result<ParsedFile> {
        (**self).parse(path, file_ref, normalizer)
    }
}

/// Parser for DSON (`.duf`/`.dsf`) files, gzipped or plain.
#[derive(Debug, Clone, Copy, Default)]
pub struct DsonParser;

impl DsonParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an in-memory DSON document.
    pub fn parse_bytes(
        &self,
        data: &[u8],
        path: &Path,
        file_ref: &NormalizedRef,
        normalizer: &Normalizer,
    ) -> Result<ParsedFile> {
        let document: DsonFile = dazgraph_common::read_dson_bytes(data)?;
        Decoder {
            file_ref,
            normalizer,
        }
        .decode(document, path)
    }
}

impl FileParser for DsonParser {
    fn parse(
        &self,
        path: &Path,
        file_ref: &NormalizedRef,
        normalizer: &Normalizer,
    ) -> Result<ParsedFile> {
        let document: DsonFile = dazgraph_common::read_dson(path)?;
        Decoder {
            file_ref,
            normalizer,
        }
        .decode(document, path)
    }
}

/// Converts raw DSON sections into records for one file.
struct Decoder<'a> {
    file_ref: &'a NormalizedRef,
    normalizer: &'a Normalizer,
}

impl Decoder<'_> {
    fn decode(&self, document: DsonFile, path: &Path) -> Result<ParsedFile> {
        let info = document.asset_info.ok_or_else(|| AssetError::InvalidFile {
            path: path.to_path_buf(),
            reason: "missing asset_info".into(),
        })?;

        let declared_id = info
            .id
            .as_deref()
            .map(|id| self.normalizer.normalize(id))
            .filter(|id| id != self.file_ref);

        let file_record = AssetRecord::new(
            self.file_ref.clone(),
            AssetKind::File,
            self.file_ref.clone(),
            AssetPayload::File(FileInfo {
                asset_type: info.asset_type,
                file_version: document.file_version,
                revision: info.revision,
                modified: info.modified,
                author: info.contributor.and_then(|c| c.author),
            }),
        );

        let mut assets = Vec::new();
        let mut instances = Vec::new();

        for entry in document.geometry_library {
            self.push_geometry(entry, None, &mut assets, &mut instances);
        }
        for entry in document.node_library {
            self.push_node(entry, &mut assets, &mut instances);
        }
        for entry in document.uv_set_library {
            self.push_uv_set(entry, &mut assets, &mut instances);
        }
        for entry in document.modifier_library {
            self.push_modifier(entry, &mut assets, &mut instances);
        }
        for entry in document.image_library {
            self.push_image(entry, &mut assets);
        }
        for entry in document.material_library {
            self.push_material(entry, &mut assets, &mut instances);
        }

        if let Some(scene) = document.scene {
            for entry in scene.nodes {
                self.push_node(entry, &mut assets, &mut instances);
            }
            for entry in scene.uvs {
                self.push_uv_set(entry, &mut assets, &mut instances);
            }
            for entry in scene.modifiers {
                self.push_modifier(entry, &mut assets, &mut instances);
            }
            for entry in scene.materials {
                self.push_material(entry, &mut assets, &mut instances);
            }
            for entry in scene.images {
                self.push_image(entry, &mut assets);
            }
        }

        debug!(
            "{}: {} assets, {} instances",
            self.file_ref,
            assets.len(),
            instances.len()
        );

        Ok(ParsedFile {
            path: path.to_path_buf(),
            file_ref: self.file_ref.clone(),
            declared_id,
            file_record,
            assets,
            instances,
        })
    }

    fn qualify(&self, raw: &str) -> NormalizedRef {
        join(self.file_ref, &self.normalizer.normalize(raw))
    }

    fn record(
        &self,
        id: &str,
        kind: AssetKind,
        parent: Option<&str>,
        payload: AssetPayload,
    ) -> Option<AssetRecord> {
        if id.is_empty() {
            debug!("{}: skipping {} without id", self.file_ref, kind);
            return None;
        }
        let identity = self.file_ref.with_fragment(self.normalizer, id);
        Some(
            AssetRecord::new(identity, kind, self.file_ref.clone(), payload)
                .with_parent(parent.map(|p| self.qualify(p))),
        )
    }

    fn link(
        id: &str,
        url: String,
        kind: Option<AssetKind>,
        parent: Option<String>,
        overlay: AssetPayload,
    ) -> InstanceLink {
        InstanceLink {
            id: (!id.is_empty()).then(|| id.to_string()),
            url,
            kind,
            parent,
            overlay,
        }
    }

    fn channel(&self, entry: ChannelEntry) -> Channel {
        Channel {
            id: entry.id,
            channel_type: entry.channel_type,
            label: entry.label,
            value: entry.value,
            current_value: entry.current_value,
            min: entry.min,
            max: entry.max,
            image: None,
        }
    }

    fn channels(&self, entries: Vec<ChannelEntry>) -> Vec<Channel> {
        entries.into_iter().map(|e| self.channel(e)).collect()
    }

    fn push_node(
        &self,
        entry: NodeEntry,
        assets: &mut Vec<AssetRecord>,
        instances: &mut Vec<InstanceLink>,
    ) {
        let kind = AssetKind::from_node_type(entry.node_type.as_deref());
        let payload = AssetPayload::Node(NodePayload {
            name: entry.name,
            label: entry.label,
            node_type: entry.node_type,
            rotation_order: entry.rotation_order,
            inherits_scale: entry.inherits_scale,
            center_point: self.channels(entry.center_point),
            end_point: self.channels(entry.end_point),
            orientation: self.channels(entry.orientation),
            rotation: self.channels(entry.rotation),
            translation: self.channels(entry.translation),
            scale: self.channels(entry.scale),
            general_scale: entry.general_scale.map(|c| self.channel(c)),
        });

        let owner = (!entry.id.is_empty()).then(|| format!("#{}", entry.id));
        match entry.url {
            Some(url) => instances.push(Self::link(
                &entry.id,
                url,
                Some(AssetKind::Node),
                entry.parent,
                payload,
            )),
            None => assets.extend(self.record(&entry.id, kind, entry.parent.as_deref(), payload)),
        }

        for geometry in entry.geometries {
            self.push_geometry(geometry, owner.clone(), assets, instances);
        }
    }

    fn push_geometry(
        &self,
        entry: GeometryEntry,
        parent: Option<String>,
        assets: &mut Vec<AssetRecord>,
        instances: &mut Vec<InstanceLink>,
    ) {
        let payload = AssetPayload::Geometry(GeometryPayload {
            name: entry.name,
            label: entry.label,
            geometry_type: entry.geometry_type,
            vertex_count: entry.vertices.map(|v| v.count).unwrap_or(0),
            polygon_count: entry.polylist.map(|p| p.count).unwrap_or(0),
            polygon_groups: entry.polygon_groups.map(|g| g.values).unwrap_or_default(),
            material_groups: entry
                .polygon_material_groups
                .map(|g| g.values)
                .unwrap_or_default(),
            default_uv_set: entry.default_uv_set.as_deref().map(|r| self.qualify(r)),
            edge_interpolation_mode: entry.edge_interpolation_mode,
        });

        match entry.url {
            Some(url) => instances.push(Self::link(
                &entry.id,
                url,
                Some(AssetKind::Geometry),
                parent,
                payload,
            )),
            None => assets.extend(self.record(
                &entry.id,
                AssetKind::Geometry,
                parent.as_deref(),
                payload,
            )),
        }
    }

    fn push_uv_set(
        &self,
        entry: UvSetEntry,
        assets: &mut Vec<AssetRecord>,
        instances: &mut Vec<InstanceLink>,
    ) {
        let payload = AssetPayload::UvSet(UvSetPayload {
            name: entry.name,
            label: entry.label,
            vertex_count: entry.vertex_count,
            uv_count: entry.uvs.map(|u| u.count).unwrap_or(0),
        });

        match entry.url {
            Some(url) => instances.push(Self::link(
                &entry.id,
                url,
                Some(AssetKind::UvSet),
                entry.parent,
                payload,
            )),
            None => assets.extend(self.record(
                &entry.id,
                AssetKind::UvSet,
                entry.parent.as_deref(),
                payload,
            )),
        }
    }

    fn push_modifier(
        &self,
        entry: ModifierEntry,
        assets: &mut Vec<AssetRecord>,
        instances: &mut Vec<InstanceLink>,
    ) {
        let modifier_type = if entry.morph.is_some() {
            Some("morph".to_string())
        } else if entry.skin.is_some() {
            Some("skin".to_string())
        } else if entry.channel.is_some() {
            Some("channel".to_string())
        } else {
            None
        };

        let payload = AssetPayload::Modifier(ModifierPayload {
            name: entry.name,
            label: entry.label,
            modifier_type,
            channel: entry.channel.map(|c| self.channel(c)),
            region: entry.region,
            group: entry.group,
            formula_outputs: entry
                .formulas
                .iter()
                .filter_map(|f| f.output.as_deref())
                .map(|output| self.qualify(strip_output_label(output)))
                .collect(),
            morph_deltas: entry
                .morph
                .and_then(|m| m.deltas)
                .map(|d| d.count)
                .unwrap_or(0),
        });

        match entry.url {
            Some(url) => instances.push(Self::link(
                &entry.id,
                url,
                Some(AssetKind::Modifier),
                entry.parent,
                payload,
            )),
            None => assets.extend(self.record(
                &entry.id,
                AssetKind::Modifier,
                entry.parent.as_deref(),
                payload,
            )),
        }
    }

    fn push_image(&self, entry: ImageEntry, assets: &mut Vec<AssetRecord>) {
        let payload = AssetPayload::Image(ImagePayload {
            name: entry.name,
            map_gamma: entry.map_gamma,
            maps: entry
                .map
                .into_iter()
                .map(|m| ImageMap {
                    url: m.url.as_deref().map(|u| self.normalizer.normalize(u)),
                    label: m.label,
                    operation: m.operation,
                    transparency: m.transparency,
                    invert: m.invert,
                })
                .collect(),
        });
        if entry.url.is_some() {
            debug!("{}: image {} has a url, defining it locally", self.file_ref, entry.id);
        }
        assets.extend(self.record(&entry.id, AssetKind::Image, None, payload));
    }

    fn push_material(
        &self,
        entry: MaterialEntry,
        assets: &mut Vec<AssetRecord>,
        instances: &mut Vec<InstanceLink>,
    ) {
        let channels = entry
            .properties
            .iter()
            .filter_map(|(key, value)| self.material_channel(key, value))
            .collect();

        let payload = AssetPayload::Material(MaterialPayload {
            name: entry.name,
            label: entry.label,
            geometry: entry.geometry.as_deref().map(|r| self.qualify(r)),
            uv_set: entry.uv_set.as_deref().map(|r| self.qualify(r)),
            groups: entry.groups,
            channels,
        });

        match entry.url {
            Some(url) => instances.push(Self::link(
                &entry.id,
                url,
                Some(AssetKind::Material),
                None,
                payload,
            )),
            None => assets.extend(self.record(&entry.id, AssetKind::Material, None, payload)),
        }
    }

    fn material_channel(&self, key: &str, value: &Value) -> Option<Channel> {
        let raw = value.get("channel")?;
        let entry: ChannelEntry = serde_json::from_value(raw.clone()).ok()?;
        let mut channel = self.channel(entry);
        channel.id = key.to_string();
        channel.image = value
            .get("image")
            .and_then(Value::as_str)
            .map(|r| self.qualify(r));
        Some(channel)
    }
}

/// Formula outputs are written `label:url`; keep the url.
fn strip_output_label(output: &str) -> &str {
    match output.split_once(':') {
        Some((_, rest)) if rest.starts_with('/') || rest.starts_with('#') => rest,
        _ => output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    const FIGURE: &str = r##"{
        "file_version": "0.6.0.0",
        "asset_info": {
            "id": "/data/DAZ%203D/Genesis%203/Female/Genesis3Female.dsf",
            "type": "figure",
            "contributor": { "author": "DAZ 3D" },
            "revision": "1.0"
        },
        "geometry_library": [{
            "id": "geometry",
            "name": "Genesis3Female",
            "type": "polygon_mesh",
            "vertices": { "count": 3, "values": [[0,0,0],[1,0,0],[0,1,0]] },
            "polylist": { "count": 1, "values": [[0,0,0,1,2]] },
            "polygon_material_groups": { "count": 1, "values": ["Torso"] },
            "default_uv_set": "/data/DAZ%203D/Genesis%203/Female/UV%20Sets/DAZ/Base/Base%20Female.dsf#Base%20Female"
        }],
        "node_library": [
            { "id": "Genesis3Female", "name": "Genesis3Female", "type": "figure" },
            { "id": "hip", "name": "hip", "type": "bone", "parent": "#Genesis3Female",
              "rotation": [ { "id": "x", "type": "float", "value": 0 } ] }
        ],
        "modifier_library": [{
            "id": "pJCMAbdomenFwd_35",
            "parent": "#Genesis3Female",
            "channel": { "id": "value", "type": "float", "value": 0, "min": 0, "max": 1 },
            "formulas": [ { "output": "Genesis3Female:#pJCMAbdomenFwd_35?value" } ],
            "morph": { "deltas": { "count": 2, "values": [] } }
        }],
        "image_library": [{
            "id": "base-diffuse",
            "map_gamma": 0,
            "map": [ { "url": "/Runtime/Textures/DAZ/G3F/Torso D.jpg", "label": "Torso" } ]
        }],
        "material_library": [{
            "id": "Torso",
            "geometry": "#geometry",
            "uv_set": "#uv",
            "groups": ["Torso"],
            "diffuse": { "channel": { "id": "Diffuse Color", "type": "color", "value": [1,1,1] }, "image": "#base-diffuse" }
        }]
    }"##;

    fn parse(text: &[u8], file: &str) -> ParsedFile {
        let normalizer = Normalizer::new(true);
        let file_ref = normalizer.normalize(file);
        DsonParser::new()
            .parse_bytes(text, Path::new(file), &file_ref, &normalizer)
            .unwrap()
    }

    #[test]
    fn test_library_sections() {
        let parsed = parse(FIGURE.as_bytes(), "/data/DAZ 3D/Genesis 3/Female/Genesis3Female.dsf");

        assert_eq!(parsed.declared_id, None);
        assert_eq!(parsed.file_record.kind, AssetKind::File);
        assert!(parsed.instances.is_empty());

        let kinds: Vec<AssetKind> = parsed.assets.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AssetKind::Geometry,
                AssetKind::Figure,
                AssetKind::Bone,
                AssetKind::Modifier,
                AssetKind::Image,
                AssetKind::Material,
            ]
        );

        let hip = &parsed.assets[2];
        assert_eq!(
            hip.identity.as_str(),
            "/data/DAZ%203D/Genesis%203/Female/Genesis3Female.dsf#hip"
        );
        assert_eq!(
            hip.parent.as_ref().map(|p| p.as_str()),
            Some("/data/DAZ%203D/Genesis%203/Female/Genesis3Female.dsf#Genesis3Female")
        );
    }

    #[test]
    fn test_payload_decoding() {
        let parsed = parse(FIGURE.as_bytes(), "/data/DAZ 3D/Genesis 3/Female/Genesis3Female.dsf");

        let AssetPayload::Geometry(geometry) = &parsed.assets[0].payload else {
            panic!("expected geometry");
        };
        assert_eq!(geometry.vertex_count, 3);
        assert_eq!(geometry.polygon_count, 1);
        assert_eq!(geometry.material_groups, vec!["Torso".to_string()]);

        let AssetPayload::Modifier(modifier) = &parsed.assets[3].payload else {
            panic!("expected modifier");
        };
        assert_eq!(modifier.modifier_type.as_deref(), Some("morph"));
        assert_eq!(modifier.morph_deltas, 2);
        assert_eq!(
            modifier.formula_outputs[0].as_str(),
            "/data/DAZ%203D/Genesis%203/Female/Genesis3Female.dsf#pJCMAbdomenFwd_35?value"
        );

        let AssetPayload::Material(material) = &parsed.assets[5].payload else {
            panic!("expected material");
        };
        assert_eq!(material.channels.len(), 1);
        assert_eq!(material.channels[0].id, "diffuse");
        assert_eq!(
            material.channels[0].image.as_ref().map(|r| r.fragment()),
            Some(Some("base-diffuse"))
        );
    }

    #[test]
    fn test_scene_instances() {
        let scene = br##"{
            "asset_info": { "id": "/Scenes/test.duf", "type": "scene" },
            "scene": {
                "nodes": [{
                    "id": "Genesis3Female",
                    "url": "/data/DAZ%203D/Genesis%203/Female/Genesis3Female.dsf#Genesis3Female",
                    "label": "Victoria",
                    "translation": [ { "id": "x", "current_value": 10 } ],
                    "geometries": [{
                        "id": "Genesis3Female-1",
                        "url": "/data/DAZ%203D/Genesis%203/Female/Genesis3Female.dsf#geometry"
                    }]
                }],
                "materials": [{
                    "url": "#Torso",
                    "geometry": "#Genesis3Female-1",
                    "diffuse": { "channel": { "id": "Diffuse Color", "current_value": [1,0,0] } }
                }]
            }
        }"##;
        let parsed = parse(scene, "/Scenes/test.duf");

        assert!(parsed.assets.is_empty());
        assert_eq!(parsed.instances.len(), 3);

        let node = &parsed.instances[0];
        assert_eq!(node.id.as_deref(), Some("Genesis3Female"));
        assert_eq!(node.kind, Some(AssetKind::Node));

        let geometry = &parsed.instances[1];
        assert_eq!(geometry.kind, Some(AssetKind::Geometry));
        assert_eq!(geometry.parent.as_deref(), Some("#Genesis3Female"));

        let material = &parsed.instances[2];
        assert_eq!(material.id, None);
        assert_eq!(material.url, "#Torso");
    }

    #[test]
    fn test_gzipped_file() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(FIGURE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let parsed = parse(&compressed, "/data/other/place.dsf");
        assert_eq!(
            parsed.declared_id.as_ref().map(|d| d.as_str()),
            Some("/data/DAZ%203D/Genesis%203/Female/Genesis3Female.dsf")
        );
        assert_eq!(parsed.assets.len(), 6);
    }

    #[test]
    fn test_missing_asset_info() {
        let normalizer = Normalizer::new(true);
        let file_ref = normalizer.normalize("/data/x.dsf");
        let result = DsonParser::new().parse_bytes(b"{}", Path::new("x.dsf"), &file_ref, &normalizer);
        assert!(matches!(result, Err(AssetError::InvalidFile { .. })));
    }

    #[test]
    fn test_strip_output_label() {
        assert_eq!(strip_output_label("hip:/data/a.dsf#hip?rotation/x"), "/data/a.dsf#hip?rotation/x");
        assert_eq!(strip_output_label("Genesis3Female:#x?value"), "#x?value");
        assert_eq!(strip_output_label("#x?value"), "#x?value");
    }
}
