//! JSON scene description loaded by the `scene` and `preview` commands.
//!
//! Rotations are written in degrees, the way the editor panels show them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context as _, bail};
use bevy::math::Vec3;
use serde::Deserialize;
use sr_scene::{
    AnimProperty, Axis, ItemRenderMode, LightSettings, ObjectKind, Orientation, SceneObject,
    SceneObjectId, TimelineCursor, display_name, insert_keyframe, parse_hex_color,
};

#[derive(Debug, Clone, Deserialize)]
pub struct SceneFile {
    pub objects: Vec<ObjectSpec>,
    /// Playhead position, if the timeline has one selected.
    #[serde(default)]
    pub current_frame: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindSpec {
    Block,
    Item,
    Character,
    Camera,
    Light,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightSpec {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub intensity: Option<f32>,
    #[serde(default)]
    pub distance: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyframeSpec {
    pub property: String,
    #[serde(default)]
    pub axis: Option<Axis>,
    pub frame: u32,
    pub value: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSpec {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub kind: KindSpec,
    /// Model id for blocks and items, file path for characters.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub position: Option<[f32; 3]>,
    #[serde(default)]
    pub rotation: Option<[f32; 3]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
    #[serde(default)]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub pivot_offset: Option<[f32; 3]>,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub render_mode: Option<ItemRenderMode>,
    #[serde(default)]
    pub use_generated: bool,
    #[serde(default)]
    pub light: Option<LightSpec>,
    #[serde(default)]
    pub keyframes: Vec<KeyframeSpec>,
}

impl SceneFile {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let scene: Self = serde_json::from_str(raw).context("parse scene json")?;
        let mut ids = HashSet::new();
        for object in &scene.objects {
            if !ids.insert(object.id) {
                bail!("duplicate object id {}", object.id);
            }
        }
        Ok(scene)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read scene '{}'", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in '{}'", path.display()))
    }

    pub fn cursor(&self) -> TimelineCursor {
        TimelineCursor {
            current_frame: self.current_frame,
        }
    }

    pub fn scene_objects(&self, item_render_mode: ItemRenderMode) -> anyhow::Result<Vec<SceneObject>> {
        self.objects
            .iter()
            .map(|spec| {
                spec.to_object(item_render_mode)
                    .with_context(|| format!("object {}", spec.id))
            })
            .collect()
    }
}

impl ObjectSpec {
    fn required_path(&self) -> anyhow::Result<String> {
        match self.path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => Ok(path.to_string()),
            _ => bail!("{:?} objects need a path", self.kind),
        }
    }

    pub fn to_object(&self, item_render_mode: ItemRenderMode) -> anyhow::Result<SceneObject> {
        let kind = match self.kind {
            KindSpec::Block => ObjectKind::Block {
                block_path: self.required_path()?,
            },
            KindSpec::Item => ObjectKind::Item {
                item_path: self.required_path()?,
                render_mode: self.render_mode.unwrap_or(item_render_mode),
                use_generated: self.use_generated,
            },
            KindSpec::Character => ObjectKind::Character {
                character_path: self.required_path()?,
            },
            KindSpec::Camera => ObjectKind::Camera,
            KindSpec::Light => ObjectKind::Light(self.light_settings()?),
        };

        let name = self.name.clone().unwrap_or_else(|| match &kind {
            ObjectKind::Block { block_path } => display_name(block_path),
            ObjectKind::Item { item_path, .. } => display_name(item_path),
            other => capitalized(other.label()),
        });
        let mut object = SceneObject::new(SceneObjectId(self.id), name, kind);

        if let Some(position) = self.position {
            object.position = Vec3::from(position);
        }
        if let Some(rotation) = self.rotation {
            object.rotation = Vec3::from(rotation.map(f32::to_radians));
        }
        if let Some(scale) = self.scale {
            object.scale = Vec3::from(scale);
        }
        if let Some(opacity) = self.opacity {
            object = object.with_opacity(opacity);
        }
        if let Some(pivot) = self.pivot_offset {
            object.pivot_offset = Vec3::from(pivot);
        }
        object.orientation = self.orientation;

        for key in &self.keyframes {
            let Some(property) = AnimProperty::from_name(&key.property) else {
                bail!("unknown keyframe property {:?}", key.property);
            };
            insert_keyframe(&mut object, property, key.axis, key.frame, key.value)?;
        }
        Ok(object)
    }

    fn light_settings(&self) -> anyhow::Result<LightSettings> {
        let mut settings = LightSettings::default();
        let Some(spec) = &self.light else {
            return Ok(settings);
        };
        if let Some(raw) = &spec.color {
            let Some(color) = parse_hex_color(raw) else {
                bail!("invalid light color {raw:?}");
            };
            settings.color = color;
        }
        if let Some(intensity) = spec.intensity {
            settings.intensity = intensity;
        }
        if let Some(distance) = spec.distance {
            settings.distance = distance.max(0.0);
        }
        Ok(settings)
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r##"{
        "current_frame": 12,
        "objects": [
            {"id": 1, "kind": "block", "path": "minecraft:block/furnace",
             "orientation": "east", "rotation": [0, 90, 0],
             "keyframes": [
                {"property": "position", "axis": "y", "frame": 20, "value": 2.0},
                {"property": "position", "axis": "y", "frame": 0, "value": 0.0},
                {"property": "opacity", "frame": 5, "value": 0.5}
             ]},
            {"id": 2, "kind": "item", "path": "item/apple", "use_generated": true},
            {"id": 3, "kind": "light", "light": {"color": "#ff8000", "distance": 8}},
            {"id": 4, "kind": "camera", "position": [0, 2, 5]},
            {"id": 5, "kind": "character", "name": "Steve", "path": "characters/steve.glb"}
        ]
    }"##;

    #[test]
    fn builds_scene_objects_with_defaults() {
        let scene = SceneFile::from_json(SCENE).unwrap();
        assert_eq!(scene.cursor().current_frame, Some(12));
        let objects = scene.scene_objects(ItemRenderMode::Plane).unwrap();
        assert_eq!(objects.len(), 5);

        let furnace = &objects[0];
        assert_eq!(furnace.name, "furnace");
        assert_eq!(furnace.orientation, Some(Orientation::East));
        assert_eq!(furnace.pivot_offset, Vec3::new(0.0, -0.5, 0.0));
        assert!((furnace.rotation.y - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        let keyframes = furnace.keyframes.as_ref().unwrap();
        assert_eq!(keyframes.frames(AnimProperty::Position, Some(Axis::Y)), &[0, 20]);
        assert_eq!(keyframes.value_at(AnimProperty::Opacity, None, 5), Some(0.5));

        match &objects[1].kind {
            ObjectKind::Item {
                render_mode,
                use_generated,
                ..
            } => {
                assert_eq!(*render_mode, ItemRenderMode::Plane);
                assert!(*use_generated);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(objects[1].name, "apple");

        match &objects[2].kind {
            ObjectKind::Light(light) => {
                assert_eq!(light.color, [1.0, 128.0 / 255.0, 0.0]);
                assert_eq!(light.intensity, 10.0);
                assert_eq!(light.distance, 8.0);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(objects[2].name, "Light");
        assert_eq!(objects[3].position, Vec3::new(0.0, 2.0, 5.0));
        assert_eq!(objects[3].pivot_offset, Vec3::ZERO);
        assert_eq!(objects[4].name, "Steve");
    }

    #[test]
    fn rejects_bad_objects() {
        let dup = r#"{"objects": [{"id": 1, "kind": "camera"}, {"id": 1, "kind": "camera"}]}"#;
        assert!(SceneFile::from_json(dup).is_err());

        let no_path = r#"{"objects": [{"id": 1, "kind": "block"}]}"#;
        let scene = SceneFile::from_json(no_path).unwrap();
        assert!(scene.scene_objects(ItemRenderMode::Voxel).is_err());

        let bad_axis = r#"{"objects": [{"id": 1, "kind": "camera",
            "keyframes": [{"property": "scale", "frame": 1, "value": 1}]}]}"#;
        let scene = SceneFile::from_json(bad_axis).unwrap();
        assert!(scene.scene_objects(ItemRenderMode::Voxel).is_err());

        let bad_color = r#"{"objects": [{"id": 1, "kind": "light", "light": {"color": "red"}}]}"#;
        let scene = SceneFile::from_json(bad_color).unwrap();
        assert!(scene.scene_objects(ItemRenderMode::Voxel).is_err());
    }

    #[test]
    fn bundled_demo_scene_loads() {
        let scene = SceneFile::from_json(include_str!("../scenes/demo.json")).unwrap();
        let objects = scene.scene_objects(ItemRenderMode::Voxel).unwrap();
        assert_eq!(objects.len(), 6);
        let camera = objects.iter().find(|o| o.kind == ObjectKind::Camera).unwrap();
        let frames = camera
            .keyframes
            .as_ref()
            .unwrap()
            .frames(AnimProperty::Position, Some(Axis::Z));
        assert_eq!(frames, &[0, 40]);
    }
}
