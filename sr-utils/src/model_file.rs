use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One parsed block/item model file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textures: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ModelElement>>,
}

impl ModelDescriptor {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelElement {
    pub from: [f32; 3],
    pub to: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faces: Option<HashMap<String, ModelFace>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<ElementRotation>,
}

impl ModelElement {
    pub fn face(&self, name: &str) -> Option<&ModelFace> {
        self.faces.as_ref().and_then(|faces| faces.get(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    /// Pixel-space box `[x1, y1, x2, y2]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<[f32; 4]>,
    /// Degrees, a multiple of 90.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRotation {
    /// Pivot in model space (0..16).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<[f32; 3]>,
    pub axis: Axis,
    #[serde(default)]
    pub angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "z" => Some(Self::Z),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vanilla_style_model() {
        let raw = r##"{
            "parent": "minecraft:block/block",
            "textures": { "particle": "#side", "side": "minecraft:block/furnace_side" },
            "elements": [{
                "from": [0, 0, 0],
                "to": [16, 8, 16],
                "rotation": { "origin": [8, 8, 8], "axis": "y", "angle": 45 },
                "faces": {
                    "north": { "texture": "#side", "uv": [0, 8, 16, 16], "cullface": "north" },
                    "up": { "texture": "#side", "rotation": 90 }
                }
            }]
        }"##;
        let model = ModelDescriptor::from_json(raw).unwrap();
        assert_eq!(model.parent.as_deref(), Some("minecraft:block/block"));
        let elements = model.elements.unwrap();
        assert_eq!(elements[0].to, [16.0, 8.0, 16.0]);
        let rotation = elements[0].rotation.as_ref().unwrap();
        assert_eq!(rotation.axis, Axis::Y);
        assert_eq!(rotation.angle, 45.0);
        assert_eq!(elements[0].face("north").unwrap().uv, Some([0.0, 8.0, 16.0, 16.0]));
        assert_eq!(elements[0].face("up").unwrap().rotation, Some(90));
        assert!(elements[0].face("down").is_none());
    }

    #[test]
    fn empty_model_is_valid() {
        let model = ModelDescriptor::from_json("{}").unwrap();
        assert_eq!(model, ModelDescriptor::default());
    }
}
