use std::fmt;

use bevy::prelude::Vec3;
use serde::{Deserialize, Serialize};

use crate::keyframes::Keyframes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneObjectId(pub u64);

impl fmt::Display for SceneObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemRenderMode {
    #[default]
    Voxel,
    Plane,
}

/// Cardinal or vertical facing applied to the innermost visual group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Orientation {
    /// `(pitch, yaw)` in radians. North is the identity.
    pub fn pitch_yaw(self) -> (f32, f32) {
        use std::f32::consts::{FRAC_PI_2, PI};
        match self {
            Self::North => (0.0, 0.0),
            Self::South => (0.0, PI),
            Self::East => (0.0, FRAC_PI_2),
            Self::West => (0.0, -FRAC_PI_2),
            Self::Up => (-FRAC_PI_2, 0.0),
            Self::Down => (FRAC_PI_2, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSettings {
    pub color: [f32; 3],
    pub intensity: f32,
    /// Zero means unlimited range.
    pub distance: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 10.0,
            distance: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Block {
        block_path: String,
    },
    Item {
        item_path: String,
        render_mode: ItemRenderMode,
        /// Render as a flat icon even when the model has geometry.
        use_generated: bool,
    },
    Character {
        character_path: String,
    },
    Camera,
    Light(LightSettings),
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Block { .. } => "block",
            Self::Item { .. } => "item",
            Self::Character { .. } => "character",
            Self::Camera => "camera",
            Self::Light(_) => "light",
        }
    }

    pub fn default_pivot_offset(&self) -> Vec3 {
        match self {
            Self::Block { .. } | Self::Item { .. } => Vec3::new(0.0, -0.5, 0.0),
            Self::Character { .. } | Self::Camera | Self::Light(_) => Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: SceneObjectId,
    pub name: String,
    pub kind: ObjectKind,
    pub position: Vec3,
    /// Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub opacity: f32,
    pub pivot_offset: Vec3,
    pub orientation: Option<Orientation>,
    pub keyframes: Option<Keyframes>,
}

impl SceneObject {
    /// Opacity and pivot offset are filled here so rendering never has to default them.
    pub fn new(id: SceneObjectId, name: impl Into<String>, kind: ObjectKind) -> Self {
        let pivot_offset = kind.default_pivot_offset();
        Self {
            id,
            name: name.into(),
            kind,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            opacity: 1.0,
            pivot_offset,
            orientation: None,
            keyframes: None,
        }
    }

    pub fn block(id: u64, block_path: impl Into<String>) -> Self {
        let block_path = block_path.into();
        let name = display_name(&block_path);
        Self::new(SceneObjectId(id), name, ObjectKind::Block { block_path })
    }

    pub fn item(id: u64, item_path: impl Into<String>) -> Self {
        let item_path = item_path.into();
        let name = display_name(&item_path);
        Self::new(
            SceneObjectId(id),
            name,
            ObjectKind::Item {
                item_path,
                render_mode: ItemRenderMode::default(),
                use_generated: false,
            },
        )
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

/// Last path segment without extension: `minecraft:block/stone.json` -> `stone`.
pub fn display_name(path: &str) -> String {
    let stem = path.rsplit(['/', ':']).next().unwrap_or(path);
    stem.strip_suffix(".json").unwrap_or(stem).to_string()
}

/// Parses `#rrggbb` (or `rrggbb`) into linear-ish 0..1 components.
pub fn parse_hex_color(raw: &str) -> Option<[f32; 3]> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .ok()
            .map(|v| v as f32 / 255.0)
    };
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}
