//! Sparse per-property animation curves recorded on scene objects.
//!
//! Frames and values are stored together per track so the frame list and the
//! value map can never disagree. Interpolation and playback live elsewhere.

use std::collections::BTreeMap;
use std::fmt;

use bevy::prelude::Resource;
use sr_utils::Axis;
use thiserror::Error;
use tracing::debug;

use crate::object::SceneObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimProperty {
    Position,
    Rotation,
    Scale,
    Opacity,
}

impl AnimProperty {
    pub const ALL: [AnimProperty; 4] = [
        AnimProperty::Position,
        AnimProperty::Rotation,
        AnimProperty::Scale,
        AnimProperty::Opacity,
    ];

    /// Vector properties are keyed per axis, scalar ones by frame only.
    pub const fn is_vector(self) -> bool {
        !matches!(self, Self::Opacity)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
            Self::Opacity => "opacity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|prop| prop.name() == name)
    }
}

impl fmt::Display for AnimProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyframeError {
    #[error("[keyframes] {0} is a vector property and needs an axis")]
    MissingAxis(AnimProperty),

    #[error("[keyframes] {property} is scalar, axis {axis:?} does not apply")]
    UnexpectedAxis { property: AnimProperty, axis: Axis },
}

fn check_axis(property: AnimProperty, axis: Option<Axis>) -> Result<(), KeyframeError> {
    match (property.is_vector(), axis) {
        (true, None) => Err(KeyframeError::MissingAxis(property)),
        (false, Some(axis)) => Err(KeyframeError::UnexpectedAxis { property, axis }),
        _ => Ok(()),
    }
}

/// Ascending, duplicate-free frames plus the value recorded at each one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTrack {
    frames: Vec<u32>,
    values: BTreeMap<u32, f32>,
}

impl FrameTrack {
    /// Last write wins at an existing frame.
    pub fn insert(&mut self, frame: u32, value: f32) {
        if let Err(pos) = self.frames.binary_search(&frame) {
            self.frames.insert(pos, frame);
        }
        self.values.insert(frame, value);
    }

    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    pub fn value_at(&self, frame: u32) -> Option<f32> {
        self.values.get(&frame).copied()
    }

    pub fn values(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.values.iter().map(|(frame, value)| (*frame, *value))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyframes {
    position: [FrameTrack; 3],
    rotation: [FrameTrack; 3],
    scale: [FrameTrack; 3],
    opacity: FrameTrack,
}

impl Keyframes {
    pub fn track(
        &self,
        property: AnimProperty,
        axis: Option<Axis>,
    ) -> Result<&FrameTrack, KeyframeError> {
        check_axis(property, axis)?;
        Ok(match (property, axis) {
            (AnimProperty::Position, Some(axis)) => &self.position[axis.index()],
            (AnimProperty::Rotation, Some(axis)) => &self.rotation[axis.index()],
            (AnimProperty::Scale, Some(axis)) => &self.scale[axis.index()],
            _ => &self.opacity,
        })
    }

    fn track_mut(
        &mut self,
        property: AnimProperty,
        axis: Option<Axis>,
    ) -> Result<&mut FrameTrack, KeyframeError> {
        check_axis(property, axis)?;
        Ok(match (property, axis) {
            (AnimProperty::Position, Some(axis)) => &mut self.position[axis.index()],
            (AnimProperty::Rotation, Some(axis)) => &mut self.rotation[axis.index()],
            (AnimProperty::Scale, Some(axis)) => &mut self.scale[axis.index()],
            _ => &mut self.opacity,
        })
    }

    pub fn frames(&self, property: AnimProperty, axis: Option<Axis>) -> &[u32] {
        self.track(property, axis)
            .map(FrameTrack::frames)
            .unwrap_or(&[])
    }

    pub fn value_at(&self, property: AnimProperty, axis: Option<Axis>, frame: u32) -> Option<f32> {
        self.track(property, axis).ok()?.value_at(frame)
    }

    pub fn is_empty(&self) -> bool {
        self.position
            .iter()
            .chain(&self.rotation)
            .chain(&self.scale)
            .chain(std::iter::once(&self.opacity))
            .all(FrameTrack::is_empty)
    }
}

impl SceneObject {
    /// Current live value of an animatable property.
    pub fn property_value(
        &self,
        property: AnimProperty,
        axis: Option<Axis>,
    ) -> Result<f32, KeyframeError> {
        check_axis(property, axis)?;
        let vector = match property {
            AnimProperty::Position => self.position,
            AnimProperty::Rotation => self.rotation,
            AnimProperty::Scale => self.scale,
            AnimProperty::Opacity => return Ok(self.opacity),
        };
        Ok(match axis {
            Some(Axis::X) => vector.x,
            Some(Axis::Y) => vector.y,
            _ => vector.z,
        })
    }
}

/// Frame under the timeline playhead, injected by whoever owns the timeline.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineCursor {
    pub current_frame: Option<u32>,
}

impl TimelineCursor {
    pub fn at(frame: u32) -> Self {
        Self {
            current_frame: Some(frame),
        }
    }
}

/// Records `value` at `frame`; the object's keyframe container is created on first use.
pub fn insert_keyframe(
    object: &mut SceneObject,
    property: AnimProperty,
    axis: Option<Axis>,
    frame: u32,
    value: f32,
) -> Result<(), KeyframeError> {
    check_axis(property, axis)?;
    let keyframes = object.keyframes.get_or_insert_with(Keyframes::default);
    keyframes.track_mut(property, axis)?.insert(frame, value);
    debug!(
        "keyframe {} {property}{} @{frame} = {value}",
        object.id,
        axis.map(|a| format!(".{a:?}").to_lowercase())
            .unwrap_or_default()
    );
    Ok(())
}

/// Keys the property's live value at the cursor. Returns `false` when no frame is selected.
pub fn insert_keyframe_at_current_frame(
    cursor: &TimelineCursor,
    object: &mut SceneObject,
    property: AnimProperty,
    axis: Option<Axis>,
) -> Result<bool, KeyframeError> {
    let value = object.property_value(property, axis)?;
    let Some(frame) = cursor.current_frame else {
        return Ok(false);
    };
    insert_keyframe(object, property, axis, frame, value)?;
    Ok(true)
}

#[cfg(test)]
mod tests;
