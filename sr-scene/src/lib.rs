//! Editor-side scene objects and the keyframe store that animates them.

pub mod keyframes;
pub mod object;

pub use keyframes::{
    AnimProperty, FrameTrack, KeyframeError, Keyframes, TimelineCursor, insert_keyframe,
    insert_keyframe_at_current_frame,
};
pub use object::{
    ItemRenderMode, LightSettings, ObjectKind, Orientation, SceneObject, SceneObjectId,
    display_name, parse_hex_color,
};
pub use sr_utils::Axis;
