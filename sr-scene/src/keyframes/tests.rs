use bevy::prelude::Vec3;
use sr_utils::Axis;

use super::{
    AnimProperty, KeyframeError, TimelineCursor, insert_keyframe, insert_keyframe_at_current_frame,
};
use crate::object::SceneObject;

#[test]
fn frames_stay_sorted_and_unique() {
    let mut obj = SceneObject::block(1, "block/stone");
    insert_keyframe(&mut obj, AnimProperty::Position, Some(Axis::X), 10, 1.0).unwrap();
    insert_keyframe(&mut obj, AnimProperty::Position, Some(Axis::X), 5, 0.5).unwrap();

    let keyframes = obj.keyframes.as_ref().unwrap();
    assert_eq!(keyframes.frames(AnimProperty::Position, Some(Axis::X)), &[5, 10]);
    assert_eq!(
        keyframes.value_at(AnimProperty::Position, Some(Axis::X), 5),
        Some(0.5)
    );
    assert_eq!(
        keyframes.value_at(AnimProperty::Position, Some(Axis::X), 10),
        Some(1.0)
    );

    insert_keyframe(&mut obj, AnimProperty::Position, Some(Axis::X), 10, 3.0).unwrap();
    let keyframes = obj.keyframes.as_ref().unwrap();
    assert_eq!(keyframes.frames(AnimProperty::Position, Some(Axis::X)), &[5, 10]);
    assert_eq!(
        keyframes.value_at(AnimProperty::Position, Some(Axis::X), 10),
        Some(3.0)
    );
}

#[test]
fn container_is_created_lazily_with_every_track() {
    let mut obj = SceneObject::item(2, "item/apple");
    assert!(obj.keyframes.is_none());

    insert_keyframe(&mut obj, AnimProperty::Scale, Some(Axis::Z), 0, 2.0).unwrap();
    let keyframes = obj.keyframes.as_ref().unwrap();
    assert!(!keyframes.is_empty());
    for prop in [AnimProperty::Position, AnimProperty::Rotation, AnimProperty::Scale] {
        for axis in Axis::ALL {
            assert!(keyframes.track(prop, Some(axis)).is_ok());
        }
    }
    assert!(keyframes.track(AnimProperty::Opacity, None).unwrap().is_empty());
    assert!(keyframes.frames(AnimProperty::Scale, Some(Axis::X)).is_empty());
    assert_eq!(keyframes.frames(AnimProperty::Scale, Some(Axis::Z)), &[0]);
}

#[test]
fn opacity_is_a_scalar_track() {
    let mut obj = SceneObject::block(3, "block/glass");
    insert_keyframe(&mut obj, AnimProperty::Opacity, None, 20, 0.25).unwrap();
    insert_keyframe(&mut obj, AnimProperty::Opacity, None, 4, 1.0).unwrap();

    let track = obj
        .keyframes
        .as_ref()
        .unwrap()
        .track(AnimProperty::Opacity, None)
        .unwrap();
    assert_eq!(track.frames(), &[4, 20]);
    let values: Vec<_> = track.values().collect();
    assert_eq!(values, vec![(4, 1.0), (20, 0.25)]);
}

#[test]
fn axis_mismatch_is_rejected_without_touching_the_object() {
    let mut obj = SceneObject::block(4, "block/stone");
    assert_eq!(
        insert_keyframe(&mut obj, AnimProperty::Rotation, None, 1, 0.0),
        Err(KeyframeError::MissingAxis(AnimProperty::Rotation))
    );
    assert!(matches!(
        insert_keyframe(&mut obj, AnimProperty::Opacity, Some(Axis::Y), 1, 0.0),
        Err(KeyframeError::UnexpectedAxis { .. })
    ));
    assert!(obj.keyframes.is_none());
}

#[test]
fn current_frame_insertion_reads_live_values() {
    let mut obj = SceneObject::block(5, "block/stone");
    obj.position = Vec3::new(1.0, 2.0, 3.0);
    obj.opacity = 0.75;

    let cursor = TimelineCursor::at(12);
    assert!(
        insert_keyframe_at_current_frame(&cursor, &mut obj, AnimProperty::Position, Some(Axis::Y))
            .unwrap()
    );
    assert!(
        insert_keyframe_at_current_frame(&cursor, &mut obj, AnimProperty::Opacity, None).unwrap()
    );

    let keyframes = obj.keyframes.as_ref().unwrap();
    assert_eq!(
        keyframes.value_at(AnimProperty::Position, Some(Axis::Y), 12),
        Some(2.0)
    );
    assert_eq!(keyframes.value_at(AnimProperty::Opacity, None, 12), Some(0.75));
}

#[test]
fn no_cursor_frame_is_a_no_op() {
    let mut obj = SceneObject::block(6, "block/stone");
    let cursor = TimelineCursor::default();
    let inserted =
        insert_keyframe_at_current_frame(&cursor, &mut obj, AnimProperty::Scale, Some(Axis::X))
            .unwrap();
    assert!(!inserted);
    assert!(obj.keyframes.is_none());
}

#[test]
fn property_names_round_trip() {
    for prop in AnimProperty::ALL {
        assert_eq!(AnimProperty::from_name(prop.name()), Some(prop));
    }
    assert_eq!(AnimProperty::from_name("color"), None);
}
