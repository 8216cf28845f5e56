//! Per-face texture coordinates for model elements.
//!
//! Corners are `(u1, v2), (u2, v2), (u1, v1), (u2, v1)` with `v1 <= v2`. With
//! the bottom-left texture origin used here that lands on the top-left,
//! top-right, bottom-left and bottom-right vertex of each cuboid face, in the
//! order the faces are built. [`write_face_uvs`] converts to the top-left
//! origin Bevy samples with.

use sr_utils::{ModelElement, ModelFace};

use crate::block_textures::Face;

pub type FaceUvs = [[f32; 2]; 4];

/// UVs covering the whole texture.
pub const FULL_FACE_UVS: FaceUvs = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];

/// Texture coordinates for one face of `element`, rotation applied.
///
/// `width`/`height` are the face texture's pixel size. Automatic up/down UVs
/// divide by them while the side faces divide by 16; vanilla textures are 16px
/// so both agree there.
pub fn face_uvs(
    element: &ModelElement,
    face: Face,
    model_face: &ModelFace,
    width: u32,
    height: u32,
) -> FaceUvs {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let (from, to) = (element.from, element.to);

    let (u1, u2, v1, v2) = match model_face.uv {
        Some([x1, y1, x2, y2]) => (x1 / w, x2 / w, 1.0 - y2 / h, 1.0 - y1 / h),
        None => match face {
            Face::PosX | Face::NegX => (from[2] / 16.0, to[2] / 16.0, from[1] / 16.0, to[1] / 16.0),
            Face::PosZ | Face::NegZ => (from[0] / 16.0, to[0] / 16.0, from[1] / 16.0, to[1] / 16.0),
            Face::PosY => (from[0] / w, to[0] / w, 1.0 - from[2] / h, 1.0 - to[2] / h),
            Face::NegY => (from[0] / w, to[0] / w, 1.0 - to[2] / h, 1.0 - from[2] / h),
        },
    };

    let corners = [[u1, v2], [u2, v2], [u1, v1], [u2, v1]];
    rotate_uvs(corners, model_face.rotation.unwrap_or(0))
}

/// Rotates corner assignments by whole quarter turns; `degrees` is taken modulo 360.
pub fn rotate_uvs(corners: FaceUvs, degrees: i32) -> FaceUvs {
    let turns = (degrees / 90).rem_euclid(4);
    (0..turns).fold(corners, |old, _| [old[2], old[0], old[3], old[1]])
}

/// Writes `corners` into a 24-entry UV attribute at the slots of `face`.
pub fn write_face_uvs(attribute: &mut [[f32; 2]], face: Face, corners: &FaceUvs) {
    let base = face.index() * 4;
    for (slot, [u, v]) in attribute[base..base + 4].iter_mut().zip(corners) {
        *slot = [*u, 1.0 - *v];
    }
}
