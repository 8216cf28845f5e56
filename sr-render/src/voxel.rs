use bevy::math::Vec3;
use sr_utils::RasterImage;

/// Pixels with alpha below this are skipped.
pub const VOXEL_ALPHA_THRESHOLD: u8 = 10;
/// Edge length of one voxel: a pixel of a 16px icon spanning one block.
pub const VOXEL_SIZE: f32 = 1.0 / 16.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Voxel {
    pub pixel: (u32, u32),
    pub center: Vec3,
    pub color: [f32; 3],
    pub opacity: f32,
    /// Partially transparent pixels are alpha blended.
    pub blend: bool,
}

/// One cube per sufficiently opaque pixel, centred on the origin with +Y up.
pub fn voxelize(image: &RasterImage) -> Vec<Voxel> {
    let (w, h) = (image.width() as f32, image.height() as f32);
    let half = VOXEL_SIZE * 0.5;
    let mut out = Vec::new();
    for y in 0..image.height() {
        for x in 0..image.width() {
            let [r, g, b, a] = image.pixel(x, y);
            if a < VOXEL_ALPHA_THRESHOLD {
                continue;
            }
            out.push(Voxel {
                pixel: (x, y),
                center: Vec3::new(
                    (x as f32 - w / 2.0) * VOXEL_SIZE + half,
                    (h / 2.0 - y as f32) * VOXEL_SIZE - half,
                    0.0,
                ),
                color: [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0],
                opacity: a as f32 / 255.0,
                blend: a < u8::MAX,
            });
        }
    }
    out
}
