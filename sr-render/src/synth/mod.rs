//! Scene object -> [`MeshTree`].
//!
//! Builds suspend only on provider calls. Every failure is a [`MeshError`];
//! [`synthesize`] is the boundary that turns those into "nothing to render".

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use bevy::math::{EulerRot, Quat, Vec2, Vec3};
use bevy::transform::components::Transform;
use sr_scene::{ItemRenderMode, LightSettings, ObjectKind, SceneObject};
use sr_utils::{AssetProvider, Axis, ModelElement, RasterImage, normalize_texture_path};
use tracing::{debug, warn};

use crate::block_models::{ModelShape, ResolvedModel, SimplifiedCube, resolve_model};
use crate::block_textures::{Face, TextureCache, concrete_texture_path, resolve_texture};
use crate::error::{MeshError, Result};
use crate::face_uv::{FULL_FACE_UVS, face_uvs};
use crate::mesh::{
    ITEM_ALPHA_CUTOFF, MeshTree, ModelCuboid, ModelPlane, NodeContent, SceneNode, SolidSurface,
    SurfaceMaterial, TexturedSurface,
};
use crate::voxel::{VOXEL_SIZE, voxelize};

/// Side length of the light billboard.
pub const LIGHT_ICON_SIZE: f32 = 0.5;
const LIGHT_ICON_PIXELS: u32 = 128;

/// Builds the mesh tree for `object`, or `None` (with a warning) when it cannot be rendered.
///
/// Never mutates the object and never returns a partial tree.
pub async fn synthesize<P: AssetProvider>(object: &SceneObject, provider: &P) -> Option<MeshTree> {
    match try_synthesize(object, provider).await {
        Ok(tree) => Some(tree),
        Err(err) => {
            warn!("{} {:?}: {err}", object.id, object.name);
            None
        }
    }
}

pub async fn try_synthesize<P: AssetProvider>(
    object: &SceneObject,
    provider: &P,
) -> Result<MeshTree> {
    let is_camera = matches!(object.kind, ObjectKind::Camera);
    let geometry = match &object.kind {
        ObjectKind::Block { block_path } => {
            let model = resolve_model(provider, block_path).await?;
            model_nodes(&model, object, provider, ModelOptions::block()).await?
        }
        ObjectKind::Item {
            item_path,
            render_mode,
            use_generated,
        } => {
            let model = resolve_model(provider, item_path).await?;
            let options = ModelOptions::item(*render_mode, *use_generated);
            model_nodes(&model, object, provider, options).await?
        }
        ObjectKind::Character { character_path } => {
            let bytes = provider.load_character_asset(character_path).await?;
            vec![SceneNode::new(
                "character",
                NodeContent::CharacterAsset {
                    path: character_path.clone(),
                    bytes,
                },
            )]
        }
        ObjectKind::Camera => camera_nodes(),
        ObjectKind::Light(settings) => light_nodes(settings),
    };

    debug!(
        "{} {:?}: {} geometry node(s)",
        object.id,
        object.name,
        geometry.len()
    );
    Ok(assemble(object, geometry, is_camera))
}

/// Container (user transform) -> visual group (pivot, orientation) -> geometry.
fn assemble(object: &SceneObject, geometry: Vec<SceneNode>, is_camera: bool) -> MeshTree {
    let r = object.rotation;
    let rotation = if is_camera {
        Quat::from_euler(EulerRot::YXZ, r.y, r.x, r.z)
    } else {
        Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z)
    };
    let (pitch, yaw) = object
        .orientation
        .map(|o| o.pitch_yaw())
        .unwrap_or((0.0, 0.0));

    let mut visual = SceneNode::group("visual").with_transform(
        Transform::from_translation(-object.pivot_offset)
            .with_rotation(Quat::from_euler(EulerRot::XYZ, pitch, yaw, 0.0)),
    );
    visual.children = geometry
        .into_iter()
        .map(|node| node.with_object(object.id))
        .collect();

    let mut root = SceneNode::group(object.name.clone())
        .with_transform(Transform {
            translation: object.position,
            rotation,
            scale: object.scale,
        })
        .with_object(object.id)
        .with_child(visual);
    root.pivot_offset = Some(object.pivot_offset);

    MeshTree {
        object_id: object.id,
        root,
    }
}

#[derive(Debug, Clone, Copy)]
struct ModelOptions {
    is_item: bool,
    render_mode: ItemRenderMode,
    force_generated: bool,
}

impl ModelOptions {
    fn block() -> Self {
        Self {
            is_item: false,
            render_mode: ItemRenderMode::default(),
            force_generated: false,
        }
    }

    fn item(render_mode: ItemRenderMode, force_generated: bool) -> Self {
        Self {
            is_item: true,
            render_mode,
            force_generated,
        }
    }

    fn alpha_cutoff(self) -> Option<f32> {
        self.is_item.then_some(ITEM_ALPHA_CUTOFF)
    }
}

async fn model_nodes<P: AssetProvider>(
    model: &ResolvedModel,
    object: &SceneObject,
    provider: &P,
    options: ModelOptions,
) -> Result<Vec<SceneNode>> {
    let shape = if options.force_generated {
        ModelShape::Generated
    } else {
        model.shape()
    };
    match shape {
        ModelShape::Generated => generated_nodes(model, object, provider, options).await,
        ModelShape::Elements => Ok(element_nodes(model, object, provider, options).await),
        ModelShape::Simplified(cube) => {
            simplified_nodes(model, cube, object, provider, options).await
        }
        ModelShape::Unsupported => Err(MeshError::UnsupportedFormat(format!(
            "{} (parent {})",
            model.path,
            model.parent.as_deref().unwrap_or("none")
        ))),
    }
}

/// Loads every concrete texture slot once per unique path and caches it under `#slot`.
///
/// A texture that fails to load is logged and left out; faces using it end up hidden.
async fn load_slot_textures<P: AssetProvider>(
    model: &ResolvedModel,
    provider: &P,
    cache: &mut TextureCache,
) {
    let mut by_path: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (slot, value) in &model.textures {
        if value.is_empty() || value.starts_with('#') {
            continue;
        }
        by_path
            .entry(normalize_texture_path(value))
            .or_default()
            .push(slot.as_str());
    }

    for (path, slots) in by_path {
        match provider.load_texture_image(&path).await {
            Ok(image) => {
                for slot in slots {
                    cache.insert(format!("#{slot}"), image.clone());
                }
            }
            Err(err) => warn!("model {}: texture {path} unavailable: {err}", model.path),
        }
    }
}

async fn element_nodes<P: AssetProvider>(
    model: &ResolvedModel,
    object: &SceneObject,
    provider: &P,
    options: ModelOptions,
) -> Vec<SceneNode> {
    let mut cache = TextureCache::new();
    load_slot_textures(model, provider, &mut cache).await;

    model
        .elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            element_node(index, element, model, &mut cache, object.opacity, options)
        })
        .collect()
}

fn element_node(
    index: usize,
    element: &ModelElement,
    model: &ResolvedModel,
    cache: &mut TextureCache,
    opacity: f32,
    options: ModelOptions,
) -> SceneNode {
    let from = Vec3::from(element.from);
    let to = Vec3::from(element.to);
    let center = (from + to) / 32.0 - Vec3::splat(0.5);

    let mut uvs = [FULL_FACE_UVS; 6];
    let materials = Face::ALL.map(|face| {
        let Some(model_face) = element.face(face.name()) else {
            return SurfaceMaterial::Hidden;
        };
        let texture = model_face
            .texture
            .as_deref()
            .and_then(|reference| resolve_texture(reference, &model.textures, cache));
        let (width, height) = texture
            .as_ref()
            .map(|img| (img.width(), img.height()))
            .unwrap_or((16, 16));
        uvs[face.index()] = face_uvs(element, face, model_face, width, height);
        match texture {
            Some(texture) => SurfaceMaterial::Textured(TexturedSurface {
                alpha_cutoff: options.alpha_cutoff(),
                ..TexturedSurface::element(texture, opacity)
            }),
            None => SurfaceMaterial::Hidden,
        }
    });

    let mut cuboid = ModelCuboid {
        size: (to - from) / 16.0,
        offset: center,
        uvs,
        materials,
    };
    let mut transform = Transform::IDENTITY;
    if let Some(rotation) = &element.rotation {
        let pivot = rotation
            .origin
            .map(|origin| Vec3::from(origin) / 16.0 - Vec3::splat(0.5))
            .unwrap_or(Vec3::ZERO);
        let axis = match rotation.axis {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        };
        // The node sits on the pivot and the geometry keeps its centre relative
        // to it; the centre offset is applied once, not again on top of the origin.
        transform = Transform::from_translation(pivot)
            .with_rotation(Quat::from_axis_angle(axis, rotation.angle.to_radians()));
        cuboid.offset = center - pivot;
    }

    SceneNode::new(format!("element {index}"), NodeContent::Cuboid(cuboid)).with_transform(transform)
}

/// Texture slot each face of a simplified cube draws from.
pub fn simplified_slot(cube: SimplifiedCube, face: Face) -> &'static str {
    match (cube, face) {
        (SimplifiedCube::CubeAll, _) => "all",
        (SimplifiedCube::CubeColumn, Face::PosY | Face::NegY) => "end",
        (SimplifiedCube::CubeColumn, _) => "side",
        (SimplifiedCube::CubeBottomTop, Face::PosY) => "top",
        (SimplifiedCube::CubeBottomTop, Face::NegY) => "bottom",
        (SimplifiedCube::CubeBottomTop, _) => "side",
        (SimplifiedCube::CubeTop, Face::PosY) => "top",
        (SimplifiedCube::CubeTop, _) => "side",
        (SimplifiedCube::Orientable, Face::PosZ) => "front",
        (SimplifiedCube::Orientable, Face::PosY | Face::NegY) => "top",
        (SimplifiedCube::Orientable, _) => "side",
    }
}

async fn load_required_slot<P: AssetProvider>(
    model: &ResolvedModel,
    slot: &str,
    provider: &P,
) -> Result<Arc<RasterImage>> {
    let missing = || MeshError::missing_texture(slot, model.path.clone());
    let path = concrete_texture_path(&model.textures, slot).ok_or_else(missing)?;
    provider.load_texture_image(path).await.map_err(|err| {
        debug!("model {}: #{slot} -> {path}: {err}", model.path);
        missing()
    })
}

async fn simplified_nodes<P: AssetProvider>(
    model: &ResolvedModel,
    cube: SimplifiedCube,
    object: &SceneObject,
    provider: &P,
    options: ModelOptions,
) -> Result<Vec<SceneNode>> {
    let mut loaded: HashMap<&'static str, Arc<RasterImage>> = HashMap::new();
    for face in Face::ALL {
        let slot = simplified_slot(cube, face);
        if !loaded.contains_key(slot) {
            let image = load_required_slot(model, slot, provider).await?;
            loaded.insert(slot, image);
        }
    }

    let materials = Face::ALL.map(|face| {
        let texture = loaded[simplified_slot(cube, face)].clone();
        SurfaceMaterial::Textured(TexturedSurface {
            alpha_cutoff: options.alpha_cutoff(),
            ..TexturedSurface::element(texture, object.opacity)
        })
    });
    let cuboid = ModelCuboid {
        size: Vec3::ONE,
        offset: Vec3::ZERO,
        uvs: [FULL_FACE_UVS; 6],
        materials,
    };
    Ok(vec![SceneNode::new(cube.name(), NodeContent::Cuboid(cuboid))])
}

async fn generated_nodes<P: AssetProvider>(
    model: &ResolvedModel,
    object: &SceneObject,
    provider: &P,
    options: ModelOptions,
) -> Result<Vec<SceneNode>> {
    let texture = load_required_slot(model, "layer0", provider).await?;
    match options.render_mode {
        ItemRenderMode::Plane => {
            let plane = ModelPlane {
                size: Vec2::ONE,
                material: SurfaceMaterial::Textured(TexturedSurface {
                    alpha_cutoff: Some(ITEM_ALPHA_CUTOFF),
                    double_sided: true,
                    depth_write: true,
                    ..TexturedSurface::element(texture, object.opacity)
                }),
                billboard: false,
            };
            Ok(vec![SceneNode::new("icon", NodeContent::Plane(plane))])
        }
        ItemRenderMode::Voxel => Ok(voxelize(&texture)
            .into_iter()
            .map(|voxel| {
                let material = SurfaceMaterial::Solid(SolidSurface {
                    color: voxel.color,
                    opacity: voxel.opacity,
                    blend: voxel.blend,
                    alpha_cutoff: Some(ITEM_ALPHA_CUTOFF),
                });
                let (x, y) = voxel.pixel;
                SceneNode::new(
                    format!("voxel {x},{y}"),
                    NodeContent::Cuboid(ModelCuboid::uniform(Vec3::splat(VOXEL_SIZE), material)),
                )
                .with_transform(Transform::from_translation(voxel.center))
            })
            .collect()),
    }
}

fn camera_nodes() -> Vec<SceneNode> {
    vec![
        SceneNode::new(
            "hitbox",
            NodeContent::Cuboid(ModelCuboid::uniform(Vec3::ONE, SurfaceMaterial::Hidden)),
        ),
        SceneNode::new("camera", NodeContent::CameraMarker),
    ]
}

fn light_nodes(settings: &LightSettings) -> Vec<SceneNode> {
    let icon = ModelPlane {
        size: Vec2::splat(LIGHT_ICON_SIZE),
        material: SurfaceMaterial::Textured(TexturedSurface {
            texture: light_icon(),
            opacity: 1.0,
            alpha_cutoff: Some(ITEM_ALPHA_CUTOFF),
            double_sided: true,
            depth_write: false,
            unlit: true,
            always_on_top: true,
        }),
        billboard: true,
    };
    vec![
        SceneNode::new("light", NodeContent::PointLight(*settings)),
        SceneNode::new("light icon", NodeContent::Plane(icon)),
    ]
}

/// White disc on a transparent square, shared by every light.
pub fn light_icon() -> Arc<RasterImage> {
    static ICON: OnceLock<Arc<RasterImage>> = OnceLock::new();
    ICON.get_or_init(|| {
        let size = LIGHT_ICON_PIXELS;
        let mut image = RasterImage::filled(size, size, [0, 0, 0, 0]);
        let center = size as f32 / 2.0;
        let radius = center - 4.0;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 + 0.5 - center;
                let dy = y as f32 + 0.5 - center;
                let coverage = (radius + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    image.put_pixel(x, y, [255, 255, 255, (coverage * 255.0) as u8]);
                }
            }
        }
        Arc::new(image)
    })
    .clone()
}
