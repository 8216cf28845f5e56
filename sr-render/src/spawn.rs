//! Mesh tree -> Bevy entities.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use sr_scene::{LightSettings, SceneObjectId};
use sr_utils::RasterImage;

use crate::block_textures::Face;
use crate::mesh::{MeshTree, ModelCuboid, NodeContent, SceneNode, SurfaceMaterial};

/// Bevy light units per scene intensity unit.
pub const LUMENS_PER_INTENSITY: f32 = 10_000.0;
/// Range used for lights whose distance is zero (unlimited).
pub const UNLIMITED_LIGHT_RANGE: f32 = 1_000.0;
/// Pulls always-on-top surfaces in front of scene geometry.
const ON_TOP_DEPTH_BIAS: f32 = 1.0e6;

/// Scene object a spawned entity belongs to. Used for picking.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneObjectRef(pub SceneObjectId);

/// Pivot offset a container was built with, kept for diffing on rebuild.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PivotOffsetRecord(pub Vec3);

/// Turned toward the active camera every frame.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Billboard;

#[derive(Component, Debug, Default, Clone, Copy)]
pub struct SceneCameraMarker;

/// Raw character file waiting for a glTF loader.
#[derive(Component, Debug, Clone)]
pub struct CharacterAssetData {
    pub path: String,
    pub bytes: Arc<[u8]>,
}

/// GPU images already created for shared rasters, keyed by allocation.
///
/// Entries hold only a weak reference to the raster and the image's id, so
/// dropping every spawned material frees the image. Entries whose raster is
/// gone are pruned before each spawn.
#[derive(Resource, Default)]
pub struct SpawnedTextures {
    images: HashMap<usize, (Weak<RasterImage>, AssetId<Image>)>,
}

impl SpawnedTextures {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Drops entries whose raster has been released.
    pub fn prune(&mut self) {
        self.images.retain(|_, (raster, _)| raster.strong_count() > 0);
    }

    fn get(&self, raster: &Arc<RasterImage>) -> Option<AssetId<Image>> {
        let (weak, id) = self.images.get(&raster_key(raster))?;
        weak.upgrade()
            .filter(|live| Arc::ptr_eq(live, raster))
            .map(|_| *id)
    }
}

fn raster_key(raster: &Arc<RasterImage>) -> usize {
    Arc::as_ptr(raster) as usize
}

pub fn raster_to_image(raster: &RasterImage) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: raster.width().max(1),
            height: raster.height().max(1),
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    if raster.width() > 0 && raster.height() > 0 {
        image.data = Some(raster.rgba().to_vec());
    }

    let mut sampler = ImageSamplerDescriptor::nearest();
    sampler.address_mode_u = ImageAddressMode::ClampToEdge;
    sampler.address_mode_v = ImageAddressMode::ClampToEdge;
    sampler.address_mode_w = ImageAddressMode::ClampToEdge;
    image.sampler = ImageSampler::Descriptor(sampler);
    image
}

fn image_handle(world: &mut World, raster: &Arc<RasterImage>) -> Handle<Image> {
    let cached = world.resource::<SpawnedTextures>().get(raster);
    if let Some(id) = cached
        && let Some(handle) = world.resource_mut::<Assets<Image>>().get_strong_handle(id)
    {
        return handle;
    }
    let handle = world
        .resource_mut::<Assets<Image>>()
        .add(raster_to_image(raster));
    world
        .resource_mut::<SpawnedTextures>()
        .images
        .insert(raster_key(raster), (Arc::downgrade(raster), handle.id()));
    handle
}

/// Bevy material for a surface. Hidden surfaces get a fully transparent one.
pub fn surface_material(surface: &SurfaceMaterial, texture: Option<Handle<Image>>) -> StandardMaterial {
    match surface {
        SurfaceMaterial::Textured(textured) => {
            let alpha_mode = match (textured.depth_write, textured.alpha_cutoff) {
                (true, Some(cutoff)) if textured.opacity >= 1.0 => AlphaMode::Mask(cutoff),
                (true, None) if textured.opacity >= 1.0 => AlphaMode::Opaque,
                _ => AlphaMode::Blend,
            };
            StandardMaterial {
                base_color: Color::srgba(1.0, 1.0, 1.0, textured.opacity),
                base_color_texture: texture,
                alpha_mode,
                double_sided: textured.double_sided,
                cull_mode: if textured.double_sided {
                    None
                } else {
                    Some(bevy::render::render_resource::Face::Back)
                },
                unlit: textured.unlit,
                depth_bias: if textured.always_on_top {
                    ON_TOP_DEPTH_BIAS
                } else {
                    0.0
                },
                perceptual_roughness: 1.0,
                ..default()
            }
        }
        SurfaceMaterial::Solid(solid) => {
            let [r, g, b] = solid.color;
            StandardMaterial {
                base_color: Color::srgba(r, g, b, solid.opacity),
                alpha_mode: if solid.blend {
                    AlphaMode::Blend
                } else {
                    AlphaMode::Opaque
                },
                perceptual_roughness: 1.0,
                ..default()
            }
        }
        SurfaceMaterial::Hidden => StandardMaterial {
            base_color: Color::NONE,
            alpha_mode: AlphaMode::Blend,
            ..default()
        },
    }
}

fn material_handle(world: &mut World, surface: &SurfaceMaterial) -> Handle<StandardMaterial> {
    let texture = match surface {
        SurfaceMaterial::Textured(textured) => Some(image_handle(world, &textured.texture)),
        _ => None,
    };
    let material = surface_material(surface, texture);
    world
        .resource_mut::<Assets<StandardMaterial>>()
        .add(material)
}

fn visibility_for(surface: &SurfaceMaterial) -> Visibility {
    if surface.is_hidden() {
        Visibility::Hidden
    } else {
        Visibility::Inherited
    }
}

pub fn point_light(settings: &LightSettings) -> PointLight {
    let [r, g, b] = settings.color;
    PointLight {
        color: Color::srgb(r, g, b),
        intensity: settings.intensity * LUMENS_PER_INTENSITY,
        range: if settings.distance > 0.0 {
            settings.distance
        } else {
            UNLIMITED_LIGHT_RANGE
        },
        ..default()
    }
}

/// Spawns `tree` and returns its container entity.
///
/// Needs `Assets<Mesh>`, `Assets<StandardMaterial>` and `Assets<Image>` in the world.
pub fn spawn_mesh_tree(world: &mut World, tree: &MeshTree) -> Entity {
    world.init_resource::<SpawnedTextures>();
    world.resource_mut::<SpawnedTextures>().prune();
    spawn_node(world, &tree.root)
}

fn spawn_node(world: &mut World, node: &SceneNode) -> Entity {
    let mut entity = world.spawn((
        Name::new(node.name.clone()),
        node.transform,
        Visibility::Inherited,
    ));
    if let Some(id) = node.object_id {
        entity.insert(SceneObjectRef(id));
    }
    if let Some(pivot) = node.pivot_offset {
        entity.insert(PivotOffsetRecord(pivot));
    }
    let id = entity.id();

    match &node.content {
        NodeContent::Group => {}
        NodeContent::Cuboid(cuboid) => spawn_cuboid(world, id, cuboid, node.object_id),
        NodeContent::Plane(plane) => {
            let mesh = world.resource_mut::<Assets<Mesh>>().add(plane.mesh());
            let material = material_handle(world, &plane.material);
            let mut entity = world.entity_mut(id);
            entity.insert((
                Mesh3d(mesh),
                MeshMaterial3d(material),
                visibility_for(&plane.material),
            ));
            if plane.billboard {
                entity.insert(Billboard);
            }
        }
        NodeContent::PointLight(settings) => {
            world.entity_mut(id).insert(point_light(settings));
        }
        NodeContent::CameraMarker => {
            world.entity_mut(id).insert(SceneCameraMarker);
        }
        NodeContent::CharacterAsset { path, bytes } => {
            world.entity_mut(id).insert(CharacterAssetData {
                path: path.clone(),
                bytes: bytes.clone(),
            });
        }
    }

    for child in &node.children {
        let child = spawn_node(world, child);
        world.entity_mut(id).add_child(child);
    }
    id
}

/// One mesh when every face shares a material, otherwise one child per face.
fn spawn_cuboid(
    world: &mut World,
    entity: Entity,
    cuboid: &ModelCuboid,
    object_id: Option<SceneObjectId>,
) {
    if cuboid.is_uniform() {
        let surface = cuboid.material(Face::PosX);
        let mesh = world.resource_mut::<Assets<Mesh>>().add(cuboid.mesh());
        let material = material_handle(world, surface);
        world.entity_mut(entity).insert((
            Mesh3d(mesh),
            MeshMaterial3d(material),
            visibility_for(surface),
        ));
        return;
    }

    for face in Face::ALL {
        let surface = cuboid.material(face);
        let mesh = world
            .resource_mut::<Assets<Mesh>>()
            .add(cuboid.face_mesh(face));
        let material = material_handle(world, surface);
        let mut child = world.spawn((
            Name::new(format!("face {}", face.name())),
            Mesh3d(mesh),
            MeshMaterial3d(material),
            Transform::IDENTITY,
            visibility_for(surface),
        ));
        if let Some(id) = object_id {
            child.insert(SceneObjectRef(id));
        }
        let child = child.id();
        world.entity_mut(entity).add_child(child);
    }
}

/// Rotates billboards so their +Z faces the first 3D camera.
pub fn face_billboards(
    cameras: Query<&GlobalTransform, With<Camera3d>>,
    parents: Query<&GlobalTransform, Without<Billboard>>,
    mut billboards: Query<(&mut Transform, Option<&ChildOf>), With<Billboard>>,
) {
    let Some(camera) = cameras.iter().next() else {
        return;
    };
    let (_, camera_rotation, _) = camera.to_scale_rotation_translation();
    for (mut transform, child_of) in &mut billboards {
        let parent_rotation = child_of
            .and_then(|child_of| parents.get(child_of.parent()).ok())
            .map(|parent| parent.to_scale_rotation_translation().1)
            .unwrap_or(Quat::IDENTITY);
        transform.rotation = parent_rotation.inverse() * camera_rotation;
    }
}
