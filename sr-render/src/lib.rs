//! Model resolution, mesh synthesis and the Bevy side of the scene preview.

use std::sync::Arc;

use bevy::prelude::*;
use bevy::render::view::VisibilitySystems;
use bevy::transform::TransformSystem;
use sr_utils::AssetProvider;

mod async_mesh;
pub mod block_models;
pub mod block_textures;
pub mod error;
pub mod face_uv;
pub mod mesh;
pub mod spawn;
pub mod synth;
pub mod voxel;

pub use async_mesh::{
    BuildRequest, MeshAsyncResources, MeshBuildQueue, MeshInFlight, SpawnedSceneObjects,
};
pub use block_models::{ModelShape, ResolvedModel, SimplifiedCube, resolve_model};
pub use block_textures::{Face, TextureCache, concrete_texture_path, resolve_texture};
pub use error::MeshError;
pub use face_uv::{FaceUvs, face_uvs, rotate_uvs};
pub use mesh::{MeshTree, ModelCuboid, ModelPlane, NodeContent, SceneNode, SurfaceMaterial};
pub use spawn::{
    Billboard, CharacterAssetData, PivotOffsetRecord, SceneCameraMarker, SceneObjectRef,
    spawn_mesh_tree,
};
pub use synth::{synthesize, try_synthesize};
pub use voxel::{Voxel, voxelize};

/// Builds queued scene objects off-thread and keeps their entities in sync.
pub struct ScenePreviewPlugin<P> {
    pub provider: Arc<P>,
}

impl<P> ScenePreviewPlugin<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

impl<P: AssetProvider + 'static> Plugin for ScenePreviewPlugin<P> {
    fn build(&self, app: &mut App) {
        let async_mesh = match MeshAsyncResources::new(self.provider.clone()) {
            Ok(resources) => resources,
            Err(err) => {
                tracing::error!("failed to start mesh build runtime: {err}");
                return;
            }
        };

        app.insert_resource(async_mesh)
            .init_resource::<MeshBuildQueue>()
            .init_resource::<MeshInFlight>()
            .init_resource::<SpawnedSceneObjects>()
            .init_resource::<spawn::SpawnedTextures>()
            .add_systems(
                Update,
                (async_mesh::enqueue_mesh_builds, spawn::face_billboards),
            )
            .add_systems(
                PostUpdate,
                async_mesh::apply_mesh_results
                    .before(TransformSystem::TransformPropagate)
                    .before(VisibilitySystems::CheckVisibility),
            );
    }
}
