use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use sr_scene::{SceneObject, SceneObjectId};
use sr_utils::AssetProvider;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, warn};

use crate::mesh::MeshTree;
use crate::spawn::spawn_mesh_tree;
use crate::synth::synthesize;

/// Objects waiting to be (re)built or removed. Drained once per frame.
#[derive(Resource, Default)]
pub struct MeshBuildQueue(pub Vec<BuildRequest>);

#[derive(Debug, Clone)]
pub enum BuildRequest {
    Build(SceneObject),
    Remove(SceneObjectId),
}

impl MeshBuildQueue {
    pub fn build(&mut self, object: SceneObject) {
        self.0.push(BuildRequest::Build(object));
    }

    pub fn remove(&mut self, id: SceneObjectId) {
        self.0.push(BuildRequest::Remove(id));
    }
}

#[derive(Resource)]
pub struct MeshAsyncResources {
    pub runtime: Arc<Runtime>,
    pub job_tx: UnboundedSender<MeshJob>,
    pub result_rx: Mutex<UnboundedReceiver<MeshResult>>,
    pub(crate) result_tx: UnboundedSender<MeshResult>,
}

impl MeshAsyncResources {
    /// Starts the build runtime. Every job runs as its own task so slow
    /// objects never hold up the rest of the scene.
    pub fn new<P: AssetProvider + 'static>(provider: Arc<P>) -> std::io::Result<Self> {
        let runtime = Arc::new(Runtime::new()?);
        let (job_tx, mut job_rx) = unbounded_channel::<MeshJob>();
        let (result_tx, result_rx) = unbounded_channel::<MeshResult>();
        let runtime_clone = runtime.clone();
        let dispatch_tx = result_tx.clone();

        runtime.spawn(async move {
            while let Some(job) = job_rx.recv().await {
                let result_tx = dispatch_tx.clone();
                let provider = provider.clone();
                runtime_clone.spawn(async move {
                    let tree = synthesize(&job.object, provider.as_ref()).await;
                    let _ = result_tx.send(MeshResult {
                        object_id: job.object.id,
                        generation: job.generation,
                        tree,
                    });
                });
            }
        });

        Ok(Self {
            runtime,
            job_tx,
            result_rx: Mutex::new(result_rx),
            result_tx,
        })
    }
}

/// Latest request generation per object; older results are stale.
#[derive(Resource, Default)]
pub struct MeshInFlight {
    generations: HashMap<SceneObjectId, u64>,
    next_generation: u64,
}

impl MeshInFlight {
    pub fn begin(&mut self, id: SceneObjectId) -> u64 {
        self.next_generation += 1;
        self.generations.insert(id, self.next_generation);
        self.next_generation
    }

    pub fn is_current(&self, id: SceneObjectId, generation: u64) -> bool {
        self.generations.get(&id) == Some(&generation)
    }

    /// Clears the entry when `generation` is current and reports whether it was.
    pub fn finish(&mut self, id: SceneObjectId, generation: u64) -> bool {
        if self.is_current(id, generation) {
            self.generations.remove(&id);
            true
        } else {
            false
        }
    }

    pub fn forget(&mut self, id: SceneObjectId) {
        self.generations.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }
}

/// Container entity currently shown for each object.
#[derive(Resource, Default)]
pub struct SpawnedSceneObjects(pub HashMap<SceneObjectId, Entity>);

pub struct MeshJob {
    pub object: SceneObject,
    pub generation: u64,
}

pub struct MeshResult {
    pub object_id: SceneObjectId,
    pub generation: u64,
    pub tree: Option<MeshTree>,
}

pub(crate) fn enqueue_mesh_builds(
    mut commands: Commands,
    mut queue: ResMut<MeshBuildQueue>,
    async_mesh: Res<MeshAsyncResources>,
    mut in_flight: ResMut<MeshInFlight>,
    mut spawned: ResMut<SpawnedSceneObjects>,
) {
    for request in queue.0.drain(..) {
        match request {
            BuildRequest::Build(object) => {
                let generation = in_flight.begin(object.id);
                debug!("queue build {} gen {generation}", object.id);
                let id = object.id;
                if async_mesh.job_tx.send(MeshJob { object, generation }).is_err() {
                    warn!("mesh build runtime is gone, {id} not rebuilt");
                    in_flight.forget(id);
                }
            }
            BuildRequest::Remove(id) => {
                in_flight.forget(id);
                if let Some(entity) = spawned.0.remove(&id) {
                    commands.entity(entity).despawn();
                }
            }
        }
    }
}

/// Swaps finished trees into the world, discarding results that were superseded.
pub(crate) fn apply_mesh_results(world: &mut World) {
    let results: Vec<MeshResult> = {
        let Some(async_mesh) = world.get_resource::<MeshAsyncResources>() else {
            return;
        };
        let Ok(mut receiver) = async_mesh.result_rx.lock() else {
            return;
        };
        std::iter::from_fn(|| receiver.try_recv().ok()).collect()
    };

    for result in results {
        let current = world
            .resource_mut::<MeshInFlight>()
            .finish(result.object_id, result.generation);
        if !current {
            debug!(
                "discarding stale build {} gen {}",
                result.object_id, result.generation
            );
            continue;
        }

        let previous = world
            .resource_mut::<SpawnedSceneObjects>()
            .0
            .remove(&result.object_id);
        if let Some(previous) = previous {
            world.despawn(previous);
        }
        if let Some(tree) = result.tree {
            let entity = spawn_mesh_tree(world, &tree);
            world
                .resource_mut::<SpawnedSceneObjects>()
                .0
                .insert(result.object_id, entity);
        }
    }
}
