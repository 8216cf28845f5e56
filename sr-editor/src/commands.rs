use std::sync::Arc;

use anyhow::Context as _;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use sr_render::{MeshBuildQueue, MeshTree, ScenePreviewPlugin, resolve_model, synthesize};
use sr_scene::{SceneObject, SceneObjectId};
use sr_utils::AssetProvider;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Prints the merged model and its classification as JSON.
pub async fn resolve<P: AssetProvider>(provider: &P, model: &str) -> anyhow::Result<String> {
    let resolved = resolve_model(provider, model)
        .await
        .with_context(|| format!("resolve {model}"))?;
    let report = serde_json::json!({
        "shape": resolved.shape(),
        "model": resolved,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

pub async fn mesh<P: AssetProvider>(provider: &P, object: &SceneObject) -> anyhow::Result<String> {
    match synthesize(object, provider).await {
        Some(tree) => Ok(tree.to_string()),
        None => anyhow::bail!("{} {:?} has nothing to render", object.id, object.name),
    }
}

#[derive(Debug, Default)]
pub struct SceneReport {
    pub built: Vec<(SceneObjectId, String, MeshTree)>,
    pub failed: Vec<(SceneObjectId, String)>,
}

impl SceneReport {
    pub fn summary(&self) -> String {
        let mut lines: Vec<(SceneObjectId, String)> = self
            .built
            .iter()
            .map(|(id, name, tree)| {
                let geometry = tree.geometry_nodes().count();
                (*id, format!("{id} {name}: {geometry} geometry node(s), {} total", tree.node_count()))
            })
            .chain(
                self.failed
                    .iter()
                    .map(|(id, name)| (*id, format!("{id} {name}: nothing to render"))),
            )
            .collect();
        lines.sort_by_key(|(id, _)| *id);
        lines
            .into_iter()
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds every object concurrently.
pub async fn scene<P: AssetProvider + 'static>(
    provider: Arc<P>,
    objects: Vec<SceneObject>,
) -> anyhow::Result<SceneReport> {
    let mut tasks = JoinSet::new();
    for object in objects {
        let provider = provider.clone();
        tasks.spawn(async move {
            let tree = synthesize(&object, provider.as_ref()).await;
            (object.id, object.name, tree)
        });
    }

    let mut report = SceneReport::default();
    while let Some(joined) = tasks.join_next().await {
        let (id, name, tree) = joined.context("mesh build task panicked")?;
        match tree {
            Some(tree) => report.built.push((id, name, tree)),
            None => {
                warn!("{id} {name:?} skipped");
                report.failed.push((id, name));
            }
        }
    }
    info!(
        "scene built: {} ok, {} skipped",
        report.built.len(),
        report.failed.len()
    );
    Ok(report)
}

#[derive(Resource)]
struct PendingObjects(Vec<SceneObject>);

/// Opens a window and streams the scene in through the preview plugin.
pub fn preview<P: AssetProvider + 'static>(
    provider: Arc<P>,
    objects: Vec<SceneObject>,
) -> anyhow::Result<()> {
    info!("previewing {} object(s)", objects.len());
    let exit = App::new()
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "SimplyRemade preview".into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins(ScenePreviewPlugin::new(provider))
        .insert_resource(PendingObjects(objects))
        .add_systems(Startup, (setup_stage, queue_pending_objects))
        .run();
    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("preview exited with code {code}"),
    }
}

fn setup_stage(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(2.5, 2.0, 3.5).looking_at(Vec3::new(0.0, 0.5, 0.0), Vec3::Y),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Mesh::from(Plane3d::default()))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.2, 0.2, 0.22),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::from_scale(Vec3::splat(16.0)),
    ));
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 10_000.0,
            ..default()
        },
        Transform::from_xyz(8.0, 16.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.45, 0.45, 0.5),
        brightness: 300.0,
        affects_lightmapped_meshes: true,
    });
}

fn queue_pending_objects(pending: Res<PendingObjects>, mut queue: ResMut<MeshBuildQueue>) {
    for object in &pending.0 {
        queue.build(object.clone());
    }
}

#[cfg(test)]
mod tests {
    use sr_scene::{ObjectKind, SceneObjectId};
    use sr_utils::{MemoryAssetProvider, RasterImage};

    use super::*;

    fn provider() -> MemoryAssetProvider {
        let mut provider = MemoryAssetProvider::new();
        provider
            .insert_model_json(
                "block/stone",
                r#"{"parent": "block/cube_all", "textures": {"all": "block/stone"}}"#,
            )
            .insert_model_json("block/weird", r#"{"parent": "block/template_weird"}"#)
            .insert_texture("block/stone", RasterImage::filled(16, 16, [100, 100, 100, 255]));
        provider
    }

    #[tokio::test]
    async fn resolve_reports_shape() {
        let json = resolve(&provider(), "minecraft:block/stone").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["shape"]["kind"], "simplified");
        assert_eq!(value["shape"]["template"], "cube_all");
        assert_eq!(value["model"]["textures"]["all"], "block/stone");

        assert!(resolve(&provider(), "block/missing").await.is_err());
    }

    #[tokio::test]
    async fn mesh_summary_or_error() {
        let provider = provider();
        let summary = mesh(&provider, &SceneObject::block(1, "block/stone"))
            .await
            .unwrap();
        assert!(summary.contains("cube_all [cuboid]"));
        assert!(mesh(&provider, &SceneObject::block(2, "block/weird")).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn scene_builds_concurrently_and_reports_failures() {
        let objects = vec![
            SceneObject::block(3, "block/weird"),
            SceneObject::block(1, "block/stone"),
            SceneObject::new(SceneObjectId(2), "Camera", ObjectKind::Camera),
        ];
        let report = scene(Arc::new(provider()), objects).await.unwrap();
        assert_eq!(report.built.len(), 2);
        assert_eq!(report.failed.len(), 1);
        let summary = report.summary();
        let lines: Vec<_> = summary.lines().collect();
        assert!(lines[0].starts_with("#1 stone"));
        assert!(lines[1].starts_with("#2 Camera"));
        assert_eq!(lines[2], "#3 weird: nothing to render");
    }
}
