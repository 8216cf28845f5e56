use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use sr_scene::{ItemRenderMode, ObjectKind, Orientation, SceneObject, SceneObjectId, display_name};
use sr_utils::DiskAssetProvider;
use tracing::info;

mod commands;
mod config;
mod scene_file;

use config::{EditorConfig, LogLevel};
use scene_file::SceneFile;

#[derive(Parser, Debug)]
#[command(name = "simplyremade", version, about = "Block and item scene editor tools")]
struct Cli {
    /// Editor config (TOML). Defaults to ./simplyremade.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output; repeat for less.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    quiet: u8,

    #[command(subcommand)]
    cmd: Command,
}

impl Cli {
    /// `base` moved one level per `-v`/`-q`.
    fn log_level(&self, base: LogLevel) -> LogLevel {
        base.shifted(i32::from(self.verbose) - i32::from(self.quiet))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a model with its parent chain merged, as JSON.
    Resolve(ResolveArgs),
    /// Build one block or item and print its mesh tree.
    Mesh(MeshArgs),
    /// Build every object of a scene file and print a summary.
    Scene(SceneArgs),
    /// Open a window rendering a scene file.
    Preview(SceneArgs),
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Model id, e.g. `minecraft:block/furnace`.
    model: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Block,
    Item,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RenderModeArg {
    Voxel,
    Plane,
}

impl From<RenderModeArg> for ItemRenderMode {
    fn from(arg: RenderModeArg) -> Self {
        match arg {
            RenderModeArg::Voxel => ItemRenderMode::Voxel,
            RenderModeArg::Plane => ItemRenderMode::Plane,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrientationArg {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::North => Orientation::North,
            OrientationArg::South => Orientation::South,
            OrientationArg::East => Orientation::East,
            OrientationArg::West => Orientation::West,
            OrientationArg::Up => Orientation::Up,
            OrientationArg::Down => Orientation::Down,
        }
    }
}

#[derive(Parser, Debug)]
struct MeshArgs {
    #[arg(long, value_enum, default_value_t = KindArg::Block)]
    kind: KindArg,

    /// Model id, e.g. `minecraft:item/apple`.
    #[arg(long)]
    path: String,

    /// Flat item rendering; defaults to the config value.
    #[arg(long, value_enum)]
    render_mode: Option<RenderModeArg>,

    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Render items as flat icons even when the model has geometry.
    #[arg(long, default_value_t = false)]
    use_generated: bool,
}

impl MeshArgs {
    fn to_object(&self, config: &EditorConfig) -> SceneObject {
        let kind = match self.kind {
            KindArg::Block => ObjectKind::Block {
                block_path: self.path.clone(),
            },
            KindArg::Item => ObjectKind::Item {
                item_path: self.path.clone(),
                render_mode: self
                    .render_mode
                    .map(Into::into)
                    .unwrap_or(config.item_render_mode),
                use_generated: self.use_generated,
            },
        };
        let mut object = SceneObject::new(SceneObjectId(1), display_name(&self.path), kind);
        object.orientation = self.orientation.map(Into::into);
        object
    }
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Scene description (JSON).
    scene: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EditorConfig::load(cli.config.as_deref())?;
    let level = cli.log_level(config.log_level);

    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_max_level(level.to_tracing())
        .init();

    info!("Starting simplyremade");
    info!("asset roots: {:?}", config.asset_roots);
    let provider = Arc::new(
        DiskAssetProvider::new(config.asset_roots.clone()).with_namespaces(config.namespaces.clone()),
    );

    if let Command::Preview(args) = &cli.cmd {
        let scene = SceneFile::load(&args.scene)?;
        let objects = scene.scene_objects(config.item_render_mode)?;
        return commands::preview(provider, objects);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        match cli.cmd {
            Command::Resolve(args) => {
                println!("{}", commands::resolve(provider.as_ref(), &args.model).await?);
            }
            Command::Mesh(args) => {
                let object = args.to_object(&config);
                println!("{}", commands::mesh(provider.as_ref(), &object).await?);
            }
            Command::Scene(args) => {
                let scene = SceneFile::load(&args.scene)?;
                info!("timeline frame: {:?}", scene.cursor().current_frame);
                let objects = scene.scene_objects(config.item_render_mode)?;
                let report = commands::scene(provider, objects).await?;
                println!("{}", report.summary());
            }
            Command::Preview(_) => {}
        }
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn many_verbose_flags_pin_to_trace() {
        let mut args = vec!["simplyremade".to_string()];
        args.extend(std::iter::repeat_n("-v".to_string(), 200));
        args.extend(["resolve".to_string(), "block/stone".to_string()]);
        let cli = Cli::parse_from(args);
        assert_eq!(cli.log_level(LogLevel::Info), LogLevel::Trace);
    }

    #[test]
    fn mesh_args_build_an_object() {
        let cli = Cli::parse_from([
            "simplyremade",
            "-v",
            "mesh",
            "--kind",
            "item",
            "--path",
            "minecraft:item/apple",
            "--render-mode",
            "plane",
            "--orientation",
            "west",
        ]);
        assert_eq!(cli.verbose, 1);
        let Command::Mesh(args) = cli.cmd else {
            panic!("expected mesh command");
        };
        let config = EditorConfig {
            asset_roots: Vec::new(),
            ..EditorConfig::default()
        };
        let object = args.to_object(&config);
        assert_eq!(object.name, "apple");
        assert_eq!(object.orientation, Some(Orientation::West));
        assert_eq!(
            object.kind,
            ObjectKind::Item {
                item_path: "minecraft:item/apple".into(),
                render_mode: ItemRenderMode::Plane,
                use_generated: false,
            }
        );
    }
}
