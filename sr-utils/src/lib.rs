use std::path::{Path, PathBuf};

pub mod error;
pub mod model_file;
pub mod paths;
pub mod provider;
pub mod raster;

pub use error::AssetError;
pub use model_file::{Axis, ElementRotation, ModelDescriptor, ModelElement, ModelFace};
pub use paths::{
    is_generated_parent, normalize_model_path, normalize_texture_path, simplified_parent_name,
    strip_namespace,
};
pub use provider::{AssetProvider, DiskAssetProvider, MemoryAssetProvider};
pub use raster::RasterImage;

pub const SIMPLYREMADE_ASSETS_ROOT_ENV: &str = "SIMPLYREMADE_ASSETS_ROOT";

/// Directory holding the extracted asset pack (`<root>/<namespace>/models/...`).
pub fn simplyremade_assets_root() -> PathBuf {
    if let Ok(explicit) = std::env::var(SIMPLYREMADE_ASSETS_ROOT_ENV) {
        let path = PathBuf::from(explicit);
        if path.exists() {
            return path;
        }
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(exe_dir) = exe.parent()
    {
        let sibling_assets = exe_dir.join("assets");
        if sibling_assets.exists() {
            return sibling_assets;
        }
    }

    let repo_assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("../sr-editor/assets");
    if repo_assets.exists() {
        return repo_assets;
    }

    PathBuf::from("assets")
}

pub fn default_asset_roots() -> Vec<PathBuf> {
    let mut roots = vec![simplyremade_assets_root()];
    let data_dir = PathBuf::from("data/SimplyRemadeAssetsV1/assets");
    if !roots.iter().any(|p| p == &data_dir) {
        roots.push(data_dir);
    }
    roots
}
