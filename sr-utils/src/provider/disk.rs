use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::AssetProvider;
use crate::error::{AssetError, Result};
use crate::model_file::ModelDescriptor;
use crate::paths::{normalize_model_path, normalize_texture_path};
use crate::raster::RasterImage;

/// Reads `<root>/<namespace>/{models,textures}/...` from extracted asset packs.
///
/// Configured namespaces are searched first, then every other namespace folder
/// found under each root, so parents that live in a mod namespace still resolve
/// after the core has stripped the `namespace:` prefix.
#[derive(Debug, Clone)]
pub struct DiskAssetProvider {
    roots: Vec<PathBuf>,
    namespaces: Vec<String>,
}

impl DiskAssetProvider {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            namespaces: vec!["minecraft".to_string()],
        }
    }

    pub fn with_namespaces(mut self, namespaces: Vec<String>) -> Self {
        if !namespaces.is_empty() {
            self.namespaces = namespaces;
        }
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    async fn namespaces_under(&self, root: &Path) -> Vec<String> {
        let mut out = self.namespaces.clone();
        let Ok(mut entries) = tokio::fs::read_dir(root).await else {
            return out;
        };
        let mut extra = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_dir = entry
                .file_type()
                .await
                .map(|kind| kind.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !out.iter().any(|ns| ns == name) {
                    extra.push(name.to_string());
                }
            }
        }
        extra.sort();
        out.extend(extra);
        out
    }

    async fn find_file(&self, kind: &str, rel: &str) -> Option<PathBuf> {
        for root in &self.roots {
            for namespace in self.namespaces_under(root).await {
                let path = root.join(&namespace).join(kind).join(rel);
                if is_file(&path).await {
                    return Some(path);
                }
            }
        }
        None
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

impl AssetProvider for DiskAssetProvider {
    async fn load_model_descriptor(&self, path: &str) -> Result<ModelDescriptor> {
        let rel = format!("{}.json", normalize_model_path(path));
        let Some(full) = self.find_file("models", &rel).await else {
            return Err(AssetError::not_found(path));
        };
        debug!("model {path} -> {:?}", full);
        let raw = tokio::fs::read_to_string(&full)
            .await
            .map_err(|source| AssetError::Io {
                path: full.clone(),
                source,
            })?;
        ModelDescriptor::from_json(&raw).map_err(|source| AssetError::Parse { path: full, source })
    }

    async fn load_texture_image(&self, path: &str) -> Result<Arc<RasterImage>> {
        let rel = format!("{}.png", normalize_texture_path(path));
        let Some(full) = self.find_file("textures", &rel).await else {
            return Err(AssetError::not_found(path));
        };
        let bytes = tokio::fs::read(&full)
            .await
            .map_err(|source| AssetError::Io {
                path: full.clone(),
                source,
            })?;
        let image = RasterImage::decode(&bytes)
            .map_err(|source| AssetError::Decode { path: full, source })?;
        Ok(Arc::new(image))
    }

    async fn load_character_asset(&self, path: &str) -> Result<Arc<[u8]>> {
        let candidates: Vec<PathBuf> = if Path::new(path).is_absolute() {
            vec![PathBuf::from(path)]
        } else {
            self.roots.iter().map(|root| root.join(path)).collect()
        };
        for full in candidates {
            if !is_file(&full).await {
                continue;
            }
            let bytes = tokio::fs::read(&full)
                .await
                .map_err(|source| AssetError::Io { path: full, source })?;
            return Ok(bytes.into());
        }
        Err(AssetError::not_found(path))
    }
}
