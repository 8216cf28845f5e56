use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::AssetProvider;
use crate::error::{AssetError, Result};
use crate::model_file::ModelDescriptor;
use crate::paths::{normalize_model_path, normalize_texture_path};
use crate::raster::RasterImage;

/// Provider backed by in-process maps. Keys are normalised the same way lookups are.
#[derive(Default)]
pub struct MemoryAssetProvider {
    models: HashMap<String, ModelDescriptor>,
    textures: HashMap<String, Arc<RasterImage>>,
    characters: HashMap<String, Arc<[u8]>>,
    texture_requests: Mutex<Vec<String>>,
}

impl MemoryAssetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_model(&mut self, path: &str, model: ModelDescriptor) -> &mut Self {
        self.models.insert(normalize_model_path(path), model);
        self
    }

    /// Panics on malformed json; meant for fixtures.
    pub fn insert_model_json(&mut self, path: &str, raw: &str) -> &mut Self {
        let model = ModelDescriptor::from_json(raw)
            .unwrap_or_else(|err| panic!("fixture model {path} is invalid: {err}"));
        self.insert_model(path, model)
    }

    pub fn insert_texture(&mut self, path: &str, image: RasterImage) -> &mut Self {
        self.textures
            .insert(normalize_texture_path(path), Arc::new(image));
        self
    }

    pub fn insert_character(&mut self, path: &str, bytes: Vec<u8>) -> &mut Self {
        self.characters.insert(path.to_string(), bytes.into());
        self
    }

    /// Normalised texture paths requested so far, in request order.
    pub fn texture_requests(&self) -> Vec<String> {
        self.texture_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl AssetProvider for MemoryAssetProvider {
    async fn load_model_descriptor(&self, path: &str) -> Result<ModelDescriptor> {
        self.models
            .get(&normalize_model_path(path))
            .cloned()
            .ok_or_else(|| AssetError::not_found(path))
    }

    async fn load_texture_image(&self, path: &str) -> Result<Arc<RasterImage>> {
        let key = normalize_texture_path(path);
        if let Ok(mut requests) = self.texture_requests.lock() {
            requests.push(key.clone());
        }
        self.textures
            .get(&key)
            .cloned()
            .ok_or_else(|| AssetError::not_found(path))
    }

    async fn load_character_asset(&self, path: &str) -> Result<Arc<[u8]>> {
        self.characters
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::not_found(path))
    }
}
