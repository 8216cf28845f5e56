//! The seam between the core and wherever assets actually live.
//!
//! Every method is a suspension point: mesh builds await these calls and do all
//! other work synchronously in between.

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::model_file::ModelDescriptor;
use crate::raster::RasterImage;

mod disk;
mod memory;

pub use disk::DiskAssetProvider;
pub use memory::MemoryAssetProvider;

pub trait AssetProvider: Send + Sync {
    /// `path` may carry a namespace; providers normalise it themselves.
    fn load_model_descriptor(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<ModelDescriptor>> + Send;

    fn load_texture_image(&self, path: &str)
    -> impl Future<Output = Result<Arc<RasterImage>>> + Send;

    fn load_character_asset(&self, path: &str) -> impl Future<Output = Result<Arc<[u8]>>> + Send;
}

impl<P: AssetProvider> AssetProvider for Arc<P> {
    fn load_model_descriptor(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<ModelDescriptor>> + Send {
        (**self).load_model_descriptor(path)
    }

    fn load_texture_image(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Arc<RasterImage>>> + Send {
        (**self).load_texture_image(path)
    }

    fn load_character_asset(&self, path: &str) -> impl Future<Output = Result<Arc<[u8]>>> + Send {
        (**self).load_character_asset(path)
    }
}
