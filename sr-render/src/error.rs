use sr_utils::AssetError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeshError>;

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("[mesh] asset not found: {0}")]
    NotFound(String),

    #[error("[mesh] circular parent reference at {0}")]
    CircularReference(String),

    #[error("[mesh] unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("[mesh] model {model} is missing texture #{slot}")]
    MissingTexture { slot: String, model: String },
}

impl MeshError {
    pub fn missing_texture(slot: impl Into<String>, model: impl Into<String>) -> Self {
        Self::MissingTexture {
            slot: slot.into(),
            model: model.into(),
        }
    }
}

impl From<AssetError> for MeshError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::NotFound(path) => Self::NotFound(path),
            other => Self::NotFound(other.to_string()),
        }
    }
}
