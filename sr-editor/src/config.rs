use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use sr_scene::ItemRenderMode;
use tracing::Level;

pub const DEFAULT_CONFIG_FILE: &str = "simplyremade.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Moves `steps` levels toward trace (positive) or error (negative).
    pub fn shifted(self, steps: i32) -> Self {
        const ORDER: [LogLevel; 5] = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let idx = ORDER.iter().position(|l| *l == self).unwrap_or(2) as i32;
        ORDER[idx.saturating_add(steps).clamp(0, 4) as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub asset_roots: Vec<PathBuf>,
    pub namespaces: Vec<String>,
    pub item_render_mode: ItemRenderMode,
    pub log_level: LogLevel,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            asset_roots: sr_utils::default_asset_roots(),
            namespaces: vec!["minecraft".to_string()],
            item_render_mode: ItemRenderMode::Voxel,
            log_level: LogLevel::Info,
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        toml::from_str(raw).context("parse editor config")
    }

    /// `explicit` must exist; otherwise `simplyremade.toml` in the working
    /// directory is used when present, else defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::read(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::read(local)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_assets_root_override(std::env::var(sr_utils::SIMPLYREMADE_ASSETS_ROOT_ENV).ok());
        Ok(config)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("in '{}'", path.display()))
    }

    /// The environment root replaces the first configured root.
    pub fn apply_assets_root_override(&mut self, value: Option<String>) {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return;
        };
        let root = PathBuf::from(value);
        match self.asset_roots.first_mut() {
            Some(first) => *first = root,
            None => self.asset_roots.push(root),
        }
    }
}
