use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::gpu::FilterMode;
use crate::window::WindowConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io { path: String, source: std::io::Error },

    #[error("malformed config '{path}': {source}")]
    Parse { path: String, source: serde_json::Error },
}

/// Bitmap font files, relative to the asset root.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FontConfig {
    pub glyphs: PathBuf,
    pub atlas: PathBuf,
}

/// Client settings, read from a JSON file. Every field has a default.
///
/// ```json
/// {
///   "window": { "title": "Dungeon", "physical_width": 1280, "physical_height": 720 },
///   "asset_root": "resource",
///   "world": "world.ldtk",
///   "subimage_width": 16,
///   "subimage_height": 16,
///   "font": { "glyphs": "font.json", "atlas": "font.png" },
///   "music": "theme.ogg",
///   "filter": "nearest"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub window: WindowConfig,
    /// Directory that tileset `relPath`s and every other asset path resolve against.
    pub asset_root: PathBuf,
    /// Level document, relative to `asset_root`.
    pub world: PathBuf,
    /// Registry name the world is stored under.
    pub world_name: String,
    pub subimage_width: u32,
    pub subimage_height: u32,
    pub font: Option<FontConfig>,
    pub music: Option<PathBuf>,
    pub audio_enabled: bool,
    pub show_fps: bool,
    pub filter: FilterMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            asset_root: PathBuf::from("resource"),
            world: PathBuf::from("world.ldtk"),
            world_name: "main".to_string(),
            subimage_width: 16,
            subimage_height: 16,
            font: None,
            music: None,
            audio_enabled: true,
            show_fps: false,
            filter: FilterMode::Nearest,
        }
    }
}

impl ClientConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// [`load`](Self::load), falling back to defaults (with a warning) when
    /// the file is missing or malformed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("[config] {e}; using defaults");
                Self::default()
            }
        }
    }

    /// `relative` resolved against the asset root.
    pub fn asset_path<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.asset_root.join(relative)
    }
}
