//! In-memory world model built from a level document.
//!
//! ```text
//! World ─┬─ tilesets (defs.tilesets)
//!        └─ Map (one per level) ── Layer (one per layer instance) ── Tile
//! ```
//!
//! Everything is built once by [`loader`] and then only read by the render
//! loop.

pub mod layer;
pub mod loader;
pub mod map;
pub mod tile;
pub mod tileset;

pub use layer::{Layer, LayerKind, LayerTag};
pub use loader::{load_world, load_world_from_path, load_world_from_str};
pub use map::Map;
pub use tile::Tile;
pub use tileset::TilesetDef;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("failed to read level document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed level document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level document has no usable tile size (defaultGridSize = {0})")]
    InvalidTileSize(i64),

    #[error("tile ({x}, {y}) lies outside the {width}x{height} layer grid")]
    TileOutOfBounds { x: i64, y: i64, width: u32, height: u32 },

    #[error("layer '{layer}' uses tile size {layer_size}, map uses {map_size}")]
    TileSizeMismatch { layer: String, layer_size: u32, map_size: u32 },
}

// ── World ────────────────────────────────────────────────────────────────────

/// All maps of one level document plus the global tile size.
///
/// A `tile_size` of 0 is the "failed to load" sentinel: see [`World::failed`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct World {
    tile_size: u32,
    maps: Vec<Map>,
    tilesets: Vec<TilesetDef>,
}

impl World {
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size, maps: Vec::new(), tilesets: Vec::new() }
    }

    /// The sentinel returned when a document could not be loaded.
    pub fn failed() -> Self {
        Self::new(0)
    }

    pub fn is_loaded(&self) -> bool {
        self.tile_size != 0
    }

    pub fn tile_size(&self) -> u32 { self.tile_size }
    pub fn maps(&self) -> &[Map] { &self.maps }
    pub fn maps_mut(&mut self) -> &mut [Map] { &mut self.maps }
    pub fn tilesets(&self) -> &[TilesetDef] { &self.tilesets }

    pub fn map(&self, identifier: &str) -> Option<&Map> {
        self.maps.iter().find(|m| m.identifier == identifier)
    }

    pub fn tileset(&self, identifier: &str) -> Option<&TilesetDef> {
        self.tilesets.iter().find(|t| t.identifier == identifier)
    }

    pub fn push_map(&mut self, map: Map) {
        self.maps.push(map);
    }

    pub fn push_tileset(&mut self, tileset: TilesetDef) {
        self.tilesets.push(tileset);
    }
}
