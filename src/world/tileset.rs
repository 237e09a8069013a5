use serde::Deserialize;

/// A tileset definition from the level document's `defs.tilesets` list.
///
/// The atlas image at `rel_path` is sliced into `tile_size × tile_size`
/// cells in row-major order; the cell number is the tileset index stored in
/// [`Tile`](super::Tile)s.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TilesetDef {
    pub identifier: String,
    #[serde(rename = "relPath", default)]
    pub rel_path: String,
    /// Atlas width in pixels.
    #[serde(rename = "pxWid", default)]
    pub px_wid: u32,
    /// Atlas height in pixels.
    #[serde(rename = "pxHei", default)]
    pub px_hei: u32,
    #[serde(default)]
    pub uid: Option<i64>,
}

impl TilesetDef {
    pub fn width_tiles(&self, tile_size: u32) -> u32 {
        if tile_size == 0 { 0 } else { self.px_wid / tile_size }
    }

    pub fn height_tiles(&self, tile_size: u32) -> u32 {
        if tile_size == 0 { 0 } else { self.px_hei / tile_size }
    }

    pub fn tile_count(&self, tile_size: u32) -> u32 {
        self.width_tiles(tile_size).saturating_mul(self.height_tiles(tile_size))
    }

    /// Tileset index of the cell at column `x`, row `y` of the atlas, or
    /// `None` when the cell lies outside the sliceable area.
    pub fn index_at(&self, x: u32, y: u32, tile_size: u32) -> Option<u32> {
        let cols = self.width_tiles(tile_size);
        if x >= cols || y >= self.height_tiles(tile_size) {
            return None;
        }
        y.checked_mul(cols)?.checked_add(x)
    }
}
