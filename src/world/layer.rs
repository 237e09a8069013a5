use super::{Tile, WorldError};

// ── LayerKind ────────────────────────────────────────────────────────────────

/// The four layer kinds of the level format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Integer grid values (collision, regions). Parsed, never drawn here.
    IntGrid,
    /// Entity placements, handled by the entity subsystem.
    Entities,
    /// Hand-placed tiles. The only kind drawn through the array-texture path.
    Tiles,
    /// Rule-generated tiles.
    AutoLayer,
}

impl LayerKind {
    pub fn as_tag(&self) -> &'static str {
        match self {
            LayerKind::IntGrid => "IntGrid",
            LayerKind::Entities => "Entities",
            LayerKind::Tiles => "Tiles",
            LayerKind::AutoLayer => "AutoLayer",
        }
    }
}

// ── LayerTag ─────────────────────────────────────────────────────────────────

/// A parsed `__type` tag.
///
/// Tags outside the four known kinds are kept as `Unrecognized` so the
/// loader can report them; they resolve to [`LayerKind::IntGrid`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerTag {
    Known(LayerKind),
    Unrecognized(String),
}

impl LayerTag {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "IntGrid" => LayerTag::Known(LayerKind::IntGrid),
            "Entities" => LayerTag::Known(LayerKind::Entities),
            "Tiles" => LayerTag::Known(LayerKind::Tiles),
            "AutoLayer" => LayerTag::Known(LayerKind::AutoLayer),
            other => LayerTag::Unrecognized(other.to_string()),
        }
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            LayerTag::Known(kind) => *kind,
            LayerTag::Unrecognized(_) => LayerKind::IntGrid,
        }
    }
}

// ── Layer ────────────────────────────────────────────────────────────────────

/// A 2D grid of [`Tile`]s of one kind, indexed `tiles[y][x]`.
///
/// The grid always holds exactly `height_tiles` rows of `width_tiles` cells;
/// cells without a placed tile hold [`Tile::EMPTY`].
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub identifier: String,
    kind: LayerKind,
    tileset_name: String,
    tile_size: u32,
    width_tiles: u32,
    height_tiles: u32,
    tiles: Vec<Vec<Tile>>,
}

impl Layer {
    pub fn new(
        identifier: impl Into<String>,
        kind: LayerKind,
        tileset_name: impl Into<String>,
        tile_size: u32,
        width_tiles: u32,
        height_tiles: u32,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            tileset_name: tileset_name.into(),
            tile_size,
            width_tiles,
            height_tiles,
            tiles: vec![vec![Tile::EMPTY; width_tiles as usize]; height_tiles as usize],
        }
    }

    pub fn kind(&self) -> LayerKind { self.kind }
    pub fn tileset_name(&self) -> &str { &self.tileset_name }
    pub fn tile_size(&self) -> u32 { self.tile_size }
    pub fn width_tiles(&self) -> u32 { self.width_tiles }
    pub fn height_tiles(&self) -> u32 { self.height_tiles }
    pub fn tile_count(&self) -> usize { self.width_tiles as usize * self.height_tiles as usize }

    /// Rows of the grid, top to bottom.
    pub fn tiles(&self) -> &[Vec<Tile>] {
        &self.tiles
    }

    pub fn tile(&self, x: u32, y: u32) -> Option<&Tile> {
        self.tiles.get(y as usize)?.get(x as usize)
    }

    /// Tile under a pixel coordinate, using truncating division by the tile size.
    pub fn tile_at_pixel(&self, px: u32, py: u32) -> Option<&Tile> {
        if self.tile_size == 0 {
            return None;
        }
        self.tile(px / self.tile_size, py / self.tile_size)
    }

    /// Place a tile with `tileset_index` at `(x, y)`, replacing whatever was
    /// there. Index `0` stores [`Tile::EMPTY`].
    pub fn set_tile(&mut self, x: u32, y: u32, tileset_index: u32) -> Result<(), WorldError> {
        let (width, height) = (self.width_tiles, self.height_tiles);
        let cell = self
            .tiles
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
            .ok_or(WorldError::TileOutOfBounds { x: x as i64, y: y as i64, width, height })?;
        *cell = if tileset_index == 0 { Tile::EMPTY } else { Tile::new(tileset_index, x, y) };
        Ok(())
    }

    /// Reset a cell to the empty tile.
    pub fn clear_tile(&mut self, x: u32, y: u32) -> Result<(), WorldError> {
        self.set_tile(x, y, 0)
    }

    /// Reallocate the grid to `width × height`.
    ///
    /// Cells inside both the old and new bounds keep their tile; every new
    /// cell is filled with [`Tile::EMPTY`].
    pub fn resize(&mut self, width_tiles: u32, height_tiles: u32) {
        let mut tiles = vec![vec![Tile::EMPTY; width_tiles as usize]; height_tiles as usize];
        for (row, old_row) in tiles.iter_mut().zip(&self.tiles) {
            for (cell, old) in row.iter_mut().zip(old_row) {
                *cell = *old;
            }
        }
        self.tiles = tiles;
        self.width_tiles = width_tiles;
        self.height_tiles = height_tiles;
    }

    /// All non-empty cells in row-major order.
    pub fn placed_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter().flatten().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles_layer(w: u32, h: u32) -> Layer {
        Layer::new("Ground", LayerKind::Tiles, "Grass", 16, w, h)
    }

    fn assert_grid_shape(layer: &Layer) {
        assert_eq!(layer.tiles().len(), layer.height_tiles() as usize);
        for row in layer.tiles() {
            assert_eq!(row.len(), layer.width_tiles() as usize);
        }
    }

    #[test]
    fn new_layer_is_fully_populated_with_empty_tiles() {
        let layer = tiles_layer(3, 2);
        assert_grid_shape(&layer);
        assert!(layer.tiles().iter().flatten().all(|t| *t == Tile::EMPTY));
        assert_eq!(layer.tile_count(), 6);
    }

    #[test]
    fn set_tile_replaces_cell() {
        let mut layer = tiles_layer(3, 2);
        layer.set_tile(2, 1, 9).unwrap();
        assert_eq!(layer.tile(2, 1), Some(&Tile::new(9, 2, 1)));
        layer.set_tile(2, 1, 4).unwrap();
        assert_eq!(layer.tile(2, 1).unwrap().tileset_index, 4);
    }

    #[test]
    fn cleared_cell_equals_the_empty_tile() {
        let mut layer = tiles_layer(3, 2);
        layer.set_tile(2, 1, 9).unwrap();
        layer.clear_tile(2, 1).unwrap();
        assert_eq!(layer.tile(2, 1), Some(&Tile::EMPTY));
        layer.set_tile(1, 1, 0).unwrap();
        assert_eq!(layer.tile(1, 1), Some(&Tile::EMPTY));
        assert_eq!(layer.placed_tiles().count(), 0);
    }

    #[test]
    fn set_tile_out_of_bounds_is_an_error() {
        let mut layer = tiles_layer(3, 2);
        let err = layer.set_tile(3, 0, 1).unwrap_err();
        assert!(matches!(err, WorldError::TileOutOfBounds { x: 3, y: 0, width: 3, height: 2 }));
        assert!(layer.set_tile(0, 2, 1).is_err());
    }

    #[test]
    fn resize_grows_and_keeps_existing_cells() {
        let mut layer = tiles_layer(2, 2);
        layer.set_tile(1, 1, 5).unwrap();
        layer.resize(4, 3);
        assert_grid_shape(&layer);
        assert_eq!(layer.tile(1, 1).unwrap().tileset_index, 5);
        assert!(layer.tile(3, 2).unwrap().is_empty());
    }

    #[test]
    fn resize_shrinks_and_drops_outside_cells() {
        let mut layer = tiles_layer(4, 4);
        layer.set_tile(3, 3, 2).unwrap();
        layer.set_tile(0, 0, 1).unwrap();
        layer.resize(2, 1);
        assert_grid_shape(&layer);
        assert_eq!(layer.tile(0, 0).unwrap().tileset_index, 1);
        assert_eq!(layer.tile(3, 3), None);
        assert_eq!(layer.placed_tiles().count(), 1);
    }

    #[test]
    fn tile_at_pixel_truncates() {
        let mut layer = tiles_layer(4, 4);
        layer.set_tile(2, 1, 7).unwrap();
        assert_eq!(layer.tile_at_pixel(33, 16).unwrap().tileset_index, 7);
        assert_eq!(layer.tile_at_pixel(47, 31).unwrap().tileset_index, 7);
        assert_eq!(layer.tile_at_pixel(64, 0), None);
    }

    #[test]
    fn unrecognized_tag_resolves_to_int_grid() {
        let tag = LayerTag::parse("Decals");
        assert_eq!(tag, LayerTag::Unrecognized("Decals".into()));
        assert_eq!(tag.kind(), LayerKind::IntGrid);
        assert_eq!(LayerTag::parse("Tiles").kind(), LayerKind::Tiles);
        assert_eq!(LayerKind::AutoLayer.as_tag(), "AutoLayer");
    }
}
