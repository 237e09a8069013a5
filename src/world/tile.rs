/// One grid cell's tileset reference.
///
/// `tileset_index` selects the sub-image of the layer's tileset (and thus the
/// array-texture layer) drawn in this cell; `0` means the cell is empty.
/// Tiles are plain values: editing a cell replaces the whole tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    pub tileset_index: u32,
    /// Column of the cell within its layer.
    pub grid_x: u32,
    /// Row of the cell within its layer.
    pub grid_y: u32,
}

impl Tile {
    /// The value every cell holds until a tile is placed in it.
    pub const EMPTY: Self = Self { tileset_index: 0, grid_x: 0, grid_y: 0 };

    pub fn new(tileset_index: u32, grid_x: u32, grid_y: u32) -> Self {
        Self { tileset_index, grid_x, grid_y }
    }

    pub fn is_empty(&self) -> bool {
        self.tileset_index == 0
    }
}
