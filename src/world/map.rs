use super::{Layer, Tile, WorldError};

/// One level: an ordered stack of [`Layer`]s sharing a tile size.
///
/// # Paint order
/// Layer 0 is the topmost (foreground) layer, as in the level format, so the
/// render order is the **reverse** of storage order: the last layer is drawn
/// first and layer 0 is drawn last. [`Map::layers_in_paint_order`] is the
/// only iteration renderers should use.
#[derive(Clone, Debug, PartialEq)]
pub struct Map {
    pub identifier: String,
    tile_size: u32,
    width_tiles: u32,
    height_tiles: u32,
    layers: Vec<Layer>,
}

impl Map {
    pub fn new(identifier: impl Into<String>, tile_size: u32, width_tiles: u32, height_tiles: u32) -> Self {
        Self {
            identifier: identifier.into(),
            tile_size,
            width_tiles,
            height_tiles,
            layers: Vec::new(),
        }
    }

    /// Build an empty map from its pixel size, truncating partial tiles.
    pub fn from_pixels(identifier: impl Into<String>, tile_size: u32, px_wid: u32, px_hei: u32) -> Self {
        let (w, h) = if tile_size == 0 { (0, 0) } else { (px_wid / tile_size, px_hei / tile_size) };
        Self::new(identifier, tile_size, w, h)
    }

    pub fn tile_size(&self) -> u32 { self.tile_size }
    pub fn width_tiles(&self) -> u32 { self.width_tiles }
    pub fn height_tiles(&self) -> u32 { self.height_tiles }
    pub fn layers(&self) -> &[Layer] { &self.layers }

    pub fn layer(&self, identifier: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.identifier == identifier)
    }

    pub fn layer_mut(&mut self, identifier: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.identifier == identifier)
    }

    /// Append a layer below the existing ones.
    ///
    /// The layer must use the map's tile size; its grid is resized to the
    /// map's dimensions if they differ.
    pub fn push_layer(&mut self, mut layer: Layer) -> Result<(), WorldError> {
        if layer.tile_size() != self.tile_size {
            return Err(WorldError::TileSizeMismatch {
                layer: layer.identifier.clone(),
                layer_size: layer.tile_size(),
                map_size: self.tile_size,
            });
        }
        if layer.width_tiles() != self.width_tiles || layer.height_tiles() != self.height_tiles {
            layer.resize(self.width_tiles, self.height_tiles);
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Layers back to front: storage order reversed.
    pub fn layers_in_paint_order(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter().rev()
    }

    /// Change the map size, resizing every layer with it.
    pub fn resize(&mut self, width_tiles: u32, height_tiles: u32) {
        self.width_tiles = width_tiles;
        self.height_tiles = height_tiles;
        for layer in &mut self.layers {
            layer.resize(width_tiles, height_tiles);
        }
    }

    /// Topmost non-empty tile at a grid coordinate.
    pub fn tile_at(&self, x: u32, y: u32) -> Option<&Tile> {
        self.layers
            .iter()
            .filter_map(|l| l.tile(x, y))
            .find(|t| !t.is_empty())
    }

    /// Topmost non-empty tile under a pixel coordinate.
    pub fn tile_at_pixel(&self, px: u32, py: u32) -> Option<&Tile> {
        if self.tile_size == 0 {
            return None;
        }
        self.tile_at(px / self.tile_size, py / self.tile_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::LayerKind;

    fn layer(name: &str, w: u32, h: u32) -> Layer {
        Layer::new(name, LayerKind::Tiles, "Grass", 16, w, h)
    }

    #[test]
    fn from_pixels_uses_truncating_division() {
        let map = Map::from_pixels("Level_0", 16, 40, 33);
        assert_eq!(map.width_tiles(), 2);
        assert_eq!(map.height_tiles(), 2);
    }

    #[test]
    fn paint_order_is_reverse_of_storage() {
        let mut map = Map::new("Level_0", 16, 2, 2);
        for name in ["Foreground", "Middle", "Background"] {
            map.push_layer(layer(name, 2, 2)).unwrap();
        }
        let order: Vec<&str> = map.layers_in_paint_order().map(|l| l.identifier.as_str()).collect();
        assert_eq!(order, ["Background", "Middle", "Foreground"]);
    }

    #[test]
    fn push_layer_rejects_foreign_tile_size() {
        let mut map = Map::new("Level_0", 16, 2, 2);
        let err = map.push_layer(Layer::new("Big", LayerKind::Tiles, "", 32, 2, 2)).unwrap_err();
        assert!(matches!(err, WorldError::TileSizeMismatch { layer_size: 32, map_size: 16, .. }));
        assert!(map.layers().is_empty());
    }

    #[test]
    fn push_layer_fits_grid_to_map() {
        let mut map = Map::new("Level_0", 16, 3, 2);
        map.push_layer(layer("Ground", 1, 1)).unwrap();
        let ground = map.layer("Ground").unwrap();
        assert_eq!((ground.width_tiles(), ground.height_tiles()), (3, 2));
    }

    #[test]
    fn resize_propagates_to_every_layer() {
        let mut map = Map::new("Level_0", 16, 2, 2);
        map.push_layer(layer("A", 2, 2)).unwrap();
        map.push_layer(layer("B", 2, 2)).unwrap();
        map.resize(5, 4);
        for l in map.layers() {
            assert_eq!(l.tiles().len(), 4);
            assert!(l.tiles().iter().all(|row| row.len() == 5));
        }
    }

    #[test]
    fn tile_queries_prefer_topmost_layer() {
        let mut map = Map::new("Level_0", 16, 2, 2);
        map.push_layer(layer("Top", 2, 2)).unwrap();
        map.push_layer(layer("Bottom", 2, 2)).unwrap();
        map.layer_mut("Bottom").unwrap().set_tile(1, 0, 3).unwrap();
        assert_eq!(map.tile_at(1, 0).unwrap().tileset_index, 3);
        map.layer_mut("Top").unwrap().set_tile(1, 0, 8).unwrap();
        assert_eq!(map.tile_at_pixel(20, 5).unwrap().tileset_index, 8);
        assert_eq!(map.tile_at(0, 1), None);
    }
}
