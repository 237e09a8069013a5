use glam::{Vec2, Vec3};

use crate::gpu::Gpu;
use crate::resources::ResourceRegistry;
use crate::world::{LayerKind, Map};

use super::array_pipeline::ArrayRenderer;

/// Draw every placed tile of `map`'s Tiles layers, back to front.
///
/// Each layer samples the array texture registered under its tileset name;
/// a tile's tileset index selects the array layer and its grid position
/// times the tile size gives the pixel position. Layers whose texture is
/// missing or not an array draw nothing. Returns the number of quads
/// submitted.
pub fn draw_map(gpu: &mut dyn Gpu, renderer: &ArrayRenderer, map: &Map, registry: &ResourceRegistry) -> usize {
    let tile_size = map.tile_size() as f32;
    let mut drawn = 0;

    for layer in map.layers_in_paint_order().filter(|l| l.kind() == LayerKind::Tiles) {
        let Some(texture) = registry.get_texture(layer.tileset_name()) else {
            log::trace!("[render] No texture for tileset '{}' of layer '{}'", layer.tileset_name(), layer.identifier);
            continue;
        };

        for tile in layer.placed_tiles() {
            let position = Vec2::new(tile.grid_x as f32 * tile_size, tile.grid_y as f32 * tile_size);
            if renderer.draw_array_layer(gpu, texture, tile.tileset_index, position, Vec2::ZERO, 0.0, Vec3::ONE) {
                drawn += 1;
            }
        }
    }

    drawn
}
