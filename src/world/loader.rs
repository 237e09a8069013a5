//! Level document → [`World`].
//!
//! The document is the JSON level format:
//!
//! ```json
//! {
//!   "defaultGridSize": 16,
//!   "defs": { "tilesets": [ { "identifier": "Grass", "relPath": "grass.png",
//!                              "pxWid": 256, "pxHei": 256, "uid": 1 } ] },
//!   "levels": [ { "identifier": "Level_0", "pxWid": 320, "pxHei": 240,
//!                 "layerInstances": [ { "__identifier": "Ground", "__type": "Tiles",
//!                                       "__tilesetDefUid": 1,
//!                                       "gridTiles": [ { "px": [16, 0], "t": 3 } ] } ] } ]
//! }
//! ```
//!
//! Loading never fails hard: an unreadable or unusable document produces
//! [`World::failed`] and an error log record.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::{Layer, LayerKind, LayerTag, Map, TilesetDef, World, WorldError};

// ── Raw (JSON-facing) types ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawDocument {
    #[serde(rename = "defaultGridSize")]
    default_grid_size: i64,
    #[serde(default)]
    defs: RawDefs,
    #[serde(default)]
    levels: Vec<RawLevel>,
}

#[derive(Deserialize, Default)]
struct RawDefs {
    #[serde(default)]
    tilesets: Vec<TilesetDef>,
}

#[derive(Deserialize)]
struct RawLevel {
    #[serde(default)]
    identifier: String,
    #[serde(rename = "pxWid", default)]
    px_wid: u32,
    #[serde(rename = "pxHei", default)]
    px_hei: u32,
    // Null for levels saved in separate files.
    #[serde(rename = "layerInstances", default)]
    layer_instances: Option<Vec<RawLayerInstance>>,
}

#[derive(Deserialize)]
struct RawLayerInstance {
    #[serde(rename = "__identifier", default)]
    identifier: String,
    #[serde(rename = "__type", default)]
    layer_type: String,
    #[serde(rename = "__tilesetDefUid", default)]
    tileset_def_uid: Option<i64>,
    #[serde(rename = "__tilesetRelPath", default)]
    tileset_rel_path: Option<String>,
    #[serde(rename = "gridTiles", default)]
    grid_tiles: Vec<RawGridTile>,
}

#[derive(Deserialize)]
struct RawGridTile {
    px: [i64; 2],
    t: u32,
}

// ── Public entry points ──────────────────────────────────────────────────────

/// Build a [`World`] from an already-parsed document.
///
/// Returns [`World::failed`] (tile size 0, no maps) when the document is
/// empty or lacks a usable `defaultGridSize`.
pub fn load_world(document: &Value) -> World {
    match build_world(document) {
        Ok(world) => world,
        Err(e) => {
            log::error!("[world] Failed to load level document: {e}");
            World::failed()
        }
    }
}

/// Parse `json` and build a [`World`] from it.
pub fn load_world_from_str(json: &str) -> World {
    match serde_json::from_str::<Value>(json) {
        Ok(document) => load_world(&document),
        Err(e) => {
            log::error!("[world] Failed to parse level document: {e}");
            World::failed()
        }
    }
}

/// Read and load the level document at `path`.
pub fn load_world_from_path<P: AsRef<Path>>(path: P) -> World {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(json) => load_world_from_str(&json),
        Err(e) => {
            log::error!("[world] Failed to read level document '{}': {e}", path.display());
            World::failed()
        }
    }
}

// ── Construction ─────────────────────────────────────────────────────────────

fn build_world(document: &Value) -> Result<World, WorldError> {
    let raw = RawDocument::deserialize(document)?;

    let tile_size = match u32::try_from(raw.default_grid_size) {
        Ok(size) if size > 0 => size,
        _ => return Err(WorldError::InvalidTileSize(raw.default_grid_size)),
    };

    let mut world = World::new(tile_size);
    for tileset in raw.defs.tilesets {
        world.push_tileset(tileset);
    }

    for level in &raw.levels {
        let map = build_map(level, tile_size, world.tilesets())?;
        world.push_map(map);
    }

    log::info!(
        "[world] Loaded {} map(s), {} tileset(s), tile size {}",
        world.maps().len(),
        world.tilesets().len(),
        tile_size
    );
    Ok(world)
}

fn build_map(level: &RawLevel, tile_size: u32, tilesets: &[TilesetDef]) -> Result<Map, WorldError> {
    let mut map = Map::from_pixels(level.identifier.as_str(), tile_size, level.px_wid, level.px_hei);

    for instance in level.layer_instances.iter().flatten() {
        let tag = LayerTag::parse(&instance.layer_type);
        if let LayerTag::Unrecognized(name) = &tag {
            log::warn!(
                "[world] Layer '{}' in '{}' has unknown type '{name}'; treating it as IntGrid",
                instance.identifier,
                level.identifier
            );
        }
        let kind = tag.kind();

        let mut layer = Layer::new(
            instance.identifier.as_str(),
            kind,
            resolve_tileset_name(instance, tilesets),
            tile_size,
            map.width_tiles(),
            map.height_tiles(),
        );

        if kind == LayerKind::Tiles {
            place_grid_tiles(&mut layer, &instance.grid_tiles, tile_size, &level.identifier);
        }

        map.push_layer(layer)?;
    }

    Ok(map)
}

/// Apply `gridTiles` in document order; later entries overwrite earlier ones.
/// Entries that fall outside the grid are skipped.
fn place_grid_tiles(layer: &mut Layer, grid_tiles: &[RawGridTile], tile_size: u32, level: &str) {
    let size = i64::from(tile_size);
    for entry in grid_tiles {
        let [px, py] = entry.px;
        let (tx, ty) = (px.div_euclid(size), py.div_euclid(size));

        let placed = match (u32::try_from(tx), u32::try_from(ty)) {
            (Ok(x), Ok(y)) => layer.set_tile(x, y, entry.t),
            _ => Err(WorldError::TileOutOfBounds {
                x: tx,
                y: ty,
                width: layer.width_tiles(),
                height: layer.height_tiles(),
            }),
        };

        if let Err(e) = placed {
            log::warn!(
                "[world] Skipping tile at pixel ({px}, {py}) in layer '{}' of '{level}': {e}",
                layer.identifier
            );
        }
    }
}

fn resolve_tileset_name(instance: &RawLayerInstance, tilesets: &[TilesetDef]) -> String {
    let by_uid = instance
        .tileset_def_uid
        .and_then(|uid| tilesets.iter().find(|t| t.uid == Some(uid)));
    let by_path = || {
        instance
            .tileset_rel_path
            .as_deref()
            .and_then(|path| tilesets.iter().find(|t| t.rel_path == path))
    };

    by_uid
        .or_else(by_path)
        .map(|t| t.identifier.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn negative_pixel_coordinates_are_skipped() {
        let world = load_world(&json!({
            "defaultGridSize": 16,
            "levels": [{ "pxWid": 32, "pxHei": 32, "layerInstances": [
                { "__identifier": "Ground", "__type": "Tiles",
                  "gridTiles": [ { "px": [-16, 0], "t": 2 }, { "px": [0, 0], "t": 1 } ] }
            ]}]
        }));
        let ground = &world.maps()[0].layers()[0];
        assert_eq!(ground.placed_tiles().count(), 1);
        assert_eq!(ground.tile(0, 0).unwrap().tileset_index, 1);
    }

    #[test]
    fn tileset_resolved_by_uid_then_rel_path() {
        let world = load_world(&json!({
            "defaultGridSize": 8,
            "defs": { "tilesets": [
                { "identifier": "Grass", "relPath": "grass.png", "pxWid": 64, "pxHei": 64, "uid": 4 },
                { "identifier": "Cave",  "relPath": "cave.png",  "pxWid": 64, "pxHei": 64, "uid": 9 }
            ]},
            "levels": [{ "pxWid": 8, "pxHei": 8, "layerInstances": [
                { "__identifier": "A", "__type": "Tiles", "__tilesetDefUid": 9 },
                { "__identifier": "B", "__type": "Tiles", "__tilesetRelPath": "grass.png" },
                { "__identifier": "C", "__type": "IntGrid" }
            ]}]
        }));
        let map = &world.maps()[0];
        assert_eq!(map.layer("A").unwrap().tileset_name(), "Cave");
        assert_eq!(map.layer("B").unwrap().tileset_name(), "Grass");
        assert_eq!(map.layer("C").unwrap().tileset_name(), "");
    }

    #[test]
    fn null_layer_instances_yield_empty_map() {
        let world = load_world(&json!({
            "defaultGridSize": 16,
            "levels": [{ "identifier": "External", "pxWid": 64, "pxHei": 32, "layerInstances": null }]
        }));
        let map = world.map("External").unwrap();
        assert!(map.layers().is_empty());
        assert_eq!((map.width_tiles(), map.height_tiles()), (4, 2));
    }

    #[test]
    fn zero_or_negative_grid_size_fails() {
        assert!(!load_world(&json!({ "defaultGridSize": 0, "levels": [] })).is_loaded());
        assert!(!load_world(&json!({ "defaultGridSize": -16, "levels": [] })).is_loaded());
    }
}
