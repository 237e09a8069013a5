use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tileworld::app::{Pipelines, load_world_assets, render_frame};
use tileworld::config::{ClientConfig, FontConfig};
use tileworld::gpu::{FilterMode, HeadlessGpu, ShaderKind, ShaderProgramSource};
use tileworld::resources::{ARRAY_SHADER, ResourceRegistry, SPRITE_SHADER};

/// A fresh directory under the system temp dir, unique per test.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tileworld-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_atlas(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
        .save(path)
        .unwrap();
}

const LEVEL: &str = r#"{
    "defaultGridSize": 16,
    "defs": { "tilesets": [ { "identifier": "Dungeon", "relPath": "dungeon.png", "pxWid": 64, "pxHei": 32, "uid": 1 } ] },
    "levels": [ { "identifier": "Entrance", "pxWid": 48, "pxHei": 32, "layerInstances": [
        { "__identifier": "Floor", "__type": "Tiles", "__tilesetDefUid": 1,
          "gridTiles": [ { "px": [0, 0], "t": 1 }, { "px": [32, 16], "t": 7 } ] }
    ] } ]
}"#;

// ── Worlds ────────────────────────────────────────────────────────────────

#[test]
fn world_is_stored_under_its_name() {
    let dir = scratch_dir("world");
    let path = dir.join("level.ldtk");
    std::fs::write(&path, LEVEL).unwrap();

    let mut registry = ResourceRegistry::new();
    assert_eq!(registry.load_world(&path, "main").tile_size(), 16);
    assert_eq!(registry.get_world("main").unwrap().maps()[0].identifier, "Entrance");
    assert!(registry.get_world("other").is_none());
}

#[test]
fn missing_world_stores_the_sentinel() {
    let mut registry = ResourceRegistry::new();
    let world = registry.load_world("/nonexistent/level.ldtk", "main");
    assert_eq!(world.tile_size(), 0);
    assert!(registry.get_world("main").unwrap().maps().is_empty());
}

// ── Textures ──────────────────────────────────────────────────────────────

#[test]
fn texture_array_from_png() {
    let dir = scratch_dir("array");
    let path = dir.join("atlas.png");
    write_atlas(&path, 64, 32);

    let mut gpu = HeadlessGpu::new();
    let mut registry = ResourceRegistry::new();
    let tex = registry.load_texture_array(&mut gpu, &path, "tiles", 16, 16, FilterMode::Nearest);
    assert!(tex.is_loaded());
    assert_eq!(tex.subimage_count(), 8);

    let id = registry.get_texture("tiles").unwrap().id().unwrap();
    let layer5 = gpu.texture(id).unwrap().layer_pixels(5).unwrap();
    assert_eq!(&layer5[..4], &[16, 16, 0, 255]);
}

#[test]
fn sub_texture_is_cropped() {
    let dir = scratch_dir("sub");
    let path = dir.join("sheet.png");
    write_atlas(&path, 32, 32);

    let mut gpu = HeadlessGpu::new();
    let mut registry = ResourceRegistry::new();
    let tex = registry.load_sub_texture(&mut gpu, &path, "door", [8, 4], [24, 12], FilterMode::Linear);
    assert!(tex.is_loaded());
    assert!(!tex.is_array());
    assert_eq!((tex.width(), tex.height()), (16, 8));

    let stored = gpu.texture(tex.id().unwrap()).unwrap();
    assert_eq!(&stored.pixels[..4], &[8, 4, 0, 255]);
}

#[test]
fn failed_texture_load_stores_unloaded_sentinel() {
    let mut gpu = HeadlessGpu::new();
    let mut registry = ResourceRegistry::new();
    let tex = registry.load_texture(&mut gpu, "/nonexistent/tiles.png", "tiles", FilterMode::Nearest);
    assert!(!tex.is_loaded());
    assert_eq!((tex.width(), tex.height()), (0, 0));
    assert!(registry.get_texture("tiles").is_some());
    assert_eq!(gpu.live_texture_count(), 0);
}

#[test]
fn reloading_a_key_releases_the_old_texture() {
    let dir = scratch_dir("reload");
    let path = dir.join("a.png");
    write_atlas(&path, 32, 16);

    let mut gpu = HeadlessGpu::new();
    let mut registry = ResourceRegistry::new();
    let first = registry.load_texture(&mut gpu, &path, "a", FilterMode::Nearest).id();
    let second = registry.load_texture_array(&mut gpu, &path, "a", 16, 16, FilterMode::Nearest).id();

    assert_ne!(first, second);
    assert_eq!(gpu.live_texture_count(), 1);
    assert!(gpu.texture(first.unwrap()).is_none());
}

// ── Shaders ───────────────────────────────────────────────────────────────

#[test]
fn builtin_shaders_are_registered() {
    let mut gpu = HeadlessGpu::new();
    let mut registry = ResourceRegistry::new();
    assert!(registry.load_builtin_shaders(&mut gpu));
    assert!(registry.get_shader(SPRITE_SHADER).is_some());
    assert!(registry.get_shader(ARRAY_SHADER).is_some());
}

#[test]
fn broken_shader_is_not_registered() {
    let mut gpu = HeadlessGpu::new();
    let mut registry = ResourceRegistry::new();
    let source = ShaderProgramSource {
        label: "broken".into(),
        kind: ShaderKind::Sprite,
        vertex: "fn vs_main( {".into(),
        fragment: String::new(),
    };
    assert!(registry.load_shader(&mut gpu, "broken", &source).is_none());
    assert!(registry.get_shader("broken").is_none());
}

// ── Lifecycle ─────────────────────────────────────────────────────────────

#[test]
fn teardown_releases_every_gpu_handle() {
    let dir = scratch_dir("teardown");
    let path = dir.join("atlas.png");
    write_atlas(&path, 32, 32);

    let mut gpu = HeadlessGpu::new();
    let mut registry = ResourceRegistry::new();
    registry.load_builtin_shaders(&mut gpu);
    registry.load_texture(&mut gpu, &path, "plain", FilterMode::Nearest);
    registry.load_texture_array(&mut gpu, &path, "array", 16, 16, FilterMode::Nearest);
    assert_eq!(gpu.live_texture_count(), 2);

    registry.teardown(&mut gpu);
    assert_eq!(gpu.live_texture_count(), 0);
    assert!(registry.get_texture("plain").is_none());
    assert!(registry.get_shader(SPRITE_SHADER).is_none());
}

// ── Client loading and frames ─────────────────────────────────────────────

#[test]
fn client_assets_load_and_render() {
    let dir = scratch_dir("client");
    std::fs::write(dir.join("level.ldtk"), LEVEL).unwrap();
    write_atlas(&dir.join("dungeon.png"), 64, 32);
    RgbaImage::from_pixel(16, 8, Rgba([255, 255, 255, 255])).save(dir.join("font.png")).unwrap();
    std::fs::write(
        dir.join("font.json"),
        r#"{ "F": { "x": 0, "y": 0, "w": 8, "h": 8 }, "P": { "x": 8, "y": 0, "w": 8, "h": 8 } }"#,
    )
    .unwrap();

    let config = ClientConfig {
        asset_root: dir.clone(),
        world: "level.ldtk".into(),
        font: Some(FontConfig { glyphs: "font.json".into(), atlas: "font.png".into() }),
        ..ClientConfig::default()
    };

    let mut gpu = HeadlessGpu::new();
    let mut registry = ResourceRegistry::new();
    let pipelines = Pipelines::load(&mut gpu, &mut registry).unwrap();
    assert_eq!(load_world_assets(&mut gpu, &mut registry, &config), 1);
    assert!(registry.get_texture("Dungeon").unwrap().is_array());

    gpu.clear_commands();
    let drawn = render_frame(&mut gpu, &registry, &pipelines, &config, Some("FP"));
    // Two tiles plus the overlay text.
    assert_eq!(drawn, 3);
    assert_eq!(gpu.draw_count(), 3);

    // The overlay's transient texture is released right after its draw.
    assert_eq!(gpu.live_texture_count(), 1);
}
