use glam::{Vec2, Vec3};
use serde_json::json;
use tileworld::gpu::{Gpu, GpuCommand, HeadlessGpu, ShaderProgramSource, TextureUnit};
use tileworld::renderer::{ArrayRenderer, SpriteRenderer, TextureResource, draw_map};
use tileworld::resources::ResourceRegistry;
use tileworld::world::load_world;

fn renderers(gpu: &mut HeadlessGpu) -> (SpriteRenderer, ArrayRenderer) {
    let sprite = gpu.compile_shader(&ShaderProgramSource::builtin_sprite()).unwrap();
    let array = gpu.compile_shader(&ShaderProgramSource::builtin_array()).unwrap();
    (SpriteRenderer::new(sprite), ArrayRenderer::new(array))
}

fn array_texture(gpu: &mut HeadlessGpu, width: u32, height: u32) -> TextureResource {
    let mut tex = TextureResource::new();
    tex.generate_array(gpu, width, height, 16, 16, &vec![255; (width * height * 4) as usize]).unwrap();
    tex
}

fn plain_texture(gpu: &mut HeadlessGpu, width: u32, height: u32) -> TextureResource {
    let mut tex = TextureResource::new();
    tex.generate(gpu, width, height, &vec![255; (width * height * 4) as usize]).unwrap();
    tex
}

// ── Array draw guards ─────────────────────────────────────────────────────

#[test]
fn unloaded_texture_submits_nothing() {
    let mut gpu = HeadlessGpu::new();
    let (_, arrays) = renderers(&mut gpu);
    gpu.clear_commands();

    let drew = arrays.draw_array_layer(&mut gpu, &TextureResource::new(), 0, Vec2::ZERO, Vec2::ZERO, 0.0, Vec3::ONE);
    assert!(!drew);
    assert!(gpu.commands.is_empty());
}

#[test]
fn plain_texture_submits_nothing() {
    let mut gpu = HeadlessGpu::new();
    let (_, arrays) = renderers(&mut gpu);
    let tex = plain_texture(&mut gpu, 16, 16);
    gpu.clear_commands();

    let drew = arrays.draw_array_layer(&mut gpu, &tex, 0, Vec2::ZERO, Vec2::ZERO, 0.0, Vec3::ONE);
    assert!(!drew);
    assert_eq!(gpu.draw_count(), 0);
    assert!(gpu.commands.is_empty());
}

#[test]
fn layer_past_the_end_is_skipped() {
    let mut gpu = HeadlessGpu::new();
    let (_, arrays) = renderers(&mut gpu);
    let tex = array_texture(&mut gpu, 32, 16);
    gpu.clear_commands();

    assert!(!arrays.draw_array_layer(&mut gpu, &tex, 2, Vec2::ZERO, Vec2::ZERO, 0.0, Vec3::ONE));
    assert!(gpu.commands.is_empty());
}

// ── Array draws ───────────────────────────────────────────────────────────

#[test]
fn draw_binds_array_unit_and_passes_layer() {
    let mut gpu = HeadlessGpu::new();
    let (_, arrays) = renderers(&mut gpu);
    let tex = array_texture(&mut gpu, 64, 32);
    gpu.clear_commands();

    assert!(arrays.draw_array_layer(&mut gpu, &tex, 5, Vec2::new(32.0, 48.0), Vec2::ZERO, 0.0, Vec3::ONE));

    assert_eq!(gpu.commands[0], GpuCommand::BindTexture { unit: TextureUnit::Array, id: tex.id().unwrap() });
    let (draw, bound) = gpu.draws().next().unwrap();
    assert_eq!(bound, tex.id());
    assert_eq!(draw.shader, arrays.shader());
    assert_eq!((draw.layer, draw.layer_count), (5, 8));
}

#[test]
fn zero_size_uses_subimage_size() {
    let mut gpu = HeadlessGpu::new();
    let (_, arrays) = renderers(&mut gpu);
    let tex = array_texture(&mut gpu, 64, 32);

    arrays.draw_array_layer(&mut gpu, &tex, 1, Vec2::new(32.0, 48.0), Vec2::ZERO, 0.0, Vec3::ONE);
    arrays.draw_array_layer(&mut gpu, &tex, 1, Vec2::new(32.0, 48.0), Vec2::new(40.0, 8.0), 0.0, Vec3::ONE);

    let corners: Vec<_> = gpu.draws().map(|(d, _)| d.model.transform_point3(Vec3::new(1.0, 1.0, 0.0))).collect();
    assert_eq!(corners[0], Vec3::new(48.0, 64.0, 0.0));
    assert_eq!(corners[1], Vec3::new(72.0, 56.0, 0.0));
}

#[test]
fn sprite_and_array_units_do_not_collide() {
    let mut gpu = HeadlessGpu::new();
    let (sprites, arrays) = renderers(&mut gpu);
    let sprite_tex = plain_texture(&mut gpu, 8, 8);
    let array_tex = array_texture(&mut gpu, 32, 16);

    assert!(sprites.draw_sprite(&mut gpu, &sprite_tex, Vec2::ZERO, Vec2::ZERO, 0.0, Vec3::ONE));
    assert!(arrays.draw_array_layer(&mut gpu, &array_tex, 1, Vec2::ZERO, Vec2::ZERO, 0.0, Vec3::ONE));
    assert!(sprites.draw_sprite(&mut gpu, &sprite_tex, Vec2::ZERO, Vec2::ZERO, 45.0, Vec3::ONE));

    assert_eq!(gpu.bound_texture(TextureUnit::Sprite), sprite_tex.id());
    assert_eq!(gpu.bound_texture(TextureUnit::Array), array_tex.id());
    let bound: Vec<_> = gpu.draws().map(|(_, t)| t).collect();
    assert_eq!(bound, vec![sprite_tex.id(), array_tex.id(), sprite_tex.id()]);
}

#[test]
fn sprite_renderer_skips_arrays() {
    let mut gpu = HeadlessGpu::new();
    let (sprites, _) = renderers(&mut gpu);
    let tex = array_texture(&mut gpu, 32, 16);
    gpu.clear_commands();
    assert!(!sprites.draw_sprite(&mut gpu, &tex, Vec2::ZERO, Vec2::ZERO, 0.0, Vec3::ONE));
    assert!(gpu.commands.is_empty());
}

// ── Map rendering ─────────────────────────────────────────────────────────

#[test]
fn map_draws_tiles_layers_back_to_front() {
    let mut gpu = HeadlessGpu::new();
    let (_, arrays) = renderers(&mut gpu);

    let world = load_world(&json!({
        "defaultGridSize": 16,
        "defs": { "tilesets": [
            { "identifier": "Fore", "relPath": "fore.png", "pxWid": 64, "pxHei": 32, "uid": 1 },
            { "identifier": "Back", "relPath": "back.png", "pxWid": 64, "pxHei": 32, "uid": 2 }
        ]},
        "levels": [{ "pxWid": 32, "pxHei": 32, "layerInstances": [
            { "__identifier": "Front", "__type": "Tiles", "__tilesetDefUid": 1,
              "gridTiles": [ { "px": [0, 0], "t": 3 } ] },
            { "__identifier": "Walls", "__type": "IntGrid", "__tilesetDefUid": 1,
              "gridTiles": [ { "px": [16, 16], "t": 1 } ] },
            { "__identifier": "Floor", "__type": "Tiles", "__tilesetDefUid": 2,
              "gridTiles": [ { "px": [0, 0], "t": 1 }, { "px": [16, 16], "t": 5 }, { "px": [16, 0], "t": 9 } ] }
        ]}]
    }));

    let mut registry = ResourceRegistry::new();
    let fore = array_texture(&mut gpu, 64, 32);
    let back = array_texture(&mut gpu, 64, 32);
    let (fore_id, back_id) = (fore.id(), back.id());
    registry.insert_texture(&mut gpu, "Fore", fore);
    registry.insert_texture(&mut gpu, "Back", back);
    gpu.clear_commands();

    let drawn = draw_map(&mut gpu, &arrays, &world.maps()[0], &registry);

    // Index 9 is past the 8 layers of "Back" and is not drawn.
    assert_eq!(drawn, 3);
    let draws: Vec<_> = gpu
        .draws()
        .map(|(d, t)| (t, d.layer, d.model.transform_point3(Vec3::ZERO)))
        .collect();
    assert_eq!(draws, vec![
        (back_id, 1, Vec3::new(0.0, 0.0, 0.0)),
        (back_id, 5, Vec3::new(16.0, 16.0, 0.0)),
        (fore_id, 3, Vec3::new(0.0, 0.0, 0.0)),
    ]);
}

#[test]
fn map_without_textures_draws_nothing() {
    let mut gpu = HeadlessGpu::new();
    let (_, arrays) = renderers(&mut gpu);
    let world = load_world(&json!({
        "defaultGridSize": 16,
        "levels": [{ "pxWid": 16, "pxHei": 16, "layerInstances": [
            { "__identifier": "Ground", "__type": "Tiles", "gridTiles": [ { "px": [0, 0], "t": 1 } ] }
        ]}]
    }));
    let mut registry = ResourceRegistry::new();
    registry.insert_texture(&mut gpu, "", TextureResource::new());
    gpu.clear_commands();

    assert_eq!(draw_map(&mut gpu, &arrays, &world.maps()[0], &registry), 0);
    assert!(gpu.commands.is_empty());
}
