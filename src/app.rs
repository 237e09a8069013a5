use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::WindowId;

use crate::audio::AudioDevice;
use crate::config::ClientConfig;
use crate::gpu::{Gpu, WgpuGpu};
use crate::renderer::transform::orthographic_projection;
use crate::renderer::{ArrayRenderer, SpriteRenderer, draw_map};
use crate::resources::{ARRAY_SHADER, ResourceRegistry, SPRITE_SHADER};
use crate::window::{apply_window_settings, window_attributes};

/// Registry key of the configured font.
pub const DEFAULT_FONT: &str = "default";
/// Registry key of the configured background music.
pub const DEFAULT_MUSIC: &str = "music";

/// Log `message` and terminate. Used only for platform failures the client
/// cannot run without.
fn fatal(message: impl std::fmt::Display) -> ! {
    log::error!("{message}");
    std::process::exit(1)
}

// ── Loading ──────────────────────────────────────────────────────────────────

/// The sprite and array pipelines, built from the registry's built-in shaders.
#[derive(Copy, Clone, Debug)]
pub struct Pipelines {
    pub sprites: SpriteRenderer,
    pub arrays: ArrayRenderer,
}

impl Pipelines {
    pub fn load(gpu: &mut dyn Gpu, registry: &mut ResourceRegistry) -> Option<Self> {
        if !registry.load_builtin_shaders(gpu) {
            return None;
        }
        Some(Self {
            sprites: SpriteRenderer::new(registry.get_shader(SPRITE_SHADER)?),
            arrays: ArrayRenderer::new(registry.get_shader(ARRAY_SHADER)?),
        })
    }
}

/// Load the configured world and one array texture per tileset, registered
/// under the tileset identifier. Returns the number of tileset textures that
/// loaded.
pub fn load_world_assets(gpu: &mut dyn Gpu, registry: &mut ResourceRegistry, config: &ClientConfig) -> usize {
    let tilesets = registry
        .load_world(config.asset_path(&config.world), &config.world_name)
        .tilesets()
        .to_vec();

    let mut loaded = 0;
    for tileset in &tilesets {
        let texture = registry.load_texture_array(
            gpu,
            config.asset_path(&tileset.rel_path),
            &tileset.identifier,
            config.subimage_width,
            config.subimage_height,
            config.filter,
        );
        if texture.is_loaded() {
            loaded += 1;
        }
    }

    if let Some(font) = &config.font {
        registry.load_font(config.asset_path(&font.glyphs), config.asset_path(&font.atlas), DEFAULT_FONT);
    }

    log::info!("[client] Loaded {loaded}/{} tileset texture(s)", tilesets.len());
    loaded
}

/// Record one frame: the first map of the configured world and, when
/// `overlay` is given, that text in the top-left corner.
pub fn render_frame(
    gpu: &mut dyn Gpu,
    registry: &ResourceRegistry,
    pipelines: &Pipelines,
    config: &ClientConfig,
    overlay: Option<&str>,
) -> usize {
    gpu.set_projection(orthographic_projection(
        config.window.logical_width as f32,
        config.window.logical_height as f32,
    ));

    let mut drawn = 0;
    if let Some(map) = registry.get_world(&config.world_name).and_then(|w| w.maps().first()) {
        drawn += draw_map(gpu, &pipelines.arrays, map, registry);
    }

    if let (Some(text), Some(font)) = (overlay, registry.get_font(DEFAULT_FONT)) {
        match font.draw_text(gpu, &pipelines.sprites, text, Vec2::new(4.0, 4.0), [255, 255, 255]) {
            Ok(true) => drawn += 1,
            Ok(false) => {}
            Err(e) => log::warn!("[client] Failed to draw overlay text: {e}"),
        }
    }

    drawn
}

// ── Frame timing ─────────────────────────────────────────────────────────────

struct FpsCounter {
    window_start: Option<Instant>,
    frames: u32,
    text: String,
}

impl FpsCounter {
    fn new() -> Self {
        Self { window_start: None, frames: 0, text: String::new() }
    }

    fn tick(&mut self, now: Instant) -> &str {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let elapsed = now.duration_since(start).as_secs_f32();
        if elapsed >= 1.0 {
            self.text = format!("FPS {:.0}", self.frames as f32 / elapsed);
            self.frames = 0;
            self.window_start = Some(now);
        }
        &self.text
    }
}

// ── Client (winit ApplicationHandler) ────────────────────────────────────────

struct Running {
    gpu: WgpuGpu,
    registry: ResourceRegistry,
    pipelines: Pipelines,
    // Kept alive for as long as the music plays.
    _audio: Option<AudioDevice>,
}

pub struct Client {
    config: ClientConfig,
    running: Option<Running>,
    fps: FpsCounter,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config, running: None, fps: FpsCounter::new() }
    }

    /// Open the window and run until it is closed.
    pub fn run(mut self) {
        let event_loop = EventLoop::new().unwrap_or_else(|e| fatal(format!("[client] Failed to create event loop: {e}")));
        if let Err(e) = event_loop.run_app(&mut self) {
            fatal(format!("[client] Event loop failed: {e}"));
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Running {
        let window = event_loop
            .create_window(window_attributes(&self.config.window))
            .unwrap_or_else(|e| fatal(format!("[client] Failed to create window: {e}")));
        let window = Arc::new(window);
        apply_window_settings(&window, &self.config.window);

        let mut gpu = pollster::block_on(WgpuGpu::new(window))
            .unwrap_or_else(|e| fatal(format!("[client] GPU initialisation failed: {e}")));

        let mut audio = if self.config.audio_enabled {
            Some(AudioDevice::open().unwrap_or_else(|e| fatal(format!("[client] {e}"))))
        } else {
            None
        };

        let mut registry = ResourceRegistry::new();
        let pipelines = Pipelines::load(&mut gpu, &mut registry)
            .unwrap_or_else(|| fatal("[client] Built-in shaders failed to compile"));
        load_world_assets(&mut gpu, &mut registry, &self.config);

        if let (Some(device), Some(path)) = (audio.as_mut(), &self.config.music) {
            if let Some(track) = registry.load_music(self.config.asset_path(path), DEFAULT_MUSIC) {
                if let Err(e) = device.play_music(track, 1.0) {
                    log::warn!("[audio] {e}");
                }
            }
        }

        Running { gpu, registry, pipelines, _audio: audio }
    }
}

impl ApplicationHandler for Client {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_none() {
            self.running = Some(self.start(event_loop));
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.as_ref() {
            running.gpu.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else { return };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => running.gpu.resize(size),

            WindowEvent::RedrawRequested => {
                let overlay = self.config.show_fps.then(|| self.fps.tick(Instant::now()).to_string());

                running.gpu.begin_frame();
                render_frame(&mut running.gpu, &running.registry, &running.pipelines, &self.config, overlay.as_deref());
                if let Err(e) = running.gpu.end_frame() {
                    log::error!("[client] {e}");
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut running) = self.running.take() {
            running.registry.teardown(&mut running.gpu);
        }
    }
}
