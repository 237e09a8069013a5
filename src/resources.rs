//! Named resources shared by the client: worlds, textures, shaders, fonts
//! and sounds.
//!
//! The registry owns every resource. Lookups hand out borrows (textures and
//! fonts) or copyable GPU handles (shaders), never owning copies, so each GPU
//! object is released exactly once: when its key is reloaded or by
//! [`ResourceRegistry::teardown`].
//!
//! Load failures never abort. They are logged and, for worlds and textures,
//! a sentinel is stored under the key (a failed [`World`] or an unloaded
//! [`TextureResource`]) that renders as nothing.

use std::collections::HashMap;
use std::path::Path;

use crate::audio::{MusicTrack, SoundEffect};
use crate::gpu::{FilterMode, Gpu, ShaderId, ShaderProgramSource};
use crate::renderer::texture::{crop_image, decode_image};
use crate::renderer::{Font, TextureError, TextureResource};
use crate::world::{self, World};

/// Registry key of the built-in sprite shader.
pub const SPRITE_SHADER: &str = "sprite";
/// Registry key of the built-in array shader.
pub const ARRAY_SHADER: &str = "array";

#[derive(Default)]
pub struct ResourceRegistry {
    worlds: HashMap<String, World>,
    textures: HashMap<String, TextureResource>,
    shaders: HashMap<String, ShaderId>,
    fonts: HashMap<String, Font>,
    sounds: HashMap<String, SoundEffect>,
    music: HashMap<String, MusicTrack>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Worlds ───────────────────────────────────────────────────────────────

    /// Load the level document at `path` under `name`. A document that cannot
    /// be loaded stores the failed sentinel (tile size 0, no maps).
    pub fn load_world<P: AsRef<Path>>(&mut self, path: P, name: &str) -> &World {
        let world = world::load_world_from_path(path);
        self.worlds.insert(name.to_string(), world);
        &self.worlds[name]
    }

    pub fn insert_world(&mut self, name: &str, world: World) -> &World {
        self.worlds.insert(name.to_string(), world);
        &self.worlds[name]
    }

    pub fn get_world(&self, name: &str) -> Option<&World> {
        self.worlds.get(name)
    }

    // ── Textures ─────────────────────────────────────────────────────────────

    /// Load an image file as a plain 2D texture.
    pub fn load_texture<P: AsRef<Path>>(
        &mut self,
        gpu: &mut dyn Gpu,
        path: P,
        name: &str,
        filter: FilterMode,
    ) -> &TextureResource {
        let path = path.as_ref();
        let result = decode_image(path).and_then(|img| {
            let mut texture = TextureResource::new().with_filter(filter);
            texture.generate(gpu, img.width(), img.height(), img.as_raw())?;
            Ok(texture)
        });
        self.store_texture(gpu, name, path, result)
    }

    /// Load the rectangle `top_left..bottom_right` of an image file as a
    /// plain 2D texture.
    pub fn load_sub_texture<P: AsRef<Path>>(
        &mut self,
        gpu: &mut dyn Gpu,
        path: P,
        name: &str,
        top_left: [u32; 2],
        bottom_right: [u32; 2],
        filter: FilterMode,
    ) -> &TextureResource {
        let path = path.as_ref();
        let result = decode_image(path)
            .and_then(|img| crop_image(&img, top_left, bottom_right))
            .and_then(|img| {
                let mut texture = TextureResource::new().with_filter(filter);
                texture.generate(gpu, img.width(), img.height(), img.as_raw())?;
                Ok(texture)
            });
        self.store_texture(gpu, name, path, result)
    }

    /// Load an atlas image and slice it into an array texture of
    /// `subimage_width × subimage_height` layers.
    pub fn load_texture_array<P: AsRef<Path>>(
        &mut self,
        gpu: &mut dyn Gpu,
        path: P,
        name: &str,
        subimage_width: u32,
        subimage_height: u32,
        filter: FilterMode,
    ) -> &TextureResource {
        let path = path.as_ref();
        let result = decode_image(path).and_then(|img| {
            let mut texture = TextureResource::new().with_filter(filter);
            texture.generate_array(gpu, img.width(), img.height(), subimage_width, subimage_height, img.as_raw())?;
            Ok(texture)
        });
        self.store_texture(gpu, name, path, result)
    }

    /// Store an already generated texture under `name`.
    pub fn insert_texture(&mut self, gpu: &mut dyn Gpu, name: &str, texture: TextureResource) -> &TextureResource {
        if let Some(mut old) = self.textures.remove(name) {
            old.unload(gpu);
        }
        self.textures.insert(name.to_string(), texture);
        &self.textures[name]
    }

    fn store_texture(
        &mut self,
        gpu: &mut dyn Gpu,
        name: &str,
        path: &Path,
        result: Result<TextureResource, TextureError>,
    ) -> &TextureResource {
        let texture = result.unwrap_or_else(|e| {
            log::error!("[resources] Failed to load texture '{name}' from '{}': {e}", path.display());
            TextureResource::new()
        });
        self.insert_texture(gpu, name, texture)
    }

    pub fn get_texture(&self, name: &str) -> Option<&TextureResource> {
        self.textures.get(name)
    }

    // ── Shaders ──────────────────────────────────────────────────────────────

    /// Compile `source` under `name`. Returns `None` (and stores nothing) if
    /// compilation fails.
    pub fn load_shader(&mut self, gpu: &mut dyn Gpu, name: &str, source: &ShaderProgramSource) -> Option<ShaderId> {
        if let Some(old) = self.shaders.remove(name) {
            gpu.destroy_shader(old);
        }
        match gpu.compile_shader(source) {
            Ok(id) => {
                self.shaders.insert(name.to_string(), id);
                Some(id)
            }
            Err(e) => {
                log::error!("[resources] Failed to load shader '{name}': {e}");
                None
            }
        }
    }

    /// Compile the built-in sprite and array shaders under
    /// [`SPRITE_SHADER`] and [`ARRAY_SHADER`]. Returns whether both compiled.
    pub fn load_builtin_shaders(&mut self, gpu: &mut dyn Gpu) -> bool {
        let sprite = self.load_shader(gpu, SPRITE_SHADER, &ShaderProgramSource::builtin_sprite());
        let array = self.load_shader(gpu, ARRAY_SHADER, &ShaderProgramSource::builtin_array());
        sprite.is_some() && array.is_some()
    }

    pub fn get_shader(&self, name: &str) -> Option<ShaderId> {
        self.shaders.get(name).copied()
    }

    // ── Fonts ────────────────────────────────────────────────────────────────

    pub fn load_font<P: AsRef<Path>, Q: AsRef<Path>>(&mut self, glyphs: P, atlas: Q, name: &str) -> Option<&Font> {
        match Font::load(glyphs.as_ref(), atlas.as_ref()) {
            Ok(font) => {
                self.fonts.insert(name.to_string(), font);
                self.fonts.get(name)
            }
            Err(e) => {
                log::error!("[resources] Failed to load font '{name}': {e}");
                None
            }
        }
    }

    pub fn get_font(&self, name: &str) -> Option<&Font> {
        self.fonts.get(name)
    }

    // ── Audio ────────────────────────────────────────────────────────────────

    pub fn load_sound<P: AsRef<Path>>(&mut self, path: P, name: &str) -> Option<&SoundEffect> {
        match SoundEffect::load(path) {
            Ok(sound) => {
                self.sounds.insert(name.to_string(), sound);
                self.sounds.get(name)
            }
            Err(e) => {
                log::error!("[resources] Failed to load sound '{name}': {e}");
                None
            }
        }
    }

    pub fn get_sound(&self, name: &str) -> Option<&SoundEffect> {
        self.sounds.get(name)
    }

    pub fn load_music<P: AsRef<Path>>(&mut self, path: P, name: &str) -> Option<&MusicTrack> {
        match MusicTrack::load(path) {
            Ok(track) => {
                self.music.insert(name.to_string(), track);
                self.music.get(name)
            }
            Err(e) => {
                log::error!("[resources] Failed to load music '{name}': {e}");
                None
            }
        }
    }

    pub fn get_music(&self, name: &str) -> Option<&MusicTrack> {
        self.music.get(name)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Release every GPU handle and drop every resource.
    pub fn teardown(&mut self, gpu: &mut dyn Gpu) {
        for (_, mut texture) in self.textures.drain() {
            texture.unload(gpu);
        }
        for (_, shader) in self.shaders.drain() {
            gpu.destroy_shader(shader);
        }
        self.worlds.clear();
        self.fonts.clear();
        self.sounds.clear();
        self.music.clear();
        log::info!("[resources] All resources released");
    }
}
