use glam::{Vec2, Vec3};

use crate::gpu::{Gpu, QuadDraw, ShaderId, TextureUnit};

use super::texture::TextureResource;
use super::transform::model_transform;

/// Draws plain 2D textures as transformed quads on [`TextureUnit::Sprite`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpriteRenderer {
    shader: ShaderId,
}

impl SpriteRenderer {
    pub fn new(shader: ShaderId) -> Self {
        Self { shader }
    }

    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    /// Draw `texture` at `position`. A zero `size` uses the texture's pixel
    /// size. Array textures and unloaded textures are skipped.
    pub fn draw_sprite(
        &self,
        gpu: &mut dyn Gpu,
        texture: &TextureResource,
        position: Vec2,
        size: Vec2,
        rotation: f32,
        tint: Vec3,
    ) -> bool {
        if !texture.is_loaded() || texture.is_array() {
            return false;
        }
        let size = if size == Vec2::ZERO {
            Vec2::new(texture.width() as f32, texture.height() as f32)
        } else {
            size
        };

        if !texture.bind(gpu, TextureUnit::Sprite) {
            return false;
        }
        gpu.draw_quad(&QuadDraw {
            shader: self.shader,
            model: model_transform(position, size, rotation),
            tint,
            layer: 0,
            layer_count: 1,
        });
        true
    }
}
