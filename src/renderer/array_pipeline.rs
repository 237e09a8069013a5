use glam::{Vec2, Vec3};

use crate::gpu::{Gpu, QuadDraw, ShaderId, TextureUnit};

use super::texture::TextureResource;
use super::transform::model_transform;

/// Draws single layers of array textures as transformed quads.
///
/// Array textures are bound on [`TextureUnit::Array`], so sprites drawn on
/// [`TextureUnit::Sprite`] in the same frame keep their binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArrayRenderer {
    shader: ShaderId,
}

impl ArrayRenderer {
    /// `shader` must be an array shader (`ShaderKind::Array`).
    pub fn new(shader: ShaderId) -> Self {
        Self { shader }
    }

    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    /// Draw layer `layer` of `texture` at `position`.
    ///
    /// A zero `size` draws at the texture's sub-image size. Rotation is in
    /// degrees about the quad's centre. Returns whether a draw was submitted:
    /// unloaded textures, plain 2D textures and layers past the end are
    /// skipped without touching GPU state.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_array_layer(
        &self,
        gpu: &mut dyn Gpu,
        texture: &TextureResource,
        layer: u32,
        position: Vec2,
        size: Vec2,
        rotation: f32,
        tint: Vec3,
    ) -> bool {
        if !texture.is_loaded() || !texture.is_array() {
            return false;
        }
        if layer >= texture.subimage_count() {
            log::trace!("[render] Layer {layer} is past the {} layer(s) of the array texture", texture.subimage_count());
            return false;
        }

        let size = if size == Vec2::ZERO {
            Vec2::new(texture.subimage_width() as f32, texture.subimage_height() as f32)
        } else {
            size
        };

        if !texture.bind(gpu, TextureUnit::Array) {
            return false;
        }
        gpu.draw_quad(&QuadDraw {
            shader: self.shader,
            model: model_transform(position, size, rotation),
            tint,
            layer,
            layer_count: texture.subimage_count(),
        });
        true
    }
}
