pub mod array_pipeline;
pub mod map_renderer;
pub mod sprite_pipeline;
pub mod text;
pub mod texture;
pub mod texture_array;
pub mod transform;

pub use array_pipeline::ArrayRenderer;
pub use map_renderer::draw_map;
pub use sprite_pipeline::SpriteRenderer;
pub use text::{Font, FontError, Glyph};
pub use texture::TextureResource;
pub use texture_array::SlicePlan;

use thiserror::Error;

use crate::gpu::GpuError;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image '{path}': {source}")]
    Image { path: String, source: image::ImageError },

    #[error("sub-image size {width}x{height} is invalid")]
    InvalidSubImageSize { width: u32, height: u32 },

    #[error("atlas {atlas_width}x{atlas_height} holds no whole {subimage_width}x{subimage_height} sub-image")]
    NoSubImages { atlas_width: u32, atlas_height: u32, subimage_width: u32, subimage_height: u32 },

    #[error("region {top_left:?}..{bottom_right:?} does not fit the {width}x{height} image")]
    InvalidRegion { top_left: [u32; 2], bottom_right: [u32; 2], width: u32, height: u32 },

    #[error(transparent)]
    Gpu(#[from] GpuError),
}
