use std::path::Path;

use image::RgbaImage;

use crate::gpu::{
    FilterMode, Gpu, PixelFormat, SamplerSettings, TextureArrayDesc, TextureDesc, TextureFormat, TextureId,
    TextureUnit, WrapMode,
};

use super::TextureError;
use super::texture_array::SlicePlan;

// ── TextureResource ───────────────────────────────────────────────────────────

/// One GPU texture: either a plain 2D image or a 2D array sliced from an
/// atlas.
///
/// A resource goes from unloaded to loaded exactly once. A second
/// [`generate`](Self::generate) or [`generate_array`](Self::generate_array)
/// is logged and ignored; the first upload stays in place. The GPU texture is
/// released by [`unload`](Self::unload).
///
/// The resource owns its GPU handle and cannot be duplicated:
///
/// ```compile_fail
/// let tex = tileworld::renderer::TextureResource::new();
/// let copy = tex.clone();
/// ```
#[derive(Debug, PartialEq)]
pub struct TextureResource {
    id: Option<TextureId>,
    width: u32,
    height: u32,
    is_array: bool,
    subimage_width: u32,
    subimage_height: u32,
    subimage_count: u32,
    internal_format: TextureFormat,
    pixel_format: PixelFormat,
    sampler: SamplerSettings,
    loaded: bool,
}

impl Default for TextureResource {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureResource {
    /// An unloaded RGBA texture with nearest filtering and clamped edges.
    pub fn new() -> Self {
        Self {
            id: None,
            width: 0,
            height: 0,
            is_array: false,
            subimage_width: 0,
            subimage_height: 0,
            subimage_count: 0,
            internal_format: TextureFormat::Rgba8,
            pixel_format: PixelFormat::Rgba,
            sampler: SamplerSettings::default(),
            loaded: false,
        }
    }

    /// Source pixels carry an alpha channel (`Rgba`) or not (`Rgb`).
    pub fn with_alpha(mut self, alpha: bool) -> Self {
        self.pixel_format = if alpha { PixelFormat::Rgba } else { PixelFormat::Rgb };
        self
    }

    pub fn with_formats(mut self, internal: TextureFormat, pixel: PixelFormat) -> Self {
        self.internal_format = internal;
        self.pixel_format = pixel;
        self
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.sampler.min_filter = filter;
        self.sampler.mag_filter = filter;
        self
    }

    pub fn with_wrap(mut self, wrap_s: WrapMode, wrap_t: WrapMode) -> Self {
        self.sampler.wrap_s = wrap_s;
        self.sampler.wrap_t = wrap_t;
        self
    }

    pub fn id(&self) -> Option<TextureId> { self.id }
    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn is_array(&self) -> bool { self.is_array }
    pub fn is_loaded(&self) -> bool { self.loaded }
    pub fn subimage_width(&self) -> u32 { self.subimage_width }
    pub fn subimage_height(&self) -> u32 { self.subimage_height }
    pub fn subimage_count(&self) -> u32 { self.subimage_count }
    pub fn internal_format(&self) -> TextureFormat { self.internal_format }
    pub fn pixel_format(&self) -> PixelFormat { self.pixel_format }
    pub fn sampler(&self) -> SamplerSettings { self.sampler }

    fn texture_desc(&self, width: u32, height: u32) -> TextureDesc {
        TextureDesc {
            width,
            height,
            format: self.internal_format,
            pixel_format: self.pixel_format,
            sampler: self.sampler,
        }
    }

    /// Upload `pixels` as a plain 2D texture.
    pub fn generate(
        &mut self,
        gpu: &mut dyn Gpu,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), TextureError> {
        if self.loaded {
            log::warn!("[texture] generate called on a loaded texture; keeping the existing {}x{} upload", self.width, self.height);
            return Ok(());
        }

        let id = gpu.create_texture_2d(&self.texture_desc(width, height), Some(pixels))?;

        self.id = Some(id);
        self.width = width;
        self.height = height;
        self.is_array = false;
        self.subimage_width = width;
        self.subimage_height = height;
        self.subimage_count = 1;
        self.loaded = true;
        Ok(())
    }

    /// Slice the atlas in `pixels` into `subimage_width × subimage_height`
    /// cells and upload them as the layers of a 2D array texture.
    ///
    /// The atlas is staged in a temporary 2D texture, each cell is copied to
    /// its layer (row-major, see [`SlicePlan`]), and the staging texture is
    /// released whether or not every copy succeeded. On failure nothing is
    /// left allocated and the resource stays unloaded.
    pub fn generate_array(
        &mut self,
        gpu: &mut dyn Gpu,
        width: u32,
        height: u32,
        subimage_width: u32,
        subimage_height: u32,
        pixels: &[u8],
    ) -> Result<(), TextureError> {
        if self.loaded {
            log::warn!(
                "[texture] generate_array called on a loaded texture; keeping the existing {} layer(s)",
                self.subimage_count
            );
            return Ok(());
        }

        let plan = SlicePlan::new(width, height, subimage_width, subimage_height)?;

        let staging = gpu.create_texture_2d(&self.texture_desc(width, height), Some(pixels))?;
        let array = match gpu.create_texture_array(&TextureArrayDesc {
            width: subimage_width,
            height: subimage_height,
            layers: plan.count(),
            format: self.internal_format,
            sampler: self.sampler,
        }) {
            Ok(id) => id,
            Err(e) => {
                gpu.destroy_texture(staging);
                return Err(e.into());
            }
        };

        let copied = plan.layers().try_for_each(|(layer, origin)| {
            gpu.copy_to_layer(staging, origin, array, layer, [subimage_width, subimage_height])
        });
        gpu.destroy_texture(staging);

        if let Err(e) = copied {
            gpu.destroy_texture(array);
            return Err(e.into());
        }

        log::debug!(
            "[texture] Sliced {}x{} atlas into {} layer(s) of {}x{}",
            width,
            height,
            plan.count(),
            subimage_width,
            subimage_height
        );

        self.id = Some(array);
        self.width = width;
        self.height = height;
        self.is_array = true;
        self.subimage_width = subimage_width;
        self.subimage_height = subimage_height;
        self.subimage_count = plan.count();
        self.loaded = true;
        Ok(())
    }

    /// Bind to `unit`. Returns `false` (and binds nothing) when unloaded.
    pub fn bind(&self, gpu: &mut dyn Gpu, unit: TextureUnit) -> bool {
        match self.id {
            Some(id) if self.loaded => {
                gpu.bind_texture(unit, id);
                true
            }
            _ => false,
        }
    }

    /// Release the GPU texture if one was generated. The resource can be
    /// generated again afterwards.
    pub fn unload(&mut self, gpu: &mut dyn Gpu) {
        let id = self.id.take();
        if let (Some(id), true) = (id, self.loaded) {
            gpu.destroy_texture(id);
        }
        self.loaded = false;
    }
}

// ── Image files ───────────────────────────────────────────────────────────────

/// Decode an image file to RGBA8.
pub fn decode_image<P: AsRef<Path>>(path: P) -> Result<RgbaImage, TextureError> {
    let path = path.as_ref();
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| TextureError::Image { path: path.display().to_string(), source })
}

/// Crop the rectangle from `top_left` (inclusive) to `bottom_right`
/// (exclusive) out of `image`.
pub fn crop_image(image: &RgbaImage, top_left: [u32; 2], bottom_right: [u32; 2]) -> Result<RgbaImage, TextureError> {
    let [x0, y0] = top_left;
    let [x1, y1] = bottom_right;
    if x1 <= x0 || y1 <= y0 || x1 > image.width() || y1 > image.height() {
        return Err(TextureError::InvalidRegion {
            top_left,
            bottom_right,
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image::imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image())
}
