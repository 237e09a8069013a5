//! The GPU capability surface the renderer depends on.
//!
//! Everything above this module talks to the GPU only through the [`Gpu`]
//! trait. Two backends implement it:
//! - [`WgpuGpu`] draws to a winit window through wgpu.
//! - [`HeadlessGpu`] keeps textures as CPU pixel buffers and records every
//!   command, for tests and tooling that run without a display.

pub mod headless;
pub mod wgpu_backend;

pub use headless::{GpuCommand, HeadlessGpu};
pub use wgpu_backend::WgpuGpu;

use glam::{Mat4, Vec3};
use thiserror::Error;

// ── Handles ──────────────────────────────────────────────────────────────────

/// Opaque handle to a texture owned by a [`Gpu`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Opaque handle to a compiled shader program owned by a [`Gpu`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

// ── Formats and sampling ─────────────────────────────────────────────────────

/// Storage format of a texture on the GPU.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TextureFormat {
    #[default]
    Rgba8,
    Bgra8,
}

/// Layout of the pixel data handed to the GPU.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PixelFormat {
    #[default]
    Rgba,
    Rgb,
    Bgra,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct SamplerSettings {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

/// Parameters of a plain 2D texture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub pixel_format: PixelFormat,
    pub sampler: SamplerSettings,
}

/// Parameters of a 2D array texture: `layers` images of `width × height`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureArrayDesc {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub format: TextureFormat,
    pub sampler: SamplerSettings,
}

// ── Binding slots ────────────────────────────────────────────────────────────

/// Texture binding slot. Plain sprites and array textures use separate
/// slots so both can be bound within one frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureUnit {
    Sprite,
    Array,
}

impl TextureUnit {
    pub fn index(&self) -> usize {
        match self {
            TextureUnit::Sprite => 0,
            TextureUnit::Array => 1,
        }
    }
}

// ── Shaders ──────────────────────────────────────────────────────────────────

/// Which texture binding a shader program samples.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderKind {
    /// Samples a plain 2D texture on [`TextureUnit::Sprite`].
    Sprite,
    /// Samples a 2D array texture on [`TextureUnit::Array`].
    Array,
}

impl ShaderKind {
    pub fn unit(&self) -> TextureUnit {
        match self {
            ShaderKind::Sprite => TextureUnit::Sprite,
            ShaderKind::Array => TextureUnit::Array,
        }
    }
}

/// WGSL sources for one shader program. Entry points are `vs_main` and
/// `fs_main`.
#[derive(Clone, Debug)]
pub struct ShaderProgramSource {
    pub label: String,
    pub kind: ShaderKind,
    pub vertex: String,
    pub fragment: String,
}

impl ShaderProgramSource {
    pub fn builtin_sprite() -> Self {
        Self {
            label: "sprite".into(),
            kind: ShaderKind::Sprite,
            vertex: include_str!("shaders/quad.vert.wgsl").into(),
            fragment: include_str!("shaders/sprite.frag.wgsl").into(),
        }
    }

    pub fn builtin_array() -> Self {
        Self {
            label: "array".into(),
            kind: ShaderKind::Array,
            vertex: include_str!("shaders/quad.vert.wgsl").into(),
            fragment: include_str!("shaders/array.frag.wgsl").into(),
        }
    }
}

/// Shader pipeline stage, for error reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Parse a WGSL stage with naga so errors surface as values instead of
/// device-lost panics.
pub(crate) fn validate_wgsl(source: &str, stage: ShaderStage, label: &str) -> Result<(), GpuError> {
    naga::front::wgsl::parse_str(source)
        .map(|_| ())
        .map_err(|e| GpuError::ShaderCompile {
            label: label.to_string(),
            stage,
            message: e.emit_to_string(source),
        })
}

// ── Draw submission ──────────────────────────────────────────────────────────

/// One textured quad: the unit quad transformed by `model`, sampled from the
/// texture bound to the shader's unit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QuadDraw {
    pub shader: ShaderId,
    pub model: Mat4,
    pub tint: Vec3,
    /// Array layer to sample (ignored by sprite shaders).
    pub layer: u32,
    /// Number of layers in the bound array texture.
    pub layer_count: u32,
}

/// Vertices of the unit quad: two triangles, `[x, y, u, v]` per vertex.
pub const UNIT_QUAD: [[f32; 4]; 6] = [
    [0.0, 1.0, 0.0, 1.0],
    [1.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, 0.0],
];

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),

    #[error("texture {0:?} is not an array texture")]
    NotAnArray(TextureId),

    #[error("texture size {width}x{height}x{layers} is invalid")]
    InvalidSize { width: u32, height: u32, layers: u32 },

    #[error("pixel data holds {actual} bytes, expected {expected}")]
    PixelDataSize { expected: usize, actual: usize },

    #[error("copy region ({x}, {y}) {width}x{height} into layer {layer} is out of range")]
    CopyOutOfRange { x: u32, y: u32, width: u32, height: u32, layer: u32 },

    #[error("shader '{label}' failed to compile ({stage} stage):\n{message}")]
    ShaderCompile { label: String, stage: ShaderStage, message: String },

    #[error("no suitable GPU adapter: {0}")]
    Adapter(String),

    #[error("failed to create GPU device: {0}")]
    Device(String),

    #[error("failed to create window surface: {0}")]
    Surface(String),

    #[error("failed to acquire frame: {0}")]
    Frame(String),
}

// ── Gpu ──────────────────────────────────────────────────────────────────────

/// Retained-state GPU interface.
///
/// Binding state (`bind_texture`, `set_projection`) persists until changed
/// and is shared by every caller; draw code must bind what it samples before
/// each draw.
pub trait Gpu {
    /// Create a 2D texture, optionally uploading `pixels` laid out as
    /// `desc.pixel_format`.
    fn create_texture_2d(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<TextureId, GpuError>;

    /// Allocate uninitialised storage for a 2D array texture.
    fn create_texture_array(&mut self, desc: &TextureArrayDesc) -> Result<TextureId, GpuError>;

    /// Copy the `size` region at `src_origin` of the 2D texture `src` into
    /// layer `layer` of the array texture `dst`.
    fn copy_to_layer(
        &mut self,
        src: TextureId,
        src_origin: [u32; 2],
        dst: TextureId,
        layer: u32,
        size: [u32; 2],
    ) -> Result<(), GpuError>;

    fn destroy_texture(&mut self, id: TextureId);

    fn compile_shader(&mut self, source: &ShaderProgramSource) -> Result<ShaderId, GpuError>;

    fn destroy_shader(&mut self, id: ShaderId);

    fn bind_texture(&mut self, unit: TextureUnit, id: TextureId);

    /// Projection shared by every draw until changed; set once per frame.
    fn set_projection(&mut self, projection: Mat4);

    fn draw_quad(&mut self, draw: &QuadDraw);

    fn begin_frame(&mut self);

    fn end_frame(&mut self) -> Result<(), GpuError>;
}

/// Repack `pixels` as tightly packed RGBA8.
pub(crate) fn to_rgba(pixels: &[u8], format: PixelFormat) -> Vec<u8> {
    match format {
        PixelFormat::Rgba => pixels.to_vec(),
        PixelFormat::Bgra => pixels
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0], p[3]])
            .collect(),
        PixelFormat::Rgb => pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 0xFF])
            .collect(),
    }
}
