use std::collections::HashMap;

use glam::Mat4;

use super::{
    Gpu, GpuError, QuadDraw, ShaderId, ShaderKind, ShaderProgramSource, ShaderStage, TextureArrayDesc,
    TextureDesc, TextureId, TextureUnit, to_rgba, validate_wgsl,
};

/// A command observed by [`HeadlessGpu`], in submission order.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCommand {
    CreateTexture { id: TextureId, width: u32, height: u32 },
    CreateTextureArray { id: TextureId, width: u32, height: u32, layers: u32 },
    CopyToLayer { src: TextureId, src_origin: [u32; 2], dst: TextureId, layer: u32, size: [u32; 2] },
    DestroyTexture(TextureId),
    CompileShader { id: ShaderId, kind: ShaderKind },
    DestroyShader(ShaderId),
    BindTexture { unit: TextureUnit, id: TextureId },
    SetProjection(Mat4),
    /// A quad draw, with the texture that was bound to the shader's unit.
    Draw { draw: QuadDraw, texture: Option<TextureId> },
    BeginFrame,
    EndFrame,
}

/// CPU-side texture: RGBA8 pixels, layers stored one after another.
#[derive(Clone, Debug)]
pub struct HeadlessTexture {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub is_array: bool,
    pub pixels: Vec<u8>,
}

impl HeadlessTexture {
    /// RGBA8 pixels of one layer.
    pub fn layer_pixels(&self, layer: u32) -> Option<&[u8]> {
        if layer >= self.layers {
            return None;
        }
        let len = self.width as usize * self.height as usize * 4;
        let start = layer as usize * len;
        self.pixels.get(start..start + len)
    }
}

/// A [`Gpu`] that runs without a device.
///
/// Textures are real pixel buffers (copies between them are performed), so
/// array slicing can be checked pixel by pixel. Every call is appended to
/// [`HeadlessGpu::commands`].
#[derive(Default)]
pub struct HeadlessGpu {
    pub commands: Vec<GpuCommand>,
    textures: HashMap<TextureId, HeadlessTexture>,
    shaders: HashMap<ShaderId, ShaderKind>,
    bound: [Option<TextureId>; 2],
    next_id: u32,
    /// When set, the next `copy_to_layer` call fails. Lets callers exercise
    /// partial-failure cleanup.
    pub fail_next_copy: bool,
}

impl HeadlessGpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self, id: TextureId) -> Option<&HeadlessTexture> {
        self.textures.get(&id)
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn bound_texture(&self, unit: TextureUnit) -> Option<TextureId> {
        self.bound[unit.index()]
    }

    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| matches!(c, GpuCommand::Draw { .. })).count()
    }

    pub fn draws(&self) -> impl Iterator<Item = (&QuadDraw, Option<TextureId>)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            GpuCommand::Draw { draw, texture } => Some((draw, *texture)),
            _ => None,
        })
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl Gpu for HeadlessGpu {
    fn create_texture_2d(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<TextureId, GpuError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GpuError::InvalidSize { width: desc.width, height: desc.height, layers: 1 });
        }
        let texel_count = desc.width as usize * desc.height as usize;
        let rgba = match pixels {
            Some(data) => {
                let expected = texel_count * desc.pixel_format.bytes_per_pixel();
                if data.len() < expected {
                    return Err(GpuError::PixelDataSize { expected, actual: data.len() });
                }
                to_rgba(&data[..expected], desc.pixel_format)
            }
            None => vec![0; texel_count * 4],
        };

        let id = TextureId(self.allocate_id());
        self.textures.insert(id, HeadlessTexture {
            width: desc.width,
            height: desc.height,
            layers: 1,
            is_array: false,
            pixels: rgba,
        });
        self.commands.push(GpuCommand::CreateTexture { id, width: desc.width, height: desc.height });
        Ok(id)
    }

    fn create_texture_array(&mut self, desc: &TextureArrayDesc) -> Result<TextureId, GpuError> {
        if desc.width == 0 || desc.height == 0 || desc.layers == 0 {
            return Err(GpuError::InvalidSize { width: desc.width, height: desc.height, layers: desc.layers });
        }
        let id = TextureId(self.allocate_id());
        let len = desc.width as usize * desc.height as usize * desc.layers as usize * 4;
        self.textures.insert(id, HeadlessTexture {
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
            is_array: true,
            pixels: vec![0; len],
        });
        self.commands.push(GpuCommand::CreateTextureArray {
            id,
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
        });
        Ok(id)
    }

    fn copy_to_layer(
        &mut self,
        src: TextureId,
        src_origin: [u32; 2],
        dst: TextureId,
        layer: u32,
        size: [u32; 2],
    ) -> Result<(), GpuError> {
        let [x, y] = src_origin;
        let [w, h] = size;
        let out_of_range = GpuError::CopyOutOfRange { x, y, width: w, height: h, layer };

        if std::mem::take(&mut self.fail_next_copy) {
            return Err(out_of_range);
        }

        let source = self.textures.get(&src).ok_or(GpuError::UnknownTexture(src))?;
        if x + w > source.width || y + h > source.height {
            return Err(out_of_range);
        }
        let src_w = source.width as usize;
        let rows: Vec<Vec<u8>> = (y..y + h)
            .map(|row| {
                let start = (row as usize * src_w + x as usize) * 4;
                source.pixels[start..start + w as usize * 4].to_vec()
            })
            .collect();

        let target = self.textures.get_mut(&dst).ok_or(GpuError::UnknownTexture(dst))?;
        if !target.is_array {
            return Err(GpuError::NotAnArray(dst));
        }
        if layer >= target.layers || w > target.width || h > target.height {
            return Err(out_of_range);
        }
        let layer_len = target.width as usize * target.height as usize * 4;
        let base = layer as usize * layer_len;
        for (dy, row) in rows.iter().enumerate() {
            let start = base + dy * target.width as usize * 4;
            target.pixels[start..start + row.len()].copy_from_slice(row);
        }

        self.commands.push(GpuCommand::CopyToLayer { src, src_origin, dst, layer, size });
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
        for slot in &mut self.bound {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.commands.push(GpuCommand::DestroyTexture(id));
    }

    fn compile_shader(&mut self, source: &ShaderProgramSource) -> Result<ShaderId, GpuError> {
        validate_wgsl(&source.vertex, ShaderStage::Vertex, &source.label)?;
        validate_wgsl(&source.fragment, ShaderStage::Fragment, &source.label)?;
        let id = ShaderId(self.allocate_id());
        self.shaders.insert(id, source.kind);
        self.commands.push(GpuCommand::CompileShader { id, kind: source.kind });
        Ok(id)
    }

    fn destroy_shader(&mut self, id: ShaderId) {
        self.shaders.remove(&id);
        self.commands.push(GpuCommand::DestroyShader(id));
    }

    fn bind_texture(&mut self, unit: TextureUnit, id: TextureId) {
        self.bound[unit.index()] = Some(id);
        self.commands.push(GpuCommand::BindTexture { unit, id });
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.commands.push(GpuCommand::SetProjection(projection));
    }

    fn draw_quad(&mut self, draw: &QuadDraw) {
        let texture = self
            .shaders
            .get(&draw.shader)
            .and_then(|kind| self.bound[kind.unit().index()]);
        self.commands.push(GpuCommand::Draw { draw: *draw, texture });
    }

    fn begin_frame(&mut self) {
        self.commands.push(GpuCommand::BeginFrame);
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        self.commands.push(GpuCommand::EndFrame);
        Ok(())
    }
}
