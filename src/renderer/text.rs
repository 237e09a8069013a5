use std::collections::HashMap;
use std::path::Path;

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};
use serde::Deserialize;
use thiserror::Error;

use crate::gpu::Gpu;

use super::sprite_pipeline::SpriteRenderer;
use super::texture::{TextureResource, decode_image};
use super::TextureError;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read glyph file '{path}': {source}")]
    Io { path: String, source: std::io::Error },

    #[error("malformed glyph file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("glyph '{ch}' lies outside the {width}x{height} atlas")]
    GlyphOutsideAtlas { ch: char, width: u32, height: u32 },
}

// ── Glyph ────────────────────────────────────────────────────────────────────

/// Metrics for a single character in the bitmap font atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub id: char,
    /// Top-left pixel of the glyph region in the atlas.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Offset applied when rendering (may be negative).
    pub x_offset: i32,
    pub y_offset: i32,
    /// How far to advance the cursor after drawing this glyph.
    pub x_advance: u32,
}

// ── Font ─────────────────────────────────────────────────────────────────────

/// A bitmap font: glyph metrics plus the atlas image they index into.
///
/// Text is rasterized on the CPU into an RGBA buffer, which
/// [`Font::draw_text`] uploads as a short-lived sprite texture.
#[derive(Debug, Clone)]
pub struct Font {
    pub glyphs: HashMap<char, Glyph>,
    /// Vertical distance between successive baselines in pixels.
    pub line_height: u32,
    atlas: RgbaImage,
}

impl Font {
    /// Load glyph metrics from `glyphs_path` and the atlas from `atlas_path`.
    ///
    /// The glyph file may use either supported format: a descriptor with a
    /// `glyphs` list (see [`Font::from_json`]) or a char-keyed map of atlas
    /// rectangles (see [`Font::from_atlas_json`]).
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(glyphs_path: P, atlas_path: Q) -> Result<Self, FontError> {
        let glyphs_path = glyphs_path.as_ref();
        let json = std::fs::read_to_string(glyphs_path).map_err(|source| FontError::Io {
            path: glyphs_path.display().to_string(),
            source,
        })?;
        let atlas = decode_image(atlas_path)?;

        match serde_json::from_str::<RawFont>(&json) {
            Ok(raw) => Self::from_raw(raw, atlas),
            Err(_) => Self::from_atlas_json(&json, atlas),
        }
    }

    /// Build a font from a descriptor with explicit per-glyph metrics:
    ///
    /// ```json
    /// { "line_height": 24, "glyphs": [ { "id": 65, "x": 0, "y": 0, "width": 16, "height": 24,
    ///                                    "x_offset": 0, "y_offset": 0, "x_advance": 16 } ] }
    /// ```
    ///
    /// `id` is a Unicode code point; invalid code points are skipped.
    pub fn from_json(json: &str, atlas: RgbaImage) -> Result<Self, FontError> {
        let raw: RawFont = serde_json::from_str(json)?;
        Self::from_raw(raw, atlas)
    }

    /// Build a font from a char-keyed map of atlas rectangles:
    ///
    /// ```json
    /// { "A": { "x": 0, "y": 0, "w": 16, "h": 24 }, ... }
    /// ```
    ///
    /// `x_advance` is the glyph width and offsets are zero, which suits
    /// uniform-grid atlases. Keys longer than one character are ignored.
    pub fn from_atlas_json(json: &str, atlas: RgbaImage) -> Result<Self, FontError> {
        #[derive(Deserialize)]
        struct AtlasEntry { x: u32, y: u32, w: u32, h: u32 }

        let raw: HashMap<String, AtlasEntry> = serde_json::from_str(json)?;
        let line_height = raw.values().map(|e| e.h).max().unwrap_or(0);

        let glyphs = raw
            .into_iter()
            .filter_map(|(key, entry)| {
                let mut chars = key.chars();
                let ch = chars.next()?;
                if chars.next().is_some() { return None; }

                Some((ch, Glyph {
                    id: ch,
                    x: entry.x,
                    y: entry.y,
                    width: entry.w,
                    height: entry.h,
                    x_offset: 0,
                    y_offset: 0,
                    x_advance: entry.w,
                }))
            })
            .collect();

        Self::checked(glyphs, line_height, atlas)
    }

    fn from_raw(raw: RawFont, atlas: RgbaImage) -> Result<Self, FontError> {
        let glyphs = raw
            .glyphs
            .into_iter()
            .filter_map(|g| {
                char::from_u32(g.id).map(|ch| {
                    (ch, Glyph {
                        id: ch,
                        x: g.x,
                        y: g.y,
                        width: g.width,
                        height: g.height,
                        x_offset: g.x_offset,
                        y_offset: g.y_offset,
                        x_advance: g.x_advance,
                    })
                })
            })
            .collect();

        Self::checked(glyphs, raw.line_height, atlas)
    }

    fn checked(glyphs: HashMap<char, Glyph>, line_height: u32, atlas: RgbaImage) -> Result<Self, FontError> {
        let (width, height) = atlas.dimensions();
        if let Some(g) = glyphs.values().find(|g| {
            g.x.checked_add(g.width).is_none_or(|right| right > width)
                || g.y.checked_add(g.height).is_none_or(|bottom| bottom > height)
        }) {
            return Err(FontError::GlyphOutsideAtlas { ch: g.id, width, height });
        }
        Ok(Self { glyphs, line_height, atlas })
    }

    pub fn atlas(&self) -> &RgbaImage {
        &self.atlas
    }

    /// Pixel size of `text` when rasterized. `'\n'` starts a new line;
    /// characters without a glyph take no space.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        let width = text
            .split('\n')
            .map(|line| {
                line.chars()
                    .filter_map(|c| self.glyphs.get(&c))
                    .fold(0u32, |w, g| w.saturating_add(g.x_advance))
            })
            .max()
            .unwrap_or(0);
        let lines = text.split('\n').count() as u32;
        (width, lines.saturating_mul(self.line_height))
    }

    /// Render `text` into a fresh RGBA buffer. Glyph pixels are tinted by
    /// `color` and keep the atlas alpha; everything else is transparent.
    pub fn rasterize(&self, text: &str, color: [u8; 3]) -> RgbaImage {
        let (width, height) = self.measure(text);
        let mut out = RgbaImage::new(width, height);

        for (row, line) in text.split('\n').enumerate() {
            let mut cursor_x = 0i64;
            let baseline_y = row as i64 * i64::from(self.line_height);

            for ch in line.chars() {
                let Some(glyph) = self.glyphs.get(&ch) else { continue };
                let origin_x = cursor_x + i64::from(glyph.x_offset);
                let origin_y = baseline_y + i64::from(glyph.y_offset);

                for gy in 0..glyph.height {
                    for gx in 0..glyph.width {
                        let (dx, dy) = (origin_x + i64::from(gx), origin_y + i64::from(gy));
                        let (Ok(dx), Ok(dy)) = (u32::try_from(dx), u32::try_from(dy)) else { continue };
                        if dx >= width || dy >= height {
                            continue;
                        }
                        let src = self.atlas.get_pixel(glyph.x + gx, glyph.y + gy);
                        if src[3] == 0 {
                            continue;
                        }
                        let tint = |c: u8, s: u8| ((u16::from(c) * u16::from(s)) / 255) as u8;
                        out.put_pixel(dx, dy, Rgba([
                            tint(color[0], src[0]),
                            tint(color[1], src[1]),
                            tint(color[2], src[2]),
                            src[3],
                        ]));
                    }
                }

                cursor_x += i64::from(glyph.x_advance);
            }
        }

        out
    }

    /// Rasterize `text`, upload it to a transient texture, draw it as a
    /// sprite at `position` and release the texture again.
    ///
    /// Returns `Ok(false)` when the text produced no pixels.
    pub fn draw_text(
        &self,
        gpu: &mut dyn Gpu,
        sprites: &SpriteRenderer,
        text: &str,
        position: Vec2,
        color: [u8; 3],
    ) -> Result<bool, FontError> {
        let image = self.rasterize(text, color);
        if image.width() == 0 || image.height() == 0 {
            return Ok(false);
        }

        let mut texture = TextureResource::new();
        texture.generate(gpu, image.width(), image.height(), image.as_raw())?;
        let drawn = sprites.draw_sprite(gpu, &texture, position, Vec2::ZERO, 0.0, Vec3::ONE);
        texture.unload(gpu);
        Ok(drawn)
    }
}

// ── Raw (JSON-facing) types ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawGlyph {
    id: u32,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    #[serde(default)]
    x_offset: i32,
    #[serde(default)]
    y_offset: i32,
    x_advance: u32,
}

#[derive(Deserialize)]
struct RawFont {
    line_height: u32,
    glyphs: Vec<RawGlyph>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_atlas() -> RgbaImage {
        RgbaImage::from_pixel(16, 8, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn atlas_json_uses_width_as_advance() {
        let font = Font::from_atlas_json(
            r#"{ "A": { "x": 0, "y": 0, "w": 8, "h": 8 }, "AB": { "x": 8, "y": 0, "w": 8, "h": 8 } }"#,
            solid_atlas(),
        )
        .unwrap();
        assert_eq!(font.glyphs.len(), 1);
        assert_eq!(font.glyphs[&'A'].x_advance, 8);
        assert_eq!(font.line_height, 8);
    }

    #[test]
    fn glyph_outside_atlas_is_rejected() {
        let err = Font::from_atlas_json(r#"{ "A": { "x": 12, "y": 0, "w": 8, "h": 8 } }"#, solid_atlas()).unwrap_err();
        assert!(matches!(err, FontError::GlyphOutsideAtlas { ch: 'A', .. }));
    }

    #[test]
    fn glyph_extent_overflow_is_rejected() {
        let json = format!(r#"{{ "A": {{ "x": {}, "y": 0, "w": 8, "h": 8 }} }}"#, u32::MAX - 2);
        let err = Font::from_atlas_json(&json, solid_atlas()).unwrap_err();
        assert!(matches!(err, FontError::GlyphOutsideAtlas { ch: 'A', .. }));
    }
}
