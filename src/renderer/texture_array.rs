// ── Atlas slicing ─────────────────────────────────────────────────────────────
//
// An atlas of `width × height` pixels is cut into `sub_w × sub_h` cells,
// numbered row-major: left to right, then top to bottom.  Cell `i` becomes
// layer `i` of the array texture, which is what lets a tile's tileset index
// address an array layer directly.
//
//   i = 5, tiles_x = 4  →  column 5 % 4 = 1, row 5 / 4 = 1
//
//   ┌───┬───┬───┬───┐
//   │ 0 │ 1 │ 2 │ 3 │
//   ├───┼───┼───┼───┤
//   │ 4 │ 5 │ 6 │ 7 │
//   └───┴───┴───┴───┘

use super::TextureError;

/// How an atlas image is cut into equally sized sub-images.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlicePlan {
    pub atlas_width: u32,
    pub atlas_height: u32,
    pub subimage_width: u32,
    pub subimage_height: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl SlicePlan {
    /// Plan the slicing of an `atlas_width × atlas_height` image.
    ///
    /// Partial trailing columns and rows are dropped (truncating division),
    /// with a warning. Fails when the sub-image size is zero or no whole
    /// sub-image fits.
    pub fn new(
        atlas_width: u32,
        atlas_height: u32,
        subimage_width: u32,
        subimage_height: u32,
    ) -> Result<Self, TextureError> {
        if subimage_width == 0 || subimage_height == 0 {
            return Err(TextureError::InvalidSubImageSize {
                width: subimage_width,
                height: subimage_height,
            });
        }

        let plan = Self {
            atlas_width,
            atlas_height,
            subimage_width,
            subimage_height,
            tiles_x: atlas_width / subimage_width,
            tiles_y: atlas_height / subimage_height,
        };

        if plan.count() == 0 {
            return Err(TextureError::NoSubImages {
                atlas_width,
                atlas_height,
                subimage_width,
                subimage_height,
            });
        }

        if !plan.is_exact() {
            log::warn!(
                "[texture] Atlas {}x{} is not a multiple of {}x{}; dropping {} trailing column(s) and {} trailing row(s) of pixels",
                atlas_width,
                atlas_height,
                subimage_width,
                subimage_height,
                atlas_width % subimage_width,
                atlas_height % subimage_height
            );
        }

        Ok(plan)
    }

    /// Number of sub-images (array layers).
    pub fn count(&self) -> u32 {
        self.tiles_x * self.tiles_y
    }

    /// Whether the atlas divides evenly, with no pixels dropped.
    pub fn is_exact(&self) -> bool {
        self.atlas_width % self.subimage_width == 0 && self.atlas_height % self.subimage_height == 0
    }

    /// Top-left pixel of sub-image `index` in the atlas.
    pub fn source_origin(&self, index: u32) -> [u32; 2] {
        [
            (index % self.tiles_x) * self.subimage_width,
            (index / self.tiles_x) * self.subimage_height,
        ]
    }

    /// `(layer, source origin)` for every sub-image, in layer order.
    pub fn layers(&self) -> impl Iterator<Item = (u32, [u32; 2])> + '_ {
        (0..self.count()).map(|i| (i, self.source_origin(i)))
    }
}
