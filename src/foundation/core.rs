use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{QuiltError, QuiltResult};

/// Straight-alpha RGBA8 color as written by draw commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from `0xRRGGBB` with the given alpha in `[0, 1]`.
    pub fn from_hex(rgb: u32, alpha: f32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as u8,
            g: ((rgb >> 8) & 0xff) as u8,
            b: (rgb & 0xff) as u8,
            a: unit_to_u8(alpha),
        }
    }

    pub fn premultiplied(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Largest pixel buffer a fallibly allocated raster may hold.
pub const MAX_RASTER_BYTES: usize = 1 << 30;

/// Premultiplied RGBA8 pixel buffer, row-major with row 0 at the top.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl Raster {
    /// Fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba8Premul::transparent())
    }

    /// Transparent raster for sizes that come from outside, e.g. the window.
    pub fn try_new(width: u32, height: u32) -> QuiltResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .filter(|&n| n <= MAX_RASTER_BYTES)
            .ok_or_else(|| {
                QuiltError::render(format!(
                    "raster {width}x{height} exceeds {MAX_RASTER_BYTES} bytes"
                ))
            })?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    pub fn filled(width: u32, height: u32, px: Rgba8Premul) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            data: px.to_array().repeat(len),
        }
    }

    pub fn from_premul_bytes(width: u32, height: u32, data: Vec<u8>) -> QuiltResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| QuiltError::validation("raster size overflow"))?;
        if data.len() != expected {
            return Err(QuiltError::validation(format!(
                "raster data has {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data[idx..idx + 4].copy_from_slice(&px);
    }

    pub fn clear(&mut self, px: Rgba8Premul) {
        let px = px.to_array();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Copy `src` into this raster with its top-left corner at `(x0, y0)`.
    pub fn blit(&mut self, src: &Raster, x0: u32, y0: u32) -> QuiltResult<()> {
        if x0.checked_add(src.width).is_none_or(|r| r > self.width)
            || y0.checked_add(src.height).is_none_or(|b| b > self.height)
        {
            return Err(QuiltError::render(format!(
                "blit of {}x{} at ({x0},{y0}) exceeds {}x{} target",
                src.width, src.height, self.width, self.height
            )));
        }
        let row_bytes = src.stride();
        let dst_stride = self.stride();
        for (row, src_row) in src.data.chunks_exact(row_bytes).enumerate() {
            let start = (y0 as usize + row) * dst_stride + x0 as usize * 4;
            self.data[start..start + row_bytes].copy_from_slice(src_row);
        }
        Ok(())
    }

    /// Bilinear sample at normalized top-origin coordinates with clamp-to-edge addressing.
    ///
    /// Returns premultiplied channels in `[0, 1]`.
    pub fn sample_bilinear(&self, s: f32, t: f32) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }
        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;

        let x = s * self.width as f32 - 0.5;
        let y = t * self.height as f32 - 0.5;
        let x0f = x.floor();
        let y0f = y.floor();
        let fx = x - x0f;
        let fy = y - y0f;

        let x0 = (x0f as i64).clamp(0, max_x) as u32;
        let x1 = (x0f as i64 + 1).clamp(0, max_x) as u32;
        let y0 = (y0f as i64).clamp(0, max_y) as u32;
        let y1 = (y0f as i64 + 1).clamp(0, max_y) as u32;

        let p00 = self.pixel(x0, y0);
        let p10 = self.pixel(x1, y0);
        let p01 = self.pixel(x0, y1);
        let p11 = self.pixel(x1, y1);

        let mut out = [0.0f32; 4];
        for c in 0..4 {
            let top = f32::from(p00[c]) * (1.0 - fx) + f32::from(p10[c]) * fx;
            let bottom = f32::from(p01[c]) * (1.0 - fx) + f32::from(p11[c]) * fx;
            out[c] = (top * (1.0 - fy) + bottom * fy) / 255.0;
        }
        out
    }

    /// Straight-alpha copy for encoders.
    pub fn to_rgba_image(&self) -> QuiltResult<image::RgbaImage> {
        let mut straight = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4) {
            let a = px[3];
            if a == 0 {
                straight.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            let unpremul = |c: u8| -> u8 {
                ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8
            };
            straight.extend_from_slice(&[unpremul(px[0]), unpremul(px[1]), unpremul(px[2]), a]);
        }
        image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| QuiltError::render("raster does not fit an RgbaImage"))
    }

    pub fn save_png(&self, path: &Path) -> QuiltResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        self.to_rgba_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

pub(crate) fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
