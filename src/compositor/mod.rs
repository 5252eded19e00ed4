//! Lenticular interlacing.
//!
//! Each output subpixel picks the quilt view that the panel's slanted lenticules send
//! toward the viewer at that screen position, then samples that view's tile.

use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    foundation::{
        core::{Raster, unit_to_u8},
        error::{QuiltError, QuiltResult},
        math::wrap_unit,
    },
    params::config::OpticalConfig,
    quilt::QuiltImage,
};

/// Sawtooth phase in `[0, 1)` for subpixel `channel` at normalized `(u, v)` (v from the bottom).
pub fn lens_phase(optics: &OpticalConfig, u: f32, v: f32, channel: u32) -> f32 {
    let z = (u + channel as f32 * optics.subpixel_offset() + v * optics.slope()) * optics.pitch()
        - optics.center_offset;
    let z = wrap_unit(z);
    if optics.invert_views { 1.0 - z } else { z }
}

pub fn view_index(optics: &OpticalConfig, u: f32, v: f32, channel: u32) -> u32 {
    let z = lens_phase(optics, u, v, channel);
    let view = ((1.0 - z) * optics.view_count as f32).floor();
    (view.max(0.0) as u32).min(optics.view_count.saturating_sub(1))
}

/// Tile of `view` as `(col, row)` with rows counted from the bottom of the quilt.
pub fn cell_for_view_index(optics: &OpticalConfig, view: u32) -> (u32, u32) {
    let col = view % optics.columns;
    let row = optics.rows - 1 - (view / optics.columns).min(optics.rows - 1);
    (col, row)
}

/// Bottom-origin quilt texture coordinate for `(u, v)` inside `view`'s tile.
pub fn quilt_coord(optics: &OpticalConfig, u: f32, v: f32, view: u32) -> (f32, f32) {
    let (col, row) = cell_for_view_index(optics, view);
    (
        (col as f32 + u) / optics.columns as f32,
        (row as f32 + v) / optics.rows as f32,
    )
}

/// CPU version of the interlacing fragment program.
#[derive(Clone, Debug)]
pub struct LenticularCompositor {
    optics: OpticalConfig,
    resolution: (f32, f32),
    quilt: Option<Arc<QuiltImage>>,
}

impl LenticularCompositor {
    pub fn new(optics: OpticalConfig, resolution: (f32, f32)) -> QuiltResult<Self> {
        optics.validate()?;
        Ok(Self {
            optics,
            resolution,
            quilt: None,
        })
    }

    pub fn optics(&self) -> &OpticalConfig {
        &self.optics
    }

    /// Resolution uniform, physical pixels.
    pub fn resolution(&self) -> (f32, f32) {
        self.resolution
    }

    pub fn set_resolution(&mut self, width: f32, height: f32) {
        self.resolution = (width, height);
    }

    pub fn set_center_offset(&mut self, center_offset: f32) {
        self.optics.center_offset = center_offset;
    }

    pub fn set_invert_views(&mut self, invert: bool) {
        self.optics.invert_views = invert;
    }

    /// Bind a new quilt; its tiling must match the panel.
    pub fn set_quilt(&mut self, quilt: Arc<QuiltImage>) -> QuiltResult<()> {
        let layout = quilt.layout();
        if layout.columns != self.optics.columns || layout.rows != self.optics.rows {
            return Err(QuiltError::validation(format!(
                "quilt tiling {}x{} does not match panel {}x{}",
                layout.columns, layout.rows, self.optics.columns, self.optics.rows
            )));
        }
        self.quilt = Some(quilt);
        Ok(())
    }

    pub fn quilt(&self) -> Option<&Arc<QuiltImage>> {
        self.quilt.as_ref()
    }

    pub fn view_index_at(&self, u: f32, v: f32, channel: u32) -> u32 {
        view_index(&self.optics, u, v, channel)
    }

    /// Interlace the bound quilt into a `width x height` opaque frame.
    ///
    /// Without a quilt the frame is black.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn composite(&self, width: u32, height: u32) -> QuiltResult<Raster> {
        if width == 0 || height == 0 {
            return Err(QuiltError::render("framebuffer size must be non-zero"));
        }
        let (res_x, res_y) = self.resolution;
        if !(res_x.is_finite() && res_y.is_finite() && res_x > 0.0 && res_y > 0.0) {
            return Err(QuiltError::render(format!(
                "invalid resolution uniform {res_x}x{res_y}"
            )));
        }

        let mut out = Raster::try_new(width, height)?;
        let stride = out.stride();
        let Some(quilt) = self.quilt.as_deref() else {
            tracing::debug!("no quilt bound, compositing black");
            out.data_mut()
                .chunks_exact_mut(4)
                .for_each(|px| px.copy_from_slice(&[0, 0, 0, 255]));
            return Ok(out);
        };
        let tex = quilt.raster();
        let optics = &self.optics;

        out.data_mut()
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(py, row)| {
                let y_from_bottom = height - 1 - py as u32;
                let v = (y_from_bottom as f32 + 0.5) / res_y;
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let u = (x as f32 + 0.5) / res_x;
                    for channel in 0..3u32 {
                        let view = view_index(optics, u, v, channel);
                        let (s, t) = quilt_coord(optics, u, v, view);
                        let sample = tex.sample_bilinear(s, 1.0 - t);
                        px[channel as usize] = unit_to_u8(sample[channel as usize]);
                    }
                    px[3] = 255;
                }
            });
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/mod.rs"]
mod tests;
