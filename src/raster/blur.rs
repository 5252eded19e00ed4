use rayon::prelude::*;

use crate::foundation::{
    core::Rgba8,
    error::{QuiltError, QuiltResult},
};

/// Normalized 1D Gaussian for a canvas `shadowBlur` amount.
///
/// Sigma is half the blur amount and the support reaches three sigma on each side.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowKernel {
    weights: Vec<f32>,
}

impl ShadowKernel {
    /// `None` when `blur` draws no halo (zero, negative or non-finite).
    pub fn for_blur(blur: f32) -> Option<Self> {
        if !blur.is_finite() || blur <= 0.0 {
            return None;
        }
        let sigma = blur / 2.0;
        let radius = (sigma * 3.0).ceil().max(1.0) as i32;
        let denom = 2.0 * sigma * sigma;
        let mut weights: Vec<f32> = (-radius..=radius)
            .map(|i| (-(i * i) as f32 / denom).exp())
            .collect();
        let sum: f32 = weights.iter().sum();
        weights.iter_mut().for_each(|w| *w /= sum);
        Some(Self { weights })
    }

    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

/// Premultiplied halo of `color` following the blurred alpha coverage of `glyphs`.
///
/// Glyph RGB is ignored; only how much of each pixel the text covers matters.
pub fn shadow_halo(
    glyphs: &[u8],
    width: u32,
    height: u32,
    kernel: &ShadowKernel,
    color: Rgba8,
) -> QuiltResult<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| QuiltError::render("shadow buffer size overflow"))?;
    if glyphs.len() != len * 4 {
        return Err(QuiltError::render(format!(
            "shadow source has {} bytes, expected {} for {width}x{height}",
            glyphs.len(),
            len * 4
        )));
    }
    if len == 0 {
        return Ok(Vec::new());
    }

    let coverage: Vec<f32> = glyphs
        .chunks_exact(4)
        .map(|px| f32::from(px[3]) / 255.0)
        .collect();
    let blurred = blur_coverage(&coverage, width as usize, height as usize, kernel);

    let tint = color.premultiplied().to_array().map(f32::from);
    let mut out = vec![0u8; len * 4];
    out.par_chunks_mut(4)
        .zip(blurred.par_iter())
        .for_each(|(px, &cov)| {
            for (dst, c) in px.iter_mut().zip(tint) {
                *dst = (c * cov.clamp(0.0, 1.0)).round() as u8;
            }
        });
    Ok(out)
}

/// Separable blur of a single coverage plane, clamped at the edges.
fn blur_coverage(src: &[f32], width: usize, height: usize, kernel: &ShadowKernel) -> Vec<f32> {
    let r = kernel.radius() as isize;
    let k = kernel.weights();

    let mut rows = vec![0f32; src.len()];
    rows.par_chunks_mut(width)
        .zip(src.par_chunks(width))
        .for_each(|(dst, row)| {
            for (x, out) in dst.iter_mut().enumerate() {
                *out = k
                    .iter()
                    .enumerate()
                    .map(|(i, w)| {
                        let sx = (x as isize + i as isize - r).clamp(0, width as isize - 1);
                        w * row[sx as usize]
                    })
                    .sum();
            }
        });

    let mut out = vec![0f32; src.len()];
    out.par_chunks_mut(width).enumerate().for_each(|(y, dst)| {
        for (x, px) in dst.iter_mut().enumerate() {
            *px = k
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let sy = (y as isize + i as isize - r).clamp(0, height as isize - 1);
                    w * rows[sy as usize * width + x]
                })
                .sum();
        }
    });
    out
}

#[cfg(test)]
#[path = "../../tests/unit/raster/blur.rs"]
mod tests;
