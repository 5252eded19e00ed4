use vello_cpu::kurbo::{Affine, BezPath};

use crate::{
    foundation::{
        core::Raster,
        error::{QuiltError, QuiltResult},
    },
    raster::{
        blur::{ShadowKernel, shadow_halo},
        canvas::{ArcStroke, Canvas2D, DrawCmd, TextRun},
        composite::over_in_place,
        text::{FontSource, TextBrushRgba8, TextLayoutEngine},
    },
};

/// Maximum angular step when flattening arcs into polygons.
const ARC_STEP_RAD: f64 = 0.5 * std::f64::consts::PI / 180.0;

/// Turns a canvas display list into premultiplied pixels.
pub trait Rasterizer2D {
    fn rasterize(&mut self, canvas: &Canvas2D) -> QuiltResult<Raster>;
}

struct LoadedFont {
    source: FontSource,
    data: vello_cpu::peniko::FontData,
}

/// `vello_cpu` rasterizer with `parley` text shaping.
///
/// Without a font, text commands draw nothing and a single warning is logged.
pub struct CpuRasterizer {
    text: TextLayoutEngine,
    font: Option<LoadedFont>,
    warned_missing_font: bool,
}

impl std::fmt::Debug for CpuRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRasterizer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl CpuRasterizer {
    pub fn new(font: Option<FontSource>) -> Self {
        let font = font.map(|source| {
            let data = vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(source.bytes().to_vec()),
                0,
            );
            LoadedFont { source, data }
        });
        Self {
            text: TextLayoutEngine::new(),
            font,
            warned_missing_font: false,
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn draw_text(&mut self, out: &mut Raster, run: &TextRun) -> QuiltResult<()> {
        if run.text.is_empty() {
            return Ok(());
        }
        let Some(font) = &self.font else {
            if !self.warned_missing_font {
                tracing::warn!("no font configured, text draws are skipped");
                self.warned_missing_font = true;
            }
            return Ok(());
        };

        let brush = TextBrushRgba8 {
            r: run.color.r,
            g: run.color.g,
            b: run.color.b,
            a: run.color.a,
        };
        let layout = self
            .text
            .layout_line(&run.text, &font.source, run.size_px, brush)?;

        let (w16, h16) = pixmap_dims(out.width(), out.height())?;
        let origin_x = f64::from(run.anchor.0) - f64::from(layout.width()) / 2.0;
        let origin_y = f64::from(run.anchor.1) - f64::from(layout.height()) / 2.0;

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        ctx.set_transform(Affine::translate((origin_x, origin_y)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let brush = glyph_run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = glyph_run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font.data)
                    .font_size(glyph_run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        let glyph_layer = render_layer(ctx, w16, h16);
        let glyph_bytes = glyph_layer.data_as_u8_slice();

        if let Some(shadow) = run.shadow {
            if let Some(kernel) = ShadowKernel::for_blur(shadow.blur) {
                let halo =
                    shadow_halo(glyph_bytes, out.width(), out.height(), &kernel, shadow.color)?;
                over_in_place(out.data_mut(), &halo, 1.0)?;
            }
        }
        over_in_place(out.data_mut(), glyph_bytes, 1.0)
    }
}

impl Rasterizer2D for CpuRasterizer {
    fn rasterize(&mut self, canvas: &Canvas2D) -> QuiltResult<Raster> {
        let (w16, h16) = pixmap_dims(canvas.width(), canvas.height())?;
        let mut out = Raster::new(canvas.width(), canvas.height());
        let cmds = canvas.commands();

        let mut i = 0;
        while i < cmds.len() {
            match &cmds[i] {
                DrawCmd::StrokeArc(_) => {
                    // consecutive strokes share one context
                    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
                    while let Some(DrawCmd::StrokeArc(arc)) = cmds.get(i) {
                        let c = arc.color;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
                        ctx.fill_path(&arc_band_path(arc));
                        i += 1;
                    }
                    let layer = render_layer(ctx, w16, h16);
                    over_in_place(out.data_mut(), layer.data_as_u8_slice(), 1.0)?;
                }
                DrawCmd::FillText(run) => {
                    self.draw_text(&mut out, run)?;
                    i += 1;
                }
            }
        }
        Ok(out)
    }
}

fn pixmap_dims(width: u32, height: u32) -> QuiltResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| QuiltError::render("canvas width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| QuiltError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn render_layer(mut ctx: vello_cpu::RenderContext, w: u16, h: u16) -> vello_cpu::Pixmap {
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    pixmap
}

/// Outline of a stroked arc with butt caps: outer edge forward, inner edge back.
pub(crate) fn arc_band_path(arc: &ArcStroke) -> BezPath {
    let (cx, cy) = (f64::from(arc.center.0), f64::from(arc.center.1));
    let half = f64::from(arc.width) / 2.0;
    let outer = f64::from(arc.radius) + half;
    let inner = (f64::from(arc.radius) - half).max(0.0);
    let start = f64::from(arc.start_angle);
    let sweep = f64::from(arc.end_angle) - start;
    let steps = ((sweep.abs() / ARC_STEP_RAD).ceil() as usize).max(1);

    let point = |r: f64, step: usize| {
        let a = start + sweep * (step as f64) / (steps as f64);
        (cx + r * a.cos(), cy + r * a.sin())
    };

    let mut path = BezPath::new();
    path.move_to(point(outer, 0));
    for s in 1..=steps {
        path.line_to(point(outer, s));
    }
    for s in (0..=steps).rev() {
        path.line_to(point(inner, s));
    }
    path.close_path();
    path
}

#[cfg(test)]
#[path = "../../tests/unit/raster/cpu.rs"]
mod tests;
