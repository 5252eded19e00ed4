use crate::{
    foundation::{
        core::{Rgba8, unit_to_u8},
        math::hsl_to_rgb,
    },
    raster::canvas::{ArcStroke, Canvas2D},
};

pub const RING_CANVAS_SIZE: u32 = 512;
pub const RING_CENTER: (f32, f32) = (256.0, 256.0);
pub const RING_RADIUS: f32 = 240.0;
pub const RING_SEGMENTS: u32 = 360;
pub const HALO_WIDTH: f32 = 20.0;
pub const HALO_ALPHA: f32 = 0.3;
pub const CORE_WIDTH: f32 = 6.0;
const SATURATION: f32 = 1.0;
const LIGHTNESS: f32 = 0.6;

fn hsla(hue: f32, alpha: f32) -> Rgba8 {
    let [r, g, b] = hsl_to_rgb(hue, SATURATION, LIGHTNESS);
    Rgba8::new(unit_to_u8(r), unit_to_u8(g), unit_to_u8(b), unit_to_u8(alpha))
}

/// Halo then core stroke for every hue step of the rainbow ring.
pub fn glow_ring_strokes() -> Vec<ArcStroke> {
    let mut out = Vec::with_capacity(RING_SEGMENTS as usize * 2);
    for i in 0..RING_SEGMENTS {
        let t0 = i as f32 / RING_SEGMENTS as f32;
        let t1 = (i + 1) as f32 / RING_SEGMENTS as f32;
        let hue = t0 * 360.0;
        let seg = ArcStroke {
            center: RING_CENTER,
            radius: RING_RADIUS,
            start_angle: t0 * std::f32::consts::TAU,
            end_angle: t1 * std::f32::consts::TAU,
            width: HALO_WIDTH,
            color: hsla(hue, HALO_ALPHA),
        };
        out.push(seg);
        out.push(ArcStroke {
            width: CORE_WIDTH,
            color: hsla(hue, 1.0),
            ..seg
        });
    }
    out
}

/// Fresh canvas holding the procedural ring; the middle stays transparent.
pub fn glow_ring_canvas() -> Canvas2D {
    let mut canvas = Canvas2D::new(RING_CANVAS_SIZE, RING_CANVAS_SIZE);
    for stroke in glow_ring_strokes() {
        canvas.stroke_arc(stroke);
    }
    canvas
}

#[cfg(test)]
#[path = "../../tests/unit/scene/glow_ring.rs"]
mod tests;
