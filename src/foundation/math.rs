pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Wrap `z` into `[0, 1)` as `(z + ceil(|z|)) mod 1`.
///
/// Shifting by `ceil(|z|)` first keeps the operand non-negative so the sawtooth stays
/// continuous across zero.
pub fn wrap_unit(z: f32) -> f32 {
    let shifted = z + z.abs().ceil();
    let wrapped = shifted - shifted.floor();
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// CSS `hsl()` conversion. `hue` in degrees, `saturation`/`lightness` in `[0, 1]`.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    fn channel(p: f32, q: f32, mut t: f32) -> f32 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    [
        channel(p, q, h + 1.0 / 3.0),
        channel(p, q, h),
        channel(p, q, h - 1.0 / 3.0),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
