/// Largest framebuffer edge in physical pixels.
pub const MAX_SURFACE_EDGE: f32 = 16384.0;

/// Window size in logical pixels plus the device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSurfaceState {
    width: f32,
    height: f32,
    dpr: f32,
}

impl RenderSurfaceState {
    /// Non-finite or non-positive `dpr` falls back to 1; negative sizes clamp to 0.
    ///
    /// Sizes whose physical edge would exceed [`MAX_SURFACE_EDGE`] are clamped to it.
    pub fn new(width: f32, height: f32, dpr: f32) -> Self {
        let dpr = if dpr.is_finite() && dpr > 0.0 {
            dpr
        } else {
            tracing::warn!(dpr, "invalid device pixel ratio, using 1");
            1.0
        };
        let max_logical = MAX_SURFACE_EDGE / dpr;
        let clean = |v: f32| {
            let v = if v.is_finite() { v.max(0.0) } else { 0.0 };
            if v > max_logical {
                tracing::warn!(size = v, dpr, "surface too large, clamping");
                max_logical
            } else {
                v
            }
        };
        Self {
            width: clean(width),
            height: clean(height),
            dpr,
        }
    }

    pub fn logical_size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn dpr(&self) -> f32 {
        self.dpr
    }

    /// Framebuffer size in whole physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let (w, h) = self.resolution_uniform();
        (w.floor() as u32, h.floor() as u32)
    }

    /// Value for the compositor resolution uniform, unrounded.
    pub fn resolution_uniform(&self) -> (f32, f32) {
        (self.width * self.dpr, self.height * self.dpr)
    }

    pub fn is_empty(&self) -> bool {
        let (w, h) = self.physical_size();
        w == 0 || h == 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/surface.rs"]
mod tests;
