use crate::{
    foundation::error::{QuiltError, QuiltResult},
    params::store::{ParamKey, ParamStore},
};

/// Lenticular panel constants plus the runtime phase alignment.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OpticalConfig {
    /// Lenticule line density.
    pub line_number: f32,
    /// Panel slant.
    pub obliquity: f32,
    /// Phase alignment; the only optical value changed at runtime.
    pub center_offset: f32,
    /// Mirror the sawtooth, reversing view order.
    pub invert_views: bool,
    pub columns: u32,
    pub rows: u32,
    pub view_count: u32,
    pub reference_width: f32,
    pub reference_height: f32,
}

impl OpticalConfig {
    pub const LINE_NUMBER: f32 = 19.6153;
    pub const OBLIQUITY: f32 = 0.10255;
    pub const COLUMNS: u32 = 8;
    pub const ROWS: u32 = 5;
    pub const VIEW_COUNT: u32 = 40;
    pub const REFERENCE_WIDTH: f32 = 1440.0;
    pub const REFERENCE_HEIGHT: f32 = 2560.0;

    /// Fixed panel geometry with the given phase.
    pub fn panel(center_offset: f32) -> Self {
        Self {
            line_number: Self::LINE_NUMBER,
            obliquity: Self::OBLIQUITY,
            center_offset,
            invert_views: false,
            columns: Self::COLUMNS,
            rows: Self::ROWS,
            view_count: Self::VIEW_COUNT,
            reference_width: Self::REFERENCE_WIDTH,
            reference_height: Self::REFERENCE_HEIGHT,
        }
    }

    pub fn from_store(store: &mut ParamStore) -> QuiltResult<Self> {
        let cfg = Self::panel(store.get_f32(ParamKey::CenterOffset));
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> QuiltResult<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(QuiltError::validation("quilt columns and rows must be > 0"));
        }
        if self.columns.checked_mul(self.rows) != Some(self.view_count) {
            return Err(QuiltError::validation(format!(
                "quilt tiling {}x{} does not hold {} views",
                self.columns, self.rows, self.view_count
            )));
        }
        if !self.line_number.is_finite() || self.line_number <= 0.0 {
            return Err(QuiltError::validation("line_number must be finite and > 0"));
        }
        if !self.obliquity.is_finite() || !self.center_offset.is_finite() {
            return Err(QuiltError::validation(
                "obliquity and center_offset must be finite",
            ));
        }
        if !(self.reference_width > 0.0 && self.reference_height > 0.0) {
            return Err(QuiltError::validation(
                "reference panel dimensions must be > 0",
            ));
        }
        Ok(())
    }

    /// Lenticule pitch in sawtooth periods per normalized screen width.
    pub fn pitch(&self) -> f32 {
        (self.reference_width * 3.0) / self.line_number
    }

    pub fn slope(&self) -> f32 {
        -self.obliquity * (self.reference_height / self.reference_width)
    }

    /// Horizontal distance between neighbouring subpixels, normalized.
    pub fn subpixel_offset(&self) -> f32 {
        1.0 / (self.reference_width * 3.0)
    }
}

impl Default for OpticalConfig {
    fn default() -> Self {
        Self::panel(ParamKey::CenterOffset.default_f64() as f32)
    }
}

/// Camera arc swept around the scene origin.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraSweepConfig {
    pub view_cone_degrees: f32,
    pub camera_distance: f32,
}

impl CameraSweepConfig {
    pub fn new(view_cone_degrees: f32, camera_distance: f32) -> QuiltResult<Self> {
        let cfg = Self {
            view_cone_degrees,
            camera_distance,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read from the store; values that violate the invariants fall back to defaults.
    pub fn from_store(store: &mut ParamStore) -> Self {
        let cone = positive_or_default(store, ParamKey::ViewCone);
        let dist = positive_or_default(store, ParamKey::CamDist);
        Self {
            view_cone_degrees: cone,
            camera_distance: dist,
        }
    }

    pub fn validate(&self) -> QuiltResult<()> {
        if !(self.view_cone_degrees.is_finite() && self.view_cone_degrees > 0.0) {
            return Err(QuiltError::validation("view cone must be finite and > 0"));
        }
        if !(self.camera_distance.is_finite() && self.camera_distance > 0.0) {
            return Err(QuiltError::validation(
                "camera distance must be finite and > 0",
            ));
        }
        Ok(())
    }

    pub fn view_cone_radians(&self) -> f32 {
        self.view_cone_degrees.to_radians()
    }
}

impl Default for CameraSweepConfig {
    fn default() -> Self {
        Self {
            view_cone_degrees: ParamKey::ViewCone.default_f64() as f32,
            camera_distance: ParamKey::CamDist.default_f64() as f32,
        }
    }
}

fn positive_or_default(store: &mut ParamStore, key: ParamKey) -> f32 {
    let v = store.get_f32(key);
    if v > 0.0 {
        v
    } else {
        tracing::warn!(%key, value = v, "non-positive camera parameter, using default");
        key.default_f64() as f32
    }
}

/// Scene elements whose placement is configurable.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum SceneElement {
    GlowDisc,
    LabelCard,
    TimerGroup,
}

impl SceneElement {
    pub const ALL: [SceneElement; 3] = [
        SceneElement::GlowDisc,
        SceneElement::LabelCard,
        SceneElement::TimerGroup,
    ];

    /// Store keys for `(y, z, scale)`.
    pub fn keys(self) -> [ParamKey; 3] {
        match self {
            SceneElement::GlowDisc => [ParamKey::PosY, ParamKey::PosZ, ParamKey::DiscScale],
            SceneElement::LabelCard => [
                ParamKey::TaskNameY,
                ParamKey::TaskNameZ,
                ParamKey::TaskNameScale,
            ],
            SceneElement::TimerGroup => [ParamKey::TimerY, ParamKey::TimerZ, ParamKey::TimerScale],
        }
    }
}

/// User-facing placement of one element. `x` is pinned to 0.
///
/// `z` is a distance away from the viewer; scene space stores it negated.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneElementPlacement {
    pub y: f32,
    pub z: f32,
    pub scale: f32,
}

impl SceneElementPlacement {
    pub fn default_for(element: SceneElement) -> Self {
        let [y, z, scale] = element.keys();
        Self {
            y: y.default_f64() as f32,
            z: z.default_f64() as f32,
            scale: scale.default_f64() as f32,
        }
    }

    pub fn from_store(store: &mut ParamStore, element: SceneElement) -> Self {
        let [y, z, scale] = element.keys();
        Self {
            y: store.get_f32(y),
            z: store.get_f32(z),
            scale: store.get_f32(scale),
        }
    }

    /// Position in scene space: x pinned, z inverted.
    pub fn scene_position(&self) -> glam::Vec3 {
        glam::Vec3::new(0.0, self.y, -self.z)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/params/config.rs"]
mod tests;
