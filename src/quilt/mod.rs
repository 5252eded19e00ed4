//! Multi-view quilt generation.
//!
//! A quilt is a grid of views of the same scene taken from cameras spread along a
//! horizontal arc. View `i` lives at tile `(i / columns, i % columns)` with row 0 at the top.

use std::sync::Arc;

use glam::Vec3;

use crate::{
    foundation::{
        core::Raster,
        error::{QuiltError, QuiltResult},
    },
    params::config::{CameraSweepConfig, OpticalConfig},
    render::{SceneRenderer, camera::PerspectiveCamera},
    scene::graph::SceneGraph,
};

pub const DEFAULT_TILE_WIDTH: u32 = 450;
pub const DEFAULT_TILE_HEIGHT: u32 = 800;

/// Tile position; `row` counts from the top of the quilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QuiltCell {
    pub row: u32,
    pub col: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuiltLayout {
    pub columns: u32,
    pub rows: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl QuiltLayout {
    pub fn new(columns: u32, rows: u32, tile_width: u32, tile_height: u32) -> QuiltResult<Self> {
        let layout = Self {
            columns,
            rows,
            tile_width,
            tile_height,
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn for_optics(optics: &OpticalConfig, tile_width: u32, tile_height: u32) -> QuiltResult<Self> {
        Self::new(optics.columns, optics.rows, tile_width, tile_height)
    }

    pub fn validate(&self) -> QuiltResult<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(QuiltError::validation("quilt columns and rows must be > 0"));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(QuiltError::validation("quilt tile size must be > 0"));
        }
        if self.width().is_none() || self.height().is_none() {
            return Err(QuiltError::validation("quilt dimensions overflow"));
        }
        Ok(())
    }

    pub fn view_count(&self) -> u32 {
        self.columns * self.rows
    }

    pub fn width(&self) -> Option<u32> {
        self.columns.checked_mul(self.tile_width)
    }

    pub fn height(&self) -> Option<u32> {
        self.rows.checked_mul(self.tile_height)
    }

    pub fn tile_aspect(&self) -> f32 {
        self.tile_width as f32 / self.tile_height as f32
    }

    pub fn cell_for_view(&self, view: u32) -> QuiltCell {
        QuiltCell {
            row: view / self.columns,
            col: view % self.columns,
        }
    }

    pub fn view_for_cell(&self, cell: QuiltCell) -> u32 {
        cell.row * self.columns + cell.col
    }

    /// Top-left pixel of a view's tile.
    pub fn tile_origin(&self, view: u32) -> (u32, u32) {
        let cell = self.cell_for_view(view);
        (cell.col * self.tile_width, cell.row * self.tile_height)
    }
}

impl Default for QuiltLayout {
    fn default() -> Self {
        Self {
            columns: OpticalConfig::COLUMNS,
            rows: OpticalConfig::ROWS,
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
        }
    }
}

/// A fully built quilt. Shared read-only once constructed.
#[derive(Clone, Debug)]
pub struct QuiltImage {
    layout: QuiltLayout,
    raster: Raster,
}

impl QuiltImage {
    pub fn new(layout: QuiltLayout, raster: Raster) -> QuiltResult<Self> {
        layout.validate()?;
        if Some(raster.width()) != layout.width() || Some(raster.height()) != layout.height() {
            return Err(QuiltError::validation(format!(
                "quilt raster is {}x{}, layout expects {}x{}",
                raster.width(),
                raster.height(),
                layout.columns * layout.tile_width,
                layout.rows * layout.tile_height
            )));
        }
        Ok(Self { layout, raster })
    }

    pub fn layout(&self) -> &QuiltLayout {
        &self.layout
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn into_raster(self) -> Raster {
        self.raster
    }
}

/// Sweep angle for view `index`, radians. A single view sits at the arc center.
pub fn view_angle(index: u32, view_count: u32, view_cone_radians: f32) -> f32 {
    let normalized = if view_count <= 1 {
        0.0
    } else {
        index as f32 / (view_count - 1) as f32 - 0.5
    };
    normalized * view_cone_radians
}

/// Camera position on the horizontal arc around the origin.
pub fn camera_position(index: u32, view_count: u32, sweep: &CameraSweepConfig) -> Vec3 {
    let angle = view_angle(index, view_count, sweep.view_cone_radians());
    let (sin, cos) = angle.sin_cos();
    Vec3::new(sin * sweep.camera_distance, 0.0, cos * sweep.camera_distance)
}

/// Renders every view of the scene and packs them into one quilt raster.
#[derive(Clone, Copy, Debug)]
pub struct QuiltGenerator {
    layout: QuiltLayout,
    camera: PerspectiveCamera,
}

impl QuiltGenerator {
    pub fn new(layout: QuiltLayout) -> QuiltResult<Self> {
        layout.validate()?;
        Ok(Self {
            layout,
            camera: PerspectiveCamera::for_quilt_tile(layout.tile_width, layout.tile_height),
        })
    }

    pub fn layout(&self) -> &QuiltLayout {
        &self.layout
    }

    /// Camera for view `index`: on the arc, looking at the origin.
    pub fn camera_for_view(&self, index: u32, sweep: &CameraSweepConfig) -> PerspectiveCamera {
        let mut camera = self.camera;
        camera.position = camera_position(index, self.layout.view_count(), sweep);
        camera.look_at(Vec3::ZERO);
        camera
    }

    #[tracing::instrument(level = "debug", skip_all, fields(views = self.layout.view_count()))]
    pub fn generate(
        &self,
        scene: &mut SceneGraph,
        renderer: &mut dyn SceneRenderer,
        sweep: &CameraSweepConfig,
    ) -> QuiltResult<Arc<QuiltImage>> {
        sweep.validate()?;
        let width = self
            .layout
            .width()
            .ok_or_else(|| QuiltError::validation("quilt width overflow"))?;
        let height = self
            .layout
            .height()
            .ok_or_else(|| QuiltError::validation("quilt height overflow"))?;

        renderer.prepare(scene)?;

        let mut quilt = Raster::try_new(width, height)?;
        for view in 0..self.layout.view_count() {
            let camera = self.camera_for_view(view, sweep);
            let tile =
                renderer.render_view(scene, &camera, self.layout.tile_width, self.layout.tile_height)?;
            let (x, y) = self.layout.tile_origin(view);
            quilt.blit(&tile, x, y)?;
        }
        tracing::debug!(width, height, "quilt generated");
        Ok(Arc::new(QuiltImage::new(self.layout, quilt)?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/quilt/mod.rs"]
mod tests;
