use std::cell::{Cell, RefCell};

use super::*;
use crate::foundation::core::Rgba8Premul;

/// Paints view `n` of a quilt with red = n and records the cameras it saw.
#[derive(Default)]
struct CountingRenderer {
    prepared: usize,
    next: Cell<u8>,
    cameras: RefCell<Vec<PerspectiveCamera>>,
}

impl SceneRenderer for CountingRenderer {
    fn prepare(&mut self, _scene: &mut SceneGraph) -> QuiltResult<()> {
        self.prepared += 1;
        self.next.set(0);
        Ok(())
    }

    fn render_view(
        &self,
        _scene: &SceneGraph,
        camera: &PerspectiveCamera,
        width: u32,
        height: u32,
    ) -> QuiltResult<Raster> {
        let n = self.next.get();
        self.next.set(n + 1);
        self.cameras.borrow_mut().push(*camera);
        Ok(Raster::filled(
            width,
            height,
            Rgba8Premul::from_straight_rgba(n, 0, 0, 255),
        ))
    }
}

#[test]
fn sweep_endpoints_match_half_cone() {
    let cone = 5.0_f32.to_radians();
    assert!((view_angle(0, 40, cone).to_degrees() + 2.5).abs() < 1e-4);
    assert!((view_angle(39, 40, cone).to_degrees() - 2.5).abs() < 1e-4);
    assert_eq!(view_angle(0, 1, cone), 0.0);
}

#[test]
fn cameras_stay_on_the_arc() {
    let sweep = CameraSweepConfig::default();
    for i in [0, 13, 39] {
        let p = camera_position(i, 40, &sweep);
        assert!((p.length() - 650.0).abs() < 1e-2);
        assert_eq!(p.y, 0.0);
    }
    assert!(camera_position(0, 40, &sweep).x < 0.0);
    assert!(camera_position(39, 40, &sweep).x > 0.0);
}

#[test]
fn default_layout_is_3600_by_4000() {
    let layout = QuiltLayout::default();
    assert_eq!(layout.width(), Some(3600));
    assert_eq!(layout.height(), Some(4000));
    assert_eq!(layout.view_count(), 40);
    assert_eq!(layout.tile_origin(9), (450, 800));
    assert_eq!(layout.cell_for_view(39), QuiltCell { row: 4, col: 7 });
}

#[test]
fn cell_mapping_round_trips() {
    let layout = QuiltLayout::default();
    for view in 0..layout.view_count() {
        assert_eq!(layout.view_for_cell(layout.cell_for_view(view)), view);
    }
}

#[test]
fn invalid_layouts_are_rejected() {
    assert!(QuiltLayout::new(0, 5, 10, 10).is_err());
    assert!(QuiltLayout::new(8, 5, 0, 10).is_err());
    assert!(QuiltLayout::new(8, 5, u32::MAX, 10).is_err());
}

#[test]
fn quilt_image_checks_raster_size() {
    let layout = QuiltLayout::new(2, 2, 3, 3).unwrap();
    assert!(QuiltImage::new(layout, Raster::new(6, 6)).is_ok());
    assert!(QuiltImage::new(layout, Raster::new(6, 5)).is_err());
}

#[test]
fn generate_places_each_view_in_its_tile() {
    let layout = QuiltLayout::new(8, 5, 4, 6).unwrap();
    let generator = QuiltGenerator::new(layout).unwrap();
    let mut renderer = CountingRenderer::default();
    let mut scene = SceneGraph::new();

    let quilt = generator
        .generate(&mut scene, &mut renderer, &CameraSweepConfig::default())
        .unwrap();
    assert_eq!(renderer.prepared, 1);
    assert_eq!((quilt.raster().width(), quilt.raster().height()), (32, 30));

    for view in 0..40 {
        let (x, y) = layout.tile_origin(view);
        assert_eq!(quilt.raster().pixel(x + 1, y + 2)[0], view as u8);
    }

    let cams = renderer.cameras.borrow();
    assert_eq!(cams.len(), 40);
    assert!(cams.iter().all(|c| c.target() == Vec3::ZERO));
    assert!((cams[0].aspect - 4.0 / 6.0).abs() < 1e-6);
    assert!(cams[0].position.x < cams[39].position.x);
}

#[test]
fn generate_rejects_invalid_sweep() {
    let generator = QuiltGenerator::new(QuiltLayout::new(8, 5, 2, 2).unwrap()).unwrap();
    let sweep = CameraSweepConfig {
        view_cone_degrees: -1.0,
        camera_distance: 650.0,
    };
    let mut renderer = CountingRenderer::default();
    assert!(generator
        .generate(&mut SceneGraph::new(), &mut renderer, &sweep)
        .is_err());
    assert_eq!(renderer.prepared, 0);
}
