use super::*;
use crate::{
    foundation::core::Rgba8Premul,
    quilt::{QuiltLayout, QuiltCell},
};

const TILE: u32 = 10;

/// Quilt whose tile for view `n` is solid gray `n * 6`.
fn graded_quilt() -> Arc<QuiltImage> {
    let layout = QuiltLayout::new(8, 5, TILE, TILE).unwrap();
    let mut raster = Raster::new(80, 50);
    for view in 0..40u32 {
        let (x, y) = layout.tile_origin(view);
        let g = (view * 6) as u8;
        raster
            .blit(
                &Raster::filled(TILE, TILE, Rgba8Premul::from_straight_rgba(g, g, g, 255)),
                x,
                y,
            )
            .unwrap();
    }
    Arc::new(QuiltImage::new(layout, raster).unwrap())
}

#[test]
fn view_index_stays_in_range() {
    for center in [-0.489, 0.0, 0.37, 12.5, -7.25] {
        for invert in [false, true] {
            let mut optics = OpticalConfig::panel(center);
            optics.invert_views = invert;
            for i in 0..=64 {
                for j in 0..=64 {
                    let (u, v) = (i as f32 / 64.0, j as f32 / 64.0);
                    for c in 0..3 {
                        assert!(view_index(&optics, u, v, c) < 40);
                    }
                }
            }
        }
    }
}

#[test]
fn inverting_mirrors_view_order() {
    let plain = OpticalConfig::panel(-0.489);
    let mut inverted = plain;
    inverted.invert_views = true;
    let mut checked = 0;
    for i in 0..200 {
        let u = i as f32 / 200.0;
        let z = lens_phase(&plain, u, 0.3, 0);
        let pos = z * 40.0;
        if (pos - pos.round()).abs() < 1e-2 {
            continue;
        }
        assert_eq!(
            view_index(&plain, u, 0.3, 0) + view_index(&inverted, u, 0.3, 0),
            39
        );
        checked += 1;
    }
    assert!(checked > 100);
}

#[test]
fn compositor_cells_invert_generator_tiles() {
    let optics = OpticalConfig::default();
    let layout = QuiltLayout::default();
    for view in 0..40 {
        let (col, row_from_bottom) = cell_for_view_index(&optics, view);
        let QuiltCell { row, col: gen_col } = layout.cell_for_view(view);
        assert_eq!(col, gen_col);
        assert_eq!(row_from_bottom, optics.rows - 1 - row);

        // tile center lands inside the generator's tile in image space
        let (s, t) = quilt_coord(&optics, 0.5, 0.5, view);
        let px = (s * 3600.0) as u32;
        let py = ((1.0 - t) * 4000.0) as u32;
        let (x0, y0) = layout.tile_origin(view);
        assert!((x0..x0 + 450).contains(&px));
        assert!((y0..y0 + 800).contains(&py));
    }
}

#[test]
fn each_channel_samples_its_own_view() {
    let mut comp = LenticularCompositor::new(OpticalConfig::default(), (64.0, 48.0)).unwrap();
    comp.set_quilt(graded_quilt()).unwrap();
    let frame = comp.composite(64, 48).unwrap();

    let mut checked = 0;
    for py in 0..48u32 {
        let v = ((47 - py) as f32 + 0.5) / 48.0;
        for x in 0..64u32 {
            let u = (x as f32 + 0.5) / 64.0;
            if !(0.1..0.9).contains(&u) || !(0.1..0.9).contains(&v) {
                continue;
            }
            let px = frame.pixel(x, py);
            assert_eq!(px[3], 255);
            for c in 0..3 {
                let view = comp.view_index_at(u, v, c);
                assert_eq!(px[c as usize], (view * 6) as u8, "pixel ({x},{py}) channel {c}");
            }
            checked += 1;
        }
    }
    assert!(checked > 1000);
}

#[test]
fn composite_is_deterministic() {
    let mut comp = LenticularCompositor::new(OpticalConfig::default(), (40.0, 30.0)).unwrap();
    comp.set_quilt(graded_quilt()).unwrap();
    let a = comp.composite(40, 30).unwrap();
    let b = comp.composite(40, 30).unwrap();
    assert_eq!(a.data(), b.data());
}

#[test]
fn center_offset_shifts_the_pattern() {
    let mut comp = LenticularCompositor::new(OpticalConfig::default(), (40.0, 30.0)).unwrap();
    comp.set_quilt(graded_quilt()).unwrap();
    let before = comp.composite(40, 30).unwrap();
    comp.set_center_offset(0.25);
    assert_eq!(comp.optics().center_offset, 0.25);
    let after = comp.composite(40, 30).unwrap();
    assert_ne!(before.data(), after.data());
}

#[test]
fn missing_quilt_composites_black() {
    let comp = LenticularCompositor::new(OpticalConfig::default(), (8.0, 8.0)).unwrap();
    let frame = comp.composite(8, 8).unwrap();
    assert!(frame.data().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn bad_sizes_are_rejected() {
    let mut comp = LenticularCompositor::new(OpticalConfig::default(), (8.0, 8.0)).unwrap();
    assert!(comp.composite(0, 8).is_err());
    assert!(comp.composite(u32::MAX, u32::MAX).is_err());
    assert!(comp.composite(200_000, 200_000).is_err());
    comp.set_resolution(0.0, 8.0);
    assert!(comp.composite(8, 8).is_err());

    let odd = QuiltLayout::new(4, 10, 2, 2).unwrap();
    let quilt = Arc::new(QuiltImage::new(odd, Raster::new(8, 20)).unwrap());
    assert!(comp.set_quilt(quilt).is_err());
}
