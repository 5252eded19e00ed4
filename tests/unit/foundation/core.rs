use super::*;

#[test]
fn premultiply_rounds_like_canvas() {
    let p = Rgba8::new(255, 128, 0, 128).premultiplied();
    assert_eq!(p, Rgba8Premul { r: 128, g: 64, b: 0, a: 128 });
    assert_eq!(Rgba8::from_hex(0x4488ff, 1.0), Rgba8::new(0x44, 0x88, 0xff, 255));
}

#[test]
fn blit_places_rows_at_offset() {
    let mut dst = Raster::new(4, 3);
    let src = Raster::filled(2, 2, Rgba8Premul::from_straight_rgba(255, 0, 0, 255));
    dst.blit(&src, 2, 1).unwrap();
    assert_eq!(dst.pixel(1, 1), [0, 0, 0, 0]);
    assert_eq!(dst.pixel(2, 1), [255, 0, 0, 255]);
    assert_eq!(dst.pixel(3, 2), [255, 0, 0, 255]);
    assert_eq!(dst.pixel(3, 0), [0, 0, 0, 0]);
}

#[test]
fn blit_out_of_bounds_is_rejected() {
    let mut dst = Raster::new(4, 4);
    let src = Raster::new(3, 3);
    assert!(dst.blit(&src, 2, 0).is_err());
}

#[test]
fn bilinear_sample_hits_texel_centers_and_clamps() {
    let mut r = Raster::new(2, 1);
    r.put_pixel(0, 0, [0, 0, 0, 255]);
    r.put_pixel(1, 0, [255, 255, 255, 255]);

    let left = r.sample_bilinear(0.25, 0.5);
    assert!(left[0].abs() < 1e-6);
    let mid = r.sample_bilinear(0.5, 0.5);
    assert!((mid[0] - 0.5).abs() < 1e-3);
    let clamped = r.sample_bilinear(2.0, -1.0);
    assert!((clamped[0] - 1.0).abs() < 1e-6);
}

#[test]
fn rgba_image_unpremultiplies() {
    let mut r = Raster::new(1, 1);
    r.put_pixel(0, 0, [64, 0, 0, 128]);
    let img = r.to_rgba_image().unwrap();
    assert_eq!(img.get_pixel(0, 0).0, [128, 0, 0, 128]);
}

#[test]
fn fallible_allocation_refuses_oversized_rasters() {
    let r = Raster::try_new(3, 2).unwrap();
    assert_eq!(r.data().len(), 24);
    assert!(r.is_fully_transparent());
    assert!(Raster::try_new(u32::MAX, u32::MAX).is_err());
    assert!(Raster::try_new(20_000, 20_000).is_err());
}
