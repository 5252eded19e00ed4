use super::*;

fn coverage_image(w: u32, h: u32, lit: &[(u32, u32)]) -> Vec<u8> {
    let mut buf = vec![0u8; (w * h * 4) as usize];
    for &(x, y) in lit {
        let i = ((y * w + x) * 4) as usize;
        buf[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
    }
    buf
}

#[test]
fn kernel_follows_canvas_shadow_blur() {
    assert!(ShadowKernel::for_blur(0.0).is_none());
    assert!(ShadowKernel::for_blur(f32::NAN).is_none());
    assert_eq!(ShadowKernel::for_blur(6.0).unwrap().radius(), 9);
    assert_eq!(ShadowKernel::for_blur(16.0).unwrap().radius(), 24);
}

#[test]
fn kernel_is_normalized_and_symmetric() {
    let k = ShadowKernel::for_blur(6.0).unwrap();
    let w = k.weights();
    assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    assert_eq!(w.first(), w.last());
    let mid = k.radius();
    assert!(w.iter().all(|&x| x <= w[mid]));
}

#[test]
fn full_coverage_stays_full() {
    let (w, h) = (6u32, 4u32);
    let lit: Vec<_> = (0..h).flat_map(|y| (0..w).map(move |x| (x, y))).collect();
    let src = coverage_image(w, h, &lit);
    let color = Rgba8::new(255, 255, 255, 153);
    let halo = shadow_halo(&src, w, h, &ShadowKernel::for_blur(4.0).unwrap(), color).unwrap();
    assert!(halo.chunks_exact(4).all(|px| px == [153, 153, 153, 153]));
}

#[test]
fn halo_spreads_a_single_glyph_pixel_and_ignores_its_rgb() {
    let (w, h) = (9u32, 9u32);
    let mut src = coverage_image(w, h, &[(4, 4)]);
    let center = ((4 * w + 4) * 4) as usize;
    src[center..center + 3].copy_from_slice(&[0, 0, 0]);

    let color = Rgba8::new(255, 0, 0, 255);
    let halo = shadow_halo(&src, w, h, &ShadowKernel::for_blur(2.0).unwrap(), color).unwrap();

    let lit = halo.chunks_exact(4).filter(|px| px[3] != 0).count();
    assert!(lit > 1);
    let c = &halo[center..center + 4];
    assert!(c[0] > 0 && c[0] == c[3] && c[1] == 0 && c[2] == 0, "{c:?}");
    assert!(c[3] < 255);
}

#[test]
fn mismatched_buffer_is_rejected() {
    let k = ShadowKernel::for_blur(2.0).unwrap();
    assert!(shadow_halo(&[0u8; 7], 1, 2, &k, Rgba8::WHITE).is_err());
}
