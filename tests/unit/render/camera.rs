use super::*;

fn quilt_camera_at(position: Vec3) -> PerspectiveCamera {
    let mut cam = PerspectiveCamera::for_quilt_tile(450, 800);
    cam.position = position;
    cam.look_at(Vec3::ZERO);
    cam
}

#[test]
fn quilt_camera_parameters() {
    let cam = PerspectiveCamera::for_quilt_tile(450, 800);
    assert_eq!(cam.fov_y_degrees, 40.0);
    assert!((cam.aspect - 0.5625).abs() < 1e-6);
    assert_eq!((cam.near, cam.far), (0.1, 2000.0));
}

#[test]
fn center_ray_points_at_target() {
    let cam = quilt_camera_at(Vec3::new(0.0, 0.0, 650.0));
    let ray = cam.ray_for_pixel(1, 1, 3, 3);
    assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
    assert_eq!(ray.origin, cam.position);
}

#[test]
fn top_row_rays_point_up_and_left_column_points_left() {
    let cam = quilt_camera_at(Vec3::new(0.0, 0.0, 650.0));
    let top_left = cam.ray_for_pixel(0, 0, 100, 100);
    assert!(top_left.direction.y > 0.0);
    assert!(top_left.direction.x < 0.0);

    let edge = cam.ray_for_pixel(50, 0, 101, 1_000_000);
    let half_fov = edge.direction.y.atan2(-edge.direction.z);
    assert!((half_fov.to_degrees() - 20.0).abs() < 0.01);
}

#[test]
fn view_depth_measures_along_forward() {
    let cam = quilt_camera_at(Vec3::new(0.0, 0.0, 650.0));
    assert!((cam.view_depth(Vec3::ZERO) - 650.0).abs() < 1e-3);
    assert!((cam.view_depth(Vec3::new(0.0, 0.0, -300.0)) - 950.0).abs() < 1e-3);
    assert!(cam.view_depth(Vec3::new(0.0, 0.0, 700.0)) < 0.0);
}

#[test]
fn projection_matches_ray_direction() {
    let cam = quilt_camera_at(Vec3::new(30.0, 0.0, 640.0));
    let p = Vec3::new(20.0, -15.0, -40.0);
    let clip = cam.projection_matrix() * cam.view_matrix() * p.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0);
}
