use super::*;

#[test]
fn world_matrix_composes_parent_transforms() {
    let mut graph = SceneGraph::new();
    let group = graph.add_group(
        "group",
        Transform3 {
            position: Vec3::new(0.0, 10.0, -5.0),
            rotation: Vec3::ZERO,
            scale: Vec3::splat(2.0),
        },
        None,
    );
    let child = graph.add_mesh(
        "child",
        Geometry::Sphere { radius: 1.0 },
        Material::default(),
        Transform3::at(Vec3::new(3.0, 0.0, 0.0)),
        Some(group),
    );

    let p = graph.world_matrix(child).transform_point3(Vec3::ZERO);
    assert!((p - Vec3::new(6.0, 10.0, -5.0)).length() < 1e-5);
    assert_eq!(graph.find("child"), Some(child));
    assert_eq!(graph.meshes().count(), 1);
}

#[test]
fn z_rotation_turns_x_into_y() {
    let t = Transform3 {
        rotation: Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
        ..Transform3::default()
    };
    let p = t.matrix().transform_point3(Vec3::X);
    assert!((p - Vec3::Y).length() < 1e-5);
}

#[test]
fn hex_colors_decode() {
    assert_eq!(rgb_hex(0xffffff), Vec3::ONE);
    let c = rgb_hex(0x4488ff);
    assert!((c.x - 0x44 as f32 / 255.0).abs() < 1e-6);
    assert!((c.z - 1.0).abs() < 1e-6);
}
