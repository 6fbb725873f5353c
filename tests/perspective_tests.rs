//! Perspective-correct attribute interpolation.
use glam::{Mat4, Vec2, Vec3, Vec4};
use software_rasterizer::camera::{Camera, CameraMatrices};
use software_rasterizer::meshing::primitives;
use software_rasterizer::meshing::MeshTransform;
use software_rasterizer::rendering::vertex_stage::project_to_screen;
use software_rasterizer::rendering::{CullMode, Fragment, TriangleSetup, VertexOut};

const WIDTH: usize = 80;
const HEIGHT: usize = 60;

fn vertex(x: f32, y: f32, z: f32, w: f32, uv: Vec2) -> VertexOut {
    VertexOut {
        position: Vec4::new(x, y, z, w),
        color: Vec3::new(uv.x, uv.y, 0.0),
        uv,
        normal: Vec3::NEG_Z,
        tangent: Vec3::X,
        view_direction: Vec3::Z,
    }
}

fn fragments(verts: &[VertexOut; 3]) -> (TriangleSetup, Vec<Fragment>) {
    let mut screen = Vec::new();
    project_to_screen(verts, WIDTH, HEIGHT, &mut screen);
    let setup = TriangleSetup::new([0, 1, 2], &screen, verts, WIDTH, HEIGHT, CullMode::None).unwrap();
    let mut out = Vec::new();
    setup.for_each_fragment(0..HEIGHT, |f| out.push(f));
    (setup, out)
}

#[test]
fn test_equal_w_matches_linear_interpolation() {
    let uv = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
    let verts = [
        vertex(-0.8, 0.8, 0.5, 3.0, uv[0]),
        vertex(0.8, 0.8, 0.5, 3.0, uv[1]),
        vertex(-0.8, -0.8, 0.5, 3.0, uv[2]),
    ];
    let (setup, frags) = fragments(&verts);
    assert!(!frags.is_empty());

    for f in &frags {
        assert!((f.w - 3.0).abs() < 1e-4);
        let attrs = setup.interpolate(f, &verts);
        let linear = uv[0] * f.weights.x + uv[1] * f.weights.y + uv[2] * f.weights.z;
        assert!(attrs.uv.abs_diff_eq(linear.max(Vec2::ZERO), 1e-5), "{:?} vs {:?}", attrs.uv, linear);
    }
}

#[test]
fn test_unequal_w_uses_perspective_formula() {
    let uv = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
    let w = Vec3::new(1.0, 4.0, 2.0);
    let verts = [
        vertex(-0.8, 0.8, 0.2, w.x, uv[0]),
        vertex(0.8, 0.8, 0.6, w.y, uv[1]),
        vertex(-0.8, -0.8, 0.4, w.z, uv[2]),
    ];
    let (setup, frags) = fragments(&verts);

    let mut max_linear_error: f32 = 0.0;
    for f in &frags {
        let b = f.weights;
        let inv_w = b.x / w.x + b.y / w.y + b.z / w.z;
        let w_interp = 1.0 / inv_w;
        assert!((f.w - w_interp).abs() < 1e-3 * w_interp);

        let expected = (uv[0] * b.x / w.x + uv[1] * b.y / w.y + uv[2] * b.z / w.z) * w_interp;
        let attrs = setup.interpolate(f, &verts);
        assert!(attrs.uv.abs_diff_eq(expected.max(Vec2::ZERO), 1e-4));
        // Color carries the same values and is not clamped
        assert!(attrs.color.truncate().abs_diff_eq(expected, 1e-4));

        let depth = 1.0 / (b.x / 0.2 + b.y / 0.6 + b.z / 0.4);
        assert!((f.depth - depth).abs() < 1e-4);

        let linear = uv[0] * b.x + uv[1] * b.y + uv[2] * b.z;
        max_linear_error = max_linear_error.max((attrs.uv - linear).abs().max_element());
    }
    assert!(max_linear_error > 0.05, "perspective and linear results should differ");
}

#[test]
fn test_directions_are_renormalized() {
    let mut verts = [
        vertex(-0.8, 0.8, 0.5, 1.0, Vec2::ZERO),
        vertex(0.8, 0.8, 0.5, 2.0, Vec2::ZERO),
        vertex(-0.8, -0.8, 0.5, 1.5, Vec2::ZERO),
    ];
    verts[0].normal = Vec3::X;
    verts[1].normal = Vec3::Y;
    verts[2].normal = Vec3::NEG_Z;
    verts[1].tangent = Vec3::Y * 5.0;

    let (setup, frags) = fragments(&verts);
    for f in &frags {
        let attrs = setup.interpolate(f, &verts);
        assert!((attrs.normal.length() - 1.0).abs() < 1e-4);
        assert!((attrs.tangent.length() - 1.0).abs() < 1e-4);
        assert!((attrs.view_direction.length() - 1.0).abs() < 1e-4);
    }
}

#[test]
fn test_negative_uv_is_clamped_to_zero() {
    let verts = [
        vertex(-0.8, 0.8, 0.5, 1.0, Vec2::new(-1.0, -1.0)),
        vertex(0.8, 0.8, 0.5, 1.0, Vec2::new(-1.0, 2.0)),
        vertex(-0.8, -0.8, 0.5, 1.0, Vec2::new(2.0, -1.0)),
    ];
    let (setup, frags) = fragments(&verts);
    for f in &frags {
        let uv = setup.interpolate(f, &verts).uv;
        assert!(uv.x >= 0.0 && uv.y >= 0.0);
    }
}

#[test]
fn test_camera_projection_keeps_view_depth_in_w() {
    let camera = Camera::new(Vec3::ZERO, WIDTH as f32 / HEIGHT as f32);
    let matrices: CameraMatrices = camera.matrices();
    let mut quad = primitives::quad(5.0, 5.0).unwrap().with_transform(MeshTransform {
        translation: Vec3::new(0.0, 0.0, 20.0),
        ..Default::default()
    });
    let out = quad.transform_into_cache(&matrices);
    for v in out {
        assert!((v.position.w - 20.0).abs() < 1e-3);
    }
    let world: Mat4 = quad.world_matrix();
    assert!(world.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::new(0.0, 0.0, 20.0), 1e-6));
}
