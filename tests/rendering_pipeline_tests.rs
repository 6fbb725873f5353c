//! End-to-end frames: camera, meshes, stripes and render modes.
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use software_rasterizer::meshing::{parse_obj, primitives, Mesh, MeshTransform, ObjOptions};
use software_rasterizer::rendering::color::gray;
use software_rasterizer::rendering::renderer::{BACKGROUND_GRAY, UNIFORM_BACKGROUND_GRAY};
use software_rasterizer::rendering::{
    CullMode, FrameConfig, FrameStats, Framebuffer, MaterialTextures, RenderMode, Renderer, ShadingMode,
};
use software_rasterizer::Camera;

const WIDTH: usize = 160;
const HEIGHT: usize = 96;

fn sphere_at(z: f32) -> Mesh {
    primitives::uv_sphere(12.0, 32, 16)
        .unwrap()
        .with_transform(MeshTransform {
            translation: Vec3::new(0.0, 0.0, z),
            ..Default::default()
        })
}

fn render_with(mesh: &mut Mesh, config: &FrameConfig) -> (Framebuffer, FrameStats) {
    let camera = Camera::new(Vec3::ZERO, WIDTH as f32 / HEIGHT as f32);
    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let stats = Renderer::default().render_frame(
        mesh,
        &camera.matrices(),
        &MaterialTextures::checker(),
        config,
        &mut fb,
    );
    (fb, stats)
}

#[test]
fn test_sphere_renders_in_center() {
    let (fb, stats) = render_with(&mut sphere_at(50.0), &FrameConfig::default());
    let background = gray(BACKGROUND_GRAY);

    assert_eq!(stats.triangles_submitted, 32 * 16 * 2);
    assert_eq!(stats.rejected(), 0);
    assert_eq!(
        stats.rasterized + stats.culled + stats.zero_area,
        stats.triangles_submitted
    );
    // From distance d a sphere of radius r shows (1 - r/d) / 2 of its
    // surface: 38% here, so back faces outnumber front faces.
    assert!(stats.rasterized > 0);
    assert!(stats.culled > stats.rasterized);
    // Pole fans collapse to zero area
    assert!(stats.zero_area > 0);

    assert_ne!(fb.pixel(WIDTH / 2, HEIGHT / 2), Some(background));
    assert_eq!(fb.pixel(0, 0), Some(background));
    assert_eq!(fb.pixel(WIDTH - 1, HEIGHT - 1), Some(background));

    let depth = fb.depth(WIDTH / 2, HEIGHT / 2).unwrap();
    assert!(depth > 0.99 && depth < 1.0, "depth {depth}");
}

#[test]
fn test_sphere_behind_camera_is_rejected() {
    let (fb, stats) = render_with(&mut sphere_at(-50.0), &FrameConfig::default());
    assert_eq!(stats.rasterized, 0);
    assert_eq!(stats.pixels_written, 0);
    assert!(fb.color_buffer_slice().iter().all(|&c| c == gray(BACKGROUND_GRAY)));
}

#[test]
fn test_sphere_crossing_screen_edge_is_dropped_per_triangle() {
    // Half the sphere is off screen to the right: those triangles are culled
    // whole, the rest still render.
    let mut mesh = sphere_at(50.0);
    mesh.transform.translation.x = 30.0;
    let (_, stats) = render_with(&mut mesh, &FrameConfig::default());
    assert!(stats.outside_ndc > 0);
    assert!(stats.pixels_written > 0);
}

#[test]
fn test_uniform_background_toggle() {
    let config = FrameConfig {
        uniform_background: true,
        ..Default::default()
    };
    let (fb, _) = render_with(&mut sphere_at(50.0), &config);
    assert_eq!(fb.pixel(0, 0), Some(gray(UNIFORM_BACKGROUND_GRAY)));
}

#[test]
fn test_cull_modes_partition_sphere_triangles() {
    let render_cull = |cull_mode| {
        let config = FrameConfig {
            cull_mode,
            ..Default::default()
        };
        render_with(&mut sphere_at(50.0), &config).1
    };
    let back = render_cull(CullMode::Back);
    let front = render_cull(CullMode::Front);
    let none = render_cull(CullMode::None);

    // Zero-area pole triangles are independent of the cull mode
    assert_eq!(back.zero_area, none.zero_area);
    assert_eq!(front.zero_area, none.zero_area);

    assert_eq!(none.culled, 0);
    assert_eq!(none.rasterized + none.zero_area, none.triangles_submitted);
    assert_eq!(back.rasterized, front.culled);
    assert_eq!(front.rasterized, back.culled);
    assert!(back.rasterized < front.rasterized);
    assert_eq!(back.rasterized + front.rasterized, none.rasterized);
}

#[test]
fn test_stripes_match_single_threaded_output() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);

    for _ in 0..12 {
        let mut mesh = sphere_at(rng.gen_range(30.0..70.0));
        mesh.transform.rotation = Vec3::new(
            rng.gen_range(0.0..std::f32::consts::TAU),
            rng.gen_range(0.0..std::f32::consts::TAU),
            0.0,
        );
        mesh.transform.translation.x = rng.gen_range(-8.0..8.0);

        let mut config = FrameConfig {
            shading_mode: [
                ShadingMode::Combined,
                ShadingMode::Diffuse,
                ShadingMode::ObservedArea,
                ShadingMode::Specular,
            ][rng.gen_range(0..4)],
            render_mode: [RenderMode::Textured, RenderMode::DepthValues, RenderMode::BoundingBox]
                [rng.gen_range(0..3)],
            use_normal_map: rng.gen(),
            cull_mode: [CullMode::Back, CullMode::Front, CullMode::None][rng.gen_range(0..3)],
            ..Default::default()
        };

        let (serial, serial_stats) = render_with(&mut mesh, &config);
        config.stripes = rng.gen_range(2..=13);
        let (parallel, parallel_stats) = render_with(&mut mesh, &config);

        assert_eq!(serial_stats, parallel_stats, "config {config:?}");
        assert!(serial.color_buffer == parallel.color_buffer, "color differs for {config:?}");
        assert!(serial.depth_buffer == parallel.depth_buffer, "depth differs for {config:?}");
    }
}

#[test]
fn test_more_stripes_than_rows() {
    let config = FrameConfig {
        stripes: HEIGHT * 4,
        ..Default::default()
    };
    let (parallel, _) = render_with(&mut sphere_at(50.0), &config);
    let (serial, _) = render_with(&mut sphere_at(50.0), &FrameConfig::default());
    assert!(serial.color_buffer == parallel.color_buffer);
}

#[test]
fn test_renderer_reuse_after_resize() {
    let camera = Camera::new(Vec3::ZERO, 1.0);
    let textures = MaterialTextures::flat();
    let mut renderer = Renderer::default();
    let mut mesh = sphere_at(50.0);
    let mut fb = Framebuffer::new(32, 32);

    let small = renderer.render_frame(&mut mesh, &camera.matrices(), &textures, &FrameConfig::default(), &mut fb);
    fb.resize(64, 64);
    let large = renderer.render_frame(&mut mesh, &camera.matrices(), &textures, &FrameConfig::default(), &mut fb);

    assert_eq!(fb.color_buffer.len(), 64 * 64);
    assert!(large.pixels_written > small.pixels_written * 3);
}

/// Cube exported from a right-handed tool: counter-clockwise faces,
/// outward normals omitted.
const CUBE_OBJ: &str = "\
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
f 5 6 7 8
f 2 1 4 3
f 6 2 3 7
f 1 5 8 4
f 8 7 3 4
f 1 2 6 5
";

#[test]
fn test_right_handed_cube_keeps_outward_faces_either_way() {
    let transform = MeshTransform {
        translation: Vec3::new(0.0, 0.0, 10.0),
        ..Default::default()
    };

    let mut converted = parse_obj(CUBE_OBJ, ObjOptions::default())
        .unwrap()
        .with_transform(transform);
    let (fb, stats) = render_with(&mut converted, &FrameConfig::default());
    // Only the face toward the camera survives back-face culling
    assert_eq!(stats.triangles_submitted, 12);
    assert_eq!(stats.rasterized, 2);
    assert_eq!(stats.culled, 10);
    assert_ne!(fb.pixel(WIDTH / 2, HEIGHT / 2), Some(gray(BACKGROUND_GRAY)));
    let depth = fb.depth(WIDTH / 2, HEIGHT / 2).unwrap();

    // Read as-is the mesh is mirrored, not inverted: mirroring z and
    // reversing the winding cancel for culling, so the same near face is kept.
    let mut raw = parse_obj(CUBE_OBJ, ObjOptions::AS_IS)
        .unwrap()
        .with_transform(transform);
    let (fb, stats) = render_with(&mut raw, &FrameConfig::default());
    assert_eq!(stats.rasterized, 2);
    assert_eq!(stats.culled, 10);
    assert!((fb.depth(WIDTH / 2, HEIGHT / 2).unwrap() - depth).abs() < 1e-6);
}

/// Single triangle in front of a right-handed camera looking down -Z,
/// counter-clockwise as seen from that camera. Its right vertex is at +x.
const RIGHT_HANDED_TRIANGLE_OBJ: &str = "\
v -1 -1 -10
v 1 -1 -10
v 0 1 -10
f 1 2 3
";

#[test]
fn test_right_handed_view_maps_onto_left_handed_camera() {
    let camera = Camera::new(Vec3::ZERO, WIDTH as f32 / HEIGHT as f32).matrices();

    let mut converted = parse_obj(RIGHT_HANDED_TRIANGLE_OBJ, ObjOptions::default()).unwrap();
    let (fb, stats) = render_with(&mut converted, &FrameConfig::default());
    // Z mirrored into view and still front-facing
    assert_eq!(stats.rasterized, 1);
    assert!(stats.pixels_written > 0);

    // The +x vertex stays on the right half of the screen
    converted.transform_into_cache(&camera);
    let right_vertex = converted
        .vertices()
        .iter()
        .zip(converted.transformed())
        .find(|(v, _)| v.position.x > 0.5)
        .map(|(_, out)| out.position)
        .unwrap();
    assert!(right_vertex.x > 0.0);
    assert!((right_vertex.w - 10.0).abs() < 1e-4);

    // Unconverted the triangle sits behind the camera
    let mut raw = parse_obj(RIGHT_HANDED_TRIANGLE_OBJ, ObjOptions::AS_IS).unwrap();
    let (fb_raw, stats) = render_with(&mut raw, &FrameConfig::default());
    assert_eq!(stats.near_zero_w, 1);
    assert_eq!(stats.pixels_written, 0);
    assert_ne!(fb.color_buffer, fb_raw.color_buffer);
}
