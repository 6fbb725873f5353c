/// Vertex stage: object space -> clip space -> NDC, with shading attributes
/// carried into world space for the pixel shader.
use crate::count_add;
use crate::meshing::Vertex;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Transformed vertex.
///
/// `position.xyz` holds NDC after the perspective divide; `position.w` is the
/// clip-space w from before the divide. The rasterizer needs that w for
/// perspective-correct interpolation, so it is never divided by itself.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VertexOut {
    pub position: Vec4,
    pub color: Vec3,
    pub uv: Vec2,
    /// World-space, unit length.
    pub normal: Vec3,
    /// World-space, not normalized.
    pub tangent: Vec3,
    /// Unit vector from the camera origin to the world-space position.
    pub view_direction: Vec3,
}

impl VertexOut {
    #[inline]
    pub fn ndc(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.y)
    }
}

/// Matrices for one mesh in one frame.
#[derive(Copy, Clone, Debug)]
pub struct TransformMatrices {
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_origin: Vec3,
}

impl TransformMatrices {
    #[inline]
    pub fn world_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.world
    }
}

/// Transform every vertex and append the results to `out`.
///
/// `out` is appended to, not merged; callers clear it first when it holds
/// the previous frame.
pub fn transform_vertices(vertices: &[Vertex], matrices: &TransformMatrices, out: &mut Vec<VertexOut>) {
    let wvp = matrices.world_view_projection();
    let world = matrices.world;
    out.reserve(vertices.len());

    for v in vertices {
        let clip = wvp * v.position.extend(1.0);
        let w = clip.w;
        // x, y and z only
        let position = Vec4::new(clip.x / w, clip.y / w, clip.z / w, w);

        let world_position = world.transform_point3(v.position);

        out.push(VertexOut {
            position,
            color: v.color,
            uv: v.uv,
            normal: world.transform_vector3(v.normal).normalize_or_zero(),
            tangent: world.transform_vector3(v.tangent),
            view_direction: (world_position - matrices.camera_origin).normalize_or_zero(),
        });
    }

    count_add!(FUNCTION_COUNTERS.vertices_transformed, vertices.len() as u64);
}

/// Convert NDC coordinates to screen space
#[inline]
pub fn ndc_to_screen(ndc: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * width,
        (1.0 - ndc.y) * 0.5 * height, // Flip Y for screen coordinates
    )
}

/// Map every transformed vertex to pixel space, replacing `screen`.
pub fn project_to_screen(vertices: &[VertexOut], width: usize, height: usize, screen: &mut Vec<Vec2>) {
    let (w, h) = (width as f32, height as f32);
    screen.clear();
    screen.extend(vertices.iter().map(|v| ndc_to_screen(v.ndc(), w, h)));
}
