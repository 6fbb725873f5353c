/// Mesh data structures for rendering
use crate::camera::CameraMatrices;
use crate::error::{RenderError, Result};
use crate::rendering::vertex_stage::{transform_vertices, TransformMatrices, VertexOut};
use glam::{Mat4, Quat, Vec2, Vec3};

/// Object-space vertex as supplied by a loader.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
    /// Placeholder; the vertex stage computes the real view direction.
    pub view_direction: Vec3,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            uv: Vec2::ZERO,
            normal: Vec3::ZERO,
            tangent: Vec3::ZERO,
            view_direction: Vec3::ZERO,
        }
    }
}

impl Vertex {
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3, tangent: Vec3) -> Self {
        Self {
            position,
            uv,
            normal,
            tangent,
            ..Default::default()
        }
    }
}

/// Scale, Euler rotation (radians, applied X then Y then Z) and translation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MeshTransform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for MeshTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl MeshTransform {
    /// World matrix: scale first, then rotation, then translation.
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            glam::EulerRot::ZYX,
            self.rotation.z,
            self.rotation.y,
            self.rotation.x,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

/// Triangle-list mesh plus the per-frame transformed vertex cache.
#[derive(Clone, Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    pub transform: MeshTransform,
    // Rebuilt every frame: cleared, then refilled by the vertex stage.
    // Capacity is reserved once so steady-state frames never allocate.
    transformed: Vec<VertexOut>,
}

impl Mesh {
    /// Validates that `indices` form whole triangles and reference existing
    /// vertices; the rasterizer relies on both without checking again.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        if vertices.is_empty() {
            return Err(RenderError::InvalidMesh("mesh has no vertices".into()));
        }
        if indices.len() % 3 != 0 {
            return Err(RenderError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(RenderError::InvalidMesh(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }

        let transformed = Vec::with_capacity(vertices.len());
        Ok(Self {
            vertices,
            indices,
            transform: MeshTransform::default(),
            transformed,
        })
    }

    pub fn with_transform(mut self, transform: MeshTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Consecutive, non-overlapping index triples (triangle list).
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    pub fn rotate_y(&mut self, angle: f32) {
        self.transform.rotation.y += angle;
    }

    /// Run the vertex stage for this frame, replacing the previous contents
    /// of the transformed vertex cache.
    pub fn transform_into_cache(&mut self, camera: &CameraMatrices) -> &[VertexOut] {
        let matrices = TransformMatrices {
            world: self.world_matrix(),
            view: camera.view,
            projection: camera.projection,
            camera_origin: camera.origin,
        };
        self.transformed.clear();
        transform_vertices(&self.vertices, &matrices, &mut self.transformed);
        &self.transformed
    }

    /// Output of the most recent `transform_into_cache` call.
    pub fn transformed(&self) -> &[VertexOut] {
        &self.transformed
    }
}
