/// Procedural meshes for demos, tests and benchmarks.
///
/// Front faces are wound clockwise as seen from outside, matching the
/// default back-face cull mode in the left-handed view space.
use super::mesh::{Mesh, Vertex};
use crate::error::Result;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// UV sphere centered at the origin.
///
/// `segments` runs around the equator and `rings` from pole to pole. UVs
/// span [0, 1] with v = 0 at the north pole; tangents follow +u.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Result<Mesh> {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * PI;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let phi = u * TAU;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            let tangent = Vec3::new(-sin_phi, 0.0, cos_phi);
            vertices.push(Vertex::new(normal * radius, Vec2::new(u, v), normal, tangent));
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let i0 = ring * stride + segment;
            let i1 = i0 + 1;
            let i2 = i0 + stride;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i1, i2, i1, i3, i2]);
        }
    }

    Mesh::new(vertices, indices)
}

/// Quad in the XY plane, centered at the origin and facing -Z (toward a
/// camera placed on the negative Z axis). UV (0, 0) is the top-left corner.
pub fn quad(half_width: f32, half_height: f32) -> Result<Mesh> {
    let normal = Vec3::NEG_Z;
    let tangent = Vec3::X;
    let vertices = vec![
        Vertex::new(Vec3::new(-half_width, half_height, 0.0), Vec2::new(0.0, 0.0), normal, tangent),
        Vertex::new(Vec3::new(half_width, half_height, 0.0), Vec2::new(1.0, 0.0), normal, tangent),
        Vertex::new(Vec3::new(half_width, -half_height, 0.0), Vec2::new(1.0, 1.0), normal, tangent),
        Vertex::new(Vec3::new(-half_width, -half_height, 0.0), Vec2::new(0.0, 1.0), normal, tangent),
    ];
    Mesh::new(vertices, vec![0, 1, 3, 1, 2, 3])
}
