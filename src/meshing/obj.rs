/// Wavefront OBJ loading into triangle-list meshes.
///
/// Supports `v`, `vt`, `vn` and `f` records. Faces may use the `v`, `v/vt`,
/// `v//vn` and `v/vt/vn` forms with positive or negative (relative) indices;
/// polygons are fan-triangulated. Each unique position/uv/normal corner
/// becomes one vertex. Missing normals are accumulated from face normals and
/// tangents are always derived from UV gradients.
use super::mesh::{Mesh, Vertex};
use crate::error::{RenderError, Result};
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::path::Path;

/// Conversions applied while loading.
///
/// The defaults convert a right-handed, bottom-up-V file (what most tools
/// export) into the renderer's left-handed space: Z is mirrored, V is
/// flipped and each face's winding is reversed so that `(b - a) x (c - a)`
/// keeps pointing outward after the mirror.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ObjOptions {
    pub flip_z: bool,
    pub flip_v: bool,
    pub flip_winding: bool,
}

impl Default for ObjOptions {
    fn default() -> Self {
        Self {
            flip_z: true,
            flip_v: true,
            flip_winding: true,
        }
    }
}

impl ObjOptions {
    /// Use the file's coordinates unchanged.
    pub const AS_IS: Self = Self {
        flip_z: false,
        flip_v: false,
        flip_winding: false,
    };
}

/// Read and parse an OBJ file.
pub fn load_obj(path: impl AsRef<Path>, options: ObjOptions) -> Result<Mesh> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_obj(&source, options)?;
    log::info!(
        "Loaded {} ({} vertices, {} triangles)",
        path.display(),
        mesh.vertices().len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// One face corner: 0-based indices into the position, uv and normal lists.
type Corner = (usize, Option<usize>, Option<usize>);

#[derive(Default)]
struct ObjBuilder {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    corners: HashMap<Corner, u32>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    has_missing_normals: bool,
}

/// Parse OBJ text. Unknown record types (`o`, `g`, `s`, `usemtl`, ...) are
/// ignored.
pub fn parse_obj(source: &str, options: ObjOptions) -> Result<Mesh> {
    let mut builder = ObjBuilder::default();

    for (line_index, raw) in source.lines().enumerate() {
        let line_number = line_index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let mut p = parse_vec3(&mut parts, line_number)?;
                if options.flip_z {
                    p.z = -p.z;
                }
                builder.positions.push(p);
            }
            "vt" => {
                let u = parse_float(parts.next(), line_number)?;
                let v = match parts.next() {
                    Some(token) => parse_float(Some(token), line_number)?,
                    None => 0.0,
                };
                let v = if options.flip_v { 1.0 - v } else { v };
                builder.uvs.push(Vec2::new(u, v));
            }
            "vn" => {
                let mut n = parse_vec3(&mut parts, line_number)?;
                if options.flip_z {
                    n.z = -n.z;
                }
                builder.normals.push(n.normalize_or_zero());
            }
            "f" => {
                let face = parts
                    .map(|token| builder.resolve_corner(token, line_number))
                    .collect::<Result<Vec<u32>>>()?;
                if face.len() < 3 {
                    return Err(parse_error(line_number, "face needs at least 3 vertices"));
                }
                for i in 1..face.len() - 1 {
                    let (b, c) = if options.flip_winding {
                        (face[i + 1], face[i])
                    } else {
                        (face[i], face[i + 1])
                    };
                    builder.indices.extend_from_slice(&[face[0], b, c]);
                }
            }
            _ => {}
        }
    }

    builder.finish()
}

impl ObjBuilder {
    /// Map a face token to a vertex index, creating the vertex on first use.
    fn resolve_corner(&mut self, token: &str, line: usize) -> Result<u32> {
        let mut fields = token.split('/');
        let position = resolve_index(fields.next(), self.positions.len(), line)?
            .ok_or_else(|| parse_error(line, "face corner has no position index"))?;
        let uv = resolve_index(fields.next(), self.uvs.len(), line)?;
        let normal = resolve_index(fields.next(), self.normals.len(), line)?;

        let key = (position, uv, normal);
        if let Some(&index) = self.corners.get(&key) {
            return Ok(index);
        }

        let index = u32::try_from(self.vertices.len())
            .map_err(|_| parse_error(line, "too many vertices"))?;
        if normal.is_none() {
            self.has_missing_normals = true;
        }
        self.vertices.push(Vertex {
            position: self.positions[position],
            uv: uv.map_or(Vec2::ZERO, |i| self.uvs[i]),
            normal: normal.map_or(Vec3::ZERO, |i| self.normals[i]),
            ..Default::default()
        });
        self.corners.insert(key, index);
        Ok(index)
    }

    fn finish(mut self) -> Result<Mesh> {
        if self.has_missing_normals {
            accumulate_face_normals(&mut self.vertices, &self.indices);
        }
        compute_tangents(&mut self.vertices, &self.indices);
        Mesh::new(self.vertices, self.indices)
    }
}

/// Resolve a 1-based (or negative, relative) OBJ index against `count`
/// elements. An absent or empty field yields `None`.
fn resolve_index(field: Option<&str>, count: usize, line: usize) -> Result<Option<usize>> {
    let Some(field) = field.filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    let raw: i64 = field
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index '{field}'")))?;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => (count as i64 + r).try_into().ok(),
    };
    match resolved {
        Some(index) if index < count => Ok(Some(index)),
        _ => Err(parse_error(
            line,
            format!("index {raw} out of range ({count} defined)"),
        )),
    }
}

fn parse_float(token: Option<&str>, line: usize) -> Result<f32> {
    let token = token.ok_or_else(|| parse_error(line, "missing number"))?;
    token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid number '{token}'")))
}

fn parse_vec3<'a>(parts: &mut impl Iterator<Item = &'a str>, line: usize) -> Result<Vec3> {
    Ok(Vec3::new(
        parse_float(parts.next(), line)?,
        parse_float(parts.next(), line)?,
        parse_float(parts.next(), line)?,
    ))
}

fn parse_error(line: usize, message: impl Into<String>) -> RenderError {
    RenderError::ObjParse {
        line,
        message: message.into(),
    }
}

/// Fill zero normals with the normalized sum of adjacent face normals.
/// Front faces have `(b - a) x (c - a)` pointing outward.
fn accumulate_face_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut sums = vec![Vec3::ZERO; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let p = [vertices[a].position, vertices[b].position, vertices[c].position];
        let face = (p[1] - p[0]).cross(p[2] - p[0]);
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }
    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        if vertex.normal == Vec3::ZERO {
            vertex.normal = sum.normalize_or_zero();
        }
    }
}

/// Per-vertex tangents from UV gradients, orthogonalized against the normal.
/// Vertices whose UVs give no usable gradient get an arbitrary tangent
/// perpendicular to the normal.
pub fn compute_tangents(vertices: &mut [Vertex], indices: &[u32]) {
    let mut sums = vec![Vec3::ZERO; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let edge1 = vertices[b].position - vertices[a].position;
        let edge2 = vertices[c].position - vertices[a].position;
        let duv1 = vertices[b].uv - vertices[a].uv;
        let duv2 = vertices[c].uv - vertices[a].uv;

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let tangent = (edge1 * duv2.y - edge2 * duv1.y) / det;
        sums[a] += tangent;
        sums[b] += tangent;
        sums[c] += tangent;
    }

    for (vertex, sum) in vertices.iter_mut().zip(sums) {
        let n = vertex.normal;
        let t = (sum - n * n.dot(sum)).normalize_or_zero();
        vertex.tangent = if t == Vec3::ZERO {
            n.any_orthonormal_vector()
        } else {
            t
        };
    }
}
