/// Triangle setup and scan conversion.
///
/// Coverage is tested at pixel centers with three edge functions; the same
/// edge values, divided by the signed triangle area, are the barycentric
/// weights. Attributes are interpolated perspective-correctly through the
/// clip-space w kept by the vertex stage.
use super::framebuffer::FrameSlice;
use super::shading::SurfaceAttributes;
use super::vertex_stage::VertexOut;
use crate::count_call;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use glam::{Vec2, Vec3};
use std::ops::Range;

/// Pixels added on every side of the screen-space bounding box so pixel
/// centers next to shared edges are still visited.
pub const BOUNDING_BOX_MARGIN: f32 = 1.0;
/// Signed areas (in px², doubled) below this magnitude produce no fragments.
pub const MIN_TRIANGLE_AREA: f32 = 1e-6;
/// Vertices with clip w at or below this are treated as unprojectable.
pub const NEAR_W_EPSILON: f32 = 1e-6;
/// Vertices with NDC |z| at or below this sit on the near plane, where the
/// `1 / z` depth term is unbounded.
pub const NEAR_Z_EPSILON: f32 = 1e-6;

/// Abstraction over a render target that supports depth-tested pixel writes.
pub trait PixelTarget {
    /// Full framebuffer width (stride for indexing).
    fn width(&self) -> usize;
    /// Full framebuffer height (used for NDC -> screen mapping).
    fn full_height(&self) -> usize;
    /// Rows of the framebuffer this target may write.
    fn rows(&self) -> Range<usize>;
    /// Depth test at global pixel (x, y), writing depth on success. Returns
    /// the color index to write, or None if the fragment is hidden or the
    /// pixel is outside this target.
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize>;
    /// Color index for global pixel (x, y) without touching depth.
    fn color_index(&self, x: usize, y: usize) -> Option<usize>;
    fn write_color(&mut self, index: usize, color: u32);
}

impl<'a> PixelTarget for FrameSlice<'a> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn full_height(&self) -> usize {
        self.full_height
    }

    #[inline]
    fn rows(&self) -> Range<usize> {
        FrameSlice::rows(self)
    }

    #[inline]
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize> {
        FrameSlice::test_depth_and_get_index(self, x, y, depth)
    }

    #[inline]
    fn color_index(&self, x: usize, y: usize) -> Option<usize> {
        self.local_index(x, y)
    }

    #[inline]
    fn write_color(&mut self, index: usize, color: u32) {
        FrameSlice::write_color(self, index, color);
    }
}

/// Which facing survives triangle setup. A triangle is front-facing when
/// its vertices run clockwise on screen (positive signed area, y down).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CullMode {
    #[default]
    Back,
    Front,
    None,
}

impl CullMode {
    pub fn next(self) -> Self {
        match self {
            Self::Back => Self::Front,
            Self::Front => Self::None,
            Self::None => Self::Back,
        }
    }

    #[inline]
    fn keeps(self, signed_area: f32) -> bool {
        match self {
            Self::Back => signed_area > 0.0,
            Self::Front => signed_area < 0.0,
            Self::None => true,
        }
    }
}

/// Why a triangle was dropped before any pixel was visited.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TriangleReject {
    /// Two of the three indices are equal.
    DegenerateIndices,
    /// A vertex lies outside the [-1, 1] NDC square. The whole triangle is
    /// dropped; there is no partial clipping.
    OutsideNdc,
    /// A vertex has clip w near zero or negative (at or behind the eye).
    NearZeroW,
    /// A vertex has NDC z near zero (on the near plane).
    NearZeroZ,
}

/// Inclusive pixel rectangle. Empty when `min > max` on either axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl PixelBounds {
    pub const EMPTY: Self = Self {
        min_x: 1,
        min_y: 1,
        max_x: 0,
        max_y: 0,
    };

    /// Bounding box of `points` grown by `margin` and clamped to the
    /// viewport `[0, width-1] x [0, height-1]`.
    pub fn around(points: &[Vec2; 3], margin: f32, width: usize, height: usize) -> Self {
        if width == 0 || height == 0 {
            return Self::EMPTY;
        }
        let lo = points[0].min(points[1]).min(points[2]) - Vec2::splat(margin);
        let hi = points[0].max(points[1]).max(points[2]) + Vec2::splat(margin);

        let min_x = (lo.x.floor() as i64).max(0);
        let min_y = (lo.y.floor() as i64).max(0);
        let max_x = (hi.x.floor() as i64).min(width as i64 - 1);
        let max_y = (hi.y.floor() as i64).min(height as i64 - 1);
        if min_x > max_x || min_y > max_y {
            return Self::EMPTY;
        }
        Self {
            min_x: min_x as usize,
            min_y: min_y as usize,
            max_x: max_x as usize,
            max_y: max_y as usize,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    pub fn pixel_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max_x - self.min_x + 1) * (self.max_y - self.min_y + 1)
        }
    }

    /// Rows of this box that also lie in `rows`.
    #[inline]
    pub fn rows_within(&self, rows: Range<usize>) -> Range<usize> {
        if self.is_empty() {
            return 0..0;
        }
        let start = self.min_y.max(rows.start);
        let end = (self.max_y + 1).min(rows.end);
        start..end.max(start)
    }

    #[inline]
    pub fn columns(&self) -> Range<usize> {
        if self.is_empty() {
            0..0
        } else {
            self.min_x..self.max_x + 1
        }
    }
}

/// A covered pixel center, before the depth test.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Fragment {
    pub x: usize,
    pub y: usize,
    /// Screen-space barycentric weights, summing to 1.
    pub weights: Vec3,
    /// `1 / Σ weight_i / w_i`: the perspective-correct clip w at this pixel.
    pub w: f32,
    /// `1 / Σ weight_i / z_i` over the vertices' NDC z.
    pub depth: f32,
}

/// 2D cross product (z component of the 3D cross product).
#[inline(always)]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Edge functions of `p` against the triangle `v`. Each value is the doubled
/// signed area of the sub-triangle opposite the matching vertex, so the three
/// sum to the doubled signed area of the whole triangle.
#[inline(always)]
pub fn edge_values(v: &[Vec2; 3], p: Vec2) -> Vec3 {
    Vec3::new(
        cross(p - v[1], v[1] - v[2]),
        cross(p - v[2], v[2] - v[0]),
        cross(p - v[0], v[0] - v[1]),
    )
}

/// Doubled signed area; positive for clockwise vertices on a y-down screen.
#[inline(always)]
pub fn signed_area(v: &[Vec2; 3]) -> f32 {
    cross(v[1] - v[0], v[2] - v[0])
}

/// Normalized barycentric weights of `p`, or None for a zero-area triangle.
#[inline]
pub fn barycentric(v: &[Vec2; 3], p: Vec2) -> Option<Vec3> {
    let area = signed_area(v);
    if area.abs() < MIN_TRIANGLE_AREA {
        return None;
    }
    Some(edge_values(v, p) / area)
}

/// Per-triangle state computed once and shared by every pixel it touches.
#[derive(Copy, Clone, Debug)]
pub struct TriangleSetup {
    pub indices: [usize; 3],
    pub screen: [Vec2; 3],
    inv_w: Vec3,
    inv_z: Vec3,
    area: f32,
    bounds: PixelBounds,
    coverable: bool,
}

impl TriangleSetup {
    /// Run the triangle-level rejection tests and precompute the bounding
    /// box. `screen` and `vertices` are indexed by the triangle's indices.
    pub fn new(
        triangle: [u32; 3],
        screen: &[Vec2],
        vertices: &[VertexOut],
        width: usize,
        height: usize,
        cull_mode: CullMode,
    ) -> Result<Self, TriangleReject> {
        count_call!(FUNCTION_COUNTERS.triangles_submitted);

        let [i0, i1, i2] = triangle.map(|i| i as usize);
        if i0 == i1 || i1 == i2 || i2 == i0 {
            count_call!(FUNCTION_COUNTERS.triangles_degenerate);
            return Err(TriangleReject::DegenerateIndices);
        }

        let v = [&vertices[i0], &vertices[i1], &vertices[i2]];

        let inside = |x: f32| (-1.0..=1.0).contains(&x);
        if v.iter().any(|v| !inside(v.position.x) || !inside(v.position.y)) {
            count_call!(FUNCTION_COUNTERS.triangles_outside_ndc);
            return Err(TriangleReject::OutsideNdc);
        }

        if v.iter().any(|v| !(v.position.w > NEAR_W_EPSILON)) {
            count_call!(FUNCTION_COUNTERS.triangles_near_zero_w);
            return Err(TriangleReject::NearZeroW);
        }

        if v.iter().any(|v| !(v.position.z.abs() > NEAR_Z_EPSILON)) {
            count_call!(FUNCTION_COUNTERS.triangles_near_zero_z);
            return Err(TriangleReject::NearZeroZ);
        }

        let screen = [screen[i0], screen[i1], screen[i2]];
        let area = signed_area(&screen);
        let bounds = PixelBounds::around(&screen, BOUNDING_BOX_MARGIN, width, height);

        let coverable = if area.abs() < MIN_TRIANGLE_AREA {
            count_call!(FUNCTION_COUNTERS.triangles_zero_area);
            false
        } else if !cull_mode.keeps(area) {
            count_call!(FUNCTION_COUNTERS.triangles_culled);
            false
        } else {
            true
        };

        Ok(Self {
            indices: [i0, i1, i2],
            screen,
            inv_w: Vec3::new(v[0].position.w, v[1].position.w, v[2].position.w).recip(),
            inv_z: Vec3::new(v[0].position.z, v[1].position.z, v[2].position.z).recip(),
            area,
            bounds,
            coverable,
        })
    }

    /// Expanded, clamped screen-space bounding box.
    #[inline]
    pub fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    /// Doubled signed screen-space area.
    #[inline]
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Screen-space area too small to produce fragments.
    #[inline]
    pub fn is_zero_area(&self) -> bool {
        self.area.abs() < MIN_TRIANGLE_AREA
    }

    /// False for zero-area triangles and triangles removed by the cull mode.
    /// Such triangles still have a bounding box but produce no fragments.
    #[inline]
    pub fn is_coverable(&self) -> bool {
        self.coverable
    }

    /// Inside test for an arbitrary point: every edge value lies on the same
    /// side as the triangle's area. Points exactly on an edge count as inside.
    #[inline]
    pub fn covers(&self, p: Vec2) -> bool {
        let e = edge_values(&self.screen, p);
        if self.area > 0.0 {
            e.min_element() >= 0.0
        } else {
            e.max_element() <= 0.0
        }
    }

    /// Visit every covered pixel center inside the bounding box whose row lies
    /// in `rows`, in row-major order.
    pub fn for_each_fragment<F: FnMut(Fragment)>(&self, rows: Range<usize>, mut f: F) {
        if !self.coverable {
            return;
        }
        let inv_area = self.area.recip();

        for y in self.bounds.rows_within(rows) {
            let py = y as f32 + 0.5;
            for x in self.bounds.columns() {
                let p = Vec2::new(x as f32 + 0.5, py);
                if !self.covers(p) {
                    continue;
                }
                count_call!(FUNCTION_COUNTERS.pixels_covered);

                let weights = edge_values(&self.screen, p) * inv_area;

                let inv_w = weights.dot(self.inv_w);
                if !inv_w.is_finite() || inv_w.abs() <= f32::MIN_POSITIVE {
                    continue;
                }

                f(Fragment {
                    x,
                    y,
                    weights,
                    w: inv_w.recip(),
                    depth: weights.dot(self.inv_z).recip(),
                });
            }
        }
    }

    /// Perspective-correct attributes at `fragment`.
    ///
    /// Every attribute is divided by its vertex w, blended with the screen
    /// weights, then multiplied by the interpolated w. Directions are
    /// re-normalized and UVs clamped to be non-negative.
    pub fn interpolate(&self, fragment: &Fragment, vertices: &[VertexOut]) -> SurfaceAttributes {
        let [a, b, c] = self.indices.map(|i| &vertices[i]);
        let k = fragment.weights * self.inv_w * fragment.w;

        let uv = a.uv * k.x + b.uv * k.y + c.uv * k.z;
        let blend = |p: Vec3, q: Vec3, r: Vec3| p * k.x + q * k.y + r * k.z;

        SurfaceAttributes {
            uv: uv.max(Vec2::ZERO),
            color: blend(a.color, b.color, c.color),
            normal: blend(a.normal, b.normal, c.normal).normalize_or_zero(),
            tangent: blend(a.tangent, b.tangent, c.tangent).normalize_or_zero(),
            view_direction: blend(a.view_direction, b.view_direction, c.view_direction)
                .normalize_or_zero(),
        }
    }
}
