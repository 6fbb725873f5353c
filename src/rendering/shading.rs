/// Pixel shading: Lambert diffuse, normal mapping and Phong specular.
/// Kept separate from the rasterizer so lighting models
/// can evolve independently of the rasterization pipeline.
use super::color::{ColorRgb, WHITE};
use super::texture::MaterialTextures;
use glam::{Mat3, Vec2, Vec3};
use std::f32::consts::PI;

/// Which lighting term the shader outputs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShadingMode {
    #[default]
    Combined,
    Diffuse,
    ObservedArea,
    Specular,
}

impl ShadingMode {
    /// Next mode in the fixed cycle
    /// Combined -> Diffuse -> ObservedArea -> Specular -> Combined.
    pub fn next(self) -> Self {
        match self {
            Self::Combined => Self::Diffuse,
            Self::Diffuse => Self::ObservedArea,
            Self::ObservedArea => Self::Specular,
            Self::Specular => Self::Combined,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Combined => "combined",
            Self::Diffuse => "diffuse",
            Self::ObservedArea => "observed area",
            Self::Specular => "specular",
        }
    }
}

/// What gets written for covered pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Full pixel shader.
    #[default]
    Textured,
    /// Debug: the triangle's expanded bounding box, solid white, no depth test.
    BoundingBox,
    /// Debug: depth buffer value as grayscale.
    DepthValues,
}

impl RenderMode {
    /// Switch between textured and depth visualization. Has no effect while
    /// the bounding box view is active.
    pub fn toggle_depth_values(self) -> Self {
        match self {
            Self::Textured => Self::DepthValues,
            Self::DepthValues => Self::Textured,
            Self::BoundingBox => Self::BoundingBox,
        }
    }

    /// Switch between textured and bounding box visualization. Has no effect
    /// while the depth view is active.
    pub fn toggle_bounding_box(self) -> Self {
        match self {
            Self::Textured => Self::BoundingBox,
            Self::BoundingBox => Self::Textured,
            Self::DepthValues => Self::DepthValues,
        }
    }
}

/// Depth band mapped onto the gray ramp by the depth visualization.
pub const DEPTH_VIEW_NEAR: f32 = 0.995;
pub const DEPTH_VIEW_FAR: f32 = 1.0;

/// Grayscale depth visualization. Depth in [0.995, 1] maps linearly to
/// [0, 1]; anything nearer than the band is clamped to black.
#[inline]
pub fn depth_to_gray(depth: f32) -> ColorRgb {
    let t = (depth - DEPTH_VIEW_NEAR) / (DEPTH_VIEW_FAR - DEPTH_VIEW_NEAR);
    Vec3::splat(t.clamp(0.0, 1.0))
}

/// Interpolated per-pixel inputs of the shader.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfaceAttributes {
    pub uv: Vec2,
    pub color: ColorRgb,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub view_direction: Vec3,
}

/// Single directional light plus material constants.
#[derive(Copy, Clone, Debug)]
pub struct ShadingConfig {
    /// Direction the light travels (world space, normalized).
    pub light_dir: Vec3,
    /// Diffuse reflection coefficient.
    pub kd: f32,
    pub light_intensity: f32,
    /// Multiplies the gloss map to form the Phong exponent.
    pub shininess: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            light_dir: Vec3::new(0.577, -0.577, 0.577).normalize(),
            kd: 1.0,
            light_intensity: 7.0,
            shininess: 25.0,
        }
    }
}

/// Shading function chosen once per frame from the active mode.
pub type ShadeFn<'a> = fn(&PixelShader<'a>, &SurfaceAttributes) -> ColorRgb;

/// Binds lighting constants, textures and the normal-map toggle for a frame.
#[derive(Copy, Clone)]
pub struct PixelShader<'a> {
    pub config: ShadingConfig,
    pub textures: &'a MaterialTextures,
    pub use_normal_map: bool,
}

impl<'a> PixelShader<'a> {
    pub fn new(config: ShadingConfig, textures: &'a MaterialTextures, use_normal_map: bool) -> Self {
        Self {
            config,
            textures,
            use_normal_map,
        }
    }

    /// Resolve the mode to a plain function so the per-pixel path does not
    /// branch on it.
    pub fn shade_fn(mode: ShadingMode) -> ShadeFn<'a> {
        match mode {
            ShadingMode::Combined => Self::shade_combined,
            ShadingMode::Diffuse => Self::shade_diffuse,
            ShadingMode::ObservedArea => Self::shade_observed_area,
            ShadingMode::Specular => Self::shade_specular,
        }
    }

    /// Shade one pixel. The result is unclamped; callers apply
    /// `color::max_to_one` before packing.
    #[inline]
    pub fn shade(&self, attributes: &SurfaceAttributes, mode: ShadingMode) -> ColorRgb {
        Self::shade_fn(mode)(self, attributes)
    }

    /// Diffuse map tinted by the interpolated vertex color.
    #[inline]
    fn lambert(&self, a: &SurfaceAttributes) -> ColorRgb {
        self.textures.diffuse.sample(a.uv) * a.color * self.config.kd / PI
    }

    /// Shading normal: the normal map transformed out of tangent space, or
    /// the interpolated geometric normal when normal mapping is off.
    #[inline]
    fn shading_normal(&self, a: &SurfaceAttributes) -> Vec3 {
        if !self.use_normal_map {
            return a.normal;
        }
        let basis = Mat3::from_cols(a.tangent, a.normal.cross(a.tangent), a.normal);
        let sampled = self.textures.normal.sample(a.uv) * 2.0 - Vec3::ONE;
        basis * sampled
    }

    #[inline]
    fn observed_area(&self, normal: Vec3) -> f32 {
        normal.dot(-self.config.light_dir).max(0.0)
    }

    #[inline]
    fn phong(&self, specular: f32, gloss: f32, normal: Vec3, view_direction: Vec3) -> f32 {
        let reflected = reflect(-self.config.light_dir, normal);
        let alpha = reflected.dot(view_direction);
        if alpha >= 0.0 {
            specular * alpha.powf(gloss * self.config.shininess)
        } else {
            0.0
        }
    }

    fn shade_diffuse(&self, a: &SurfaceAttributes) -> ColorRgb {
        self.lambert(a)
    }

    fn shade_observed_area(&self, a: &SurfaceAttributes) -> ColorRgb {
        WHITE * self.observed_area(self.shading_normal(a))
    }

    fn shade_specular(&self, a: &SurfaceAttributes) -> ColorRgb {
        WHITE * self.textures.specular.sample(a.uv).x
    }

    fn shade_combined(&self, a: &SurfaceAttributes) -> ColorRgb {
        let lambert = self.lambert(a);
        let normal = self.shading_normal(a);
        let observed_area = self.observed_area(normal);
        let gloss = self.textures.gloss.sample(a.uv).x;
        let specular = self.textures.specular.sample(a.uv).x;
        let phong = self.phong(specular, gloss, normal, a.view_direction);

        lambert * self.config.light_intensity * observed_area + Vec3::splat(phong)
    }
}

/// Reflect `incident` about the plane with unit normal `normal`.
#[inline]
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * incident.dot(normal) * normal
}
