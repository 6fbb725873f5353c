/// Texture sampling for the pixel shader.
/// The shader only sees the `Sampler` trait; decoding and storage live here.
use super::color::{rgb_to_u32, unpack_color, ColorRgb};
use crate::error::{RenderError, Result};
use glam::{Vec2, Vec3};
use std::path::Path;

/// Anything that maps a texture coordinate to a color.
///
/// UVs handed in by the rasterizer are non-negative but unbounded above;
/// implementations must map them onto valid texels themselves.
pub trait Sampler: Send + Sync {
    fn sample(&self, uv: Vec2) -> ColorRgb;
}

/// Constant color, independent of UV.
#[derive(Copy, Clone, Debug)]
pub struct SolidColor(pub ColorRgb);

impl Sampler for SolidColor {
    #[inline]
    fn sample(&self, _uv: Vec2) -> ColorRgb {
        self.0
    }
}

/// Procedural checkerboard with `cells` squares along each axis of [0, 1].
#[derive(Copy, Clone, Debug)]
pub struct Checkerboard {
    pub a: ColorRgb,
    pub b: ColorRgb,
    pub cells: u32,
}

impl Sampler for Checkerboard {
    #[inline]
    fn sample(&self, uv: Vec2) -> ColorRgb {
        let cells = self.cells.max(1) as f32;
        let x = (uv.x * cells).floor() as i64;
        let y = (uv.y * cells).floor() as i64;
        if (x + y) & 1 == 0 {
            self.a
        } else {
            self.b
        }
    }
}

/// Decoded RGB texture, nearest-texel sampling.
/// Texels are stored as ARGB32 like the framebuffer.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    width: usize,
    height: usize,
    texels: Vec<u32>,
}

impl ImageTexture {
    /// Build a texture from tightly packed RGB8 rows.
    pub fn from_rgb8(width: usize, height: usize, rgb: &[u8]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTexture(format!(
                "texture dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if rgb.len() != width * height * 3 {
            return Err(RenderError::InvalidTexture(format!(
                "expected {} bytes of RGB data for {width}x{height}, got {}",
                width * height * 3,
                rgb.len()
            )));
        }
        let texels = rgb
            .chunks_exact(3)
            .map(|p| rgb_to_u32(p[0], p[1], p[2]))
            .collect();
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Decode an image file (PNG, JPEG or TGA).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| match source {
                image::ImageError::IoError(io) => RenderError::Io {
                    path: path.to_path_buf(),
                    source: io,
                },
                other => RenderError::Image {
                    path: path.to_path_buf(),
                    source: other,
                },
            })?
            .to_rgb8();
        let (width, height) = image.dimensions();
        log::info!("Loaded texture {} ({}x{})", path.display(), width, height);
        Self::from_rgb8(width as usize, height as usize, image.as_raw())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn texel_coord(t: f32, size: usize) -> usize {
        // Float-to-int casts saturate, so negative and NaN inputs land on 0.
        ((t * size as f32) as usize).min(size - 1)
    }
}

impl Sampler for ImageTexture {
    #[inline]
    fn sample(&self, uv: Vec2) -> ColorRgb {
        let x = Self::texel_coord(uv.x, self.width);
        let y = Self::texel_coord(uv.y, self.height);
        unpack_color(self.texels[y * self.width + x])
    }
}

/// The four maps consumed by the pixel shader.
pub struct MaterialTextures {
    pub diffuse: Box<dyn Sampler>,
    pub normal: Box<dyn Sampler>,
    pub gloss: Box<dyn Sampler>,
    pub specular: Box<dyn Sampler>,
}

impl MaterialTextures {
    pub fn new(
        diffuse: Box<dyn Sampler>,
        normal: Box<dyn Sampler>,
        gloss: Box<dyn Sampler>,
        specular: Box<dyn Sampler>,
    ) -> Self {
        Self {
            diffuse,
            normal,
            gloss,
            specular,
        }
    }

    /// White diffuse, unperturbed normals, no specular response.
    pub fn flat() -> Self {
        Self::new(
            Box::new(SolidColor(Vec3::ONE)),
            Box::new(flat_normal()),
            Box::new(SolidColor(Vec3::splat(0.5))),
            Box::new(SolidColor(Vec3::ZERO)),
        )
    }

    /// Checkerboard diffuse with a moderate specular highlight; used when no
    /// texture set is available on disk.
    pub fn checker() -> Self {
        Self::new(
            Box::new(Checkerboard {
                a: Vec3::new(0.85, 0.35, 0.2),
                b: Vec3::new(0.9, 0.9, 0.85),
                cells: 16,
            }),
            Box::new(flat_normal()),
            Box::new(SolidColor(Vec3::splat(0.6))),
            Box::new(SolidColor(Vec3::splat(0.5))),
        )
    }

    /// Load `{prefix}_diffuse.png`, `{prefix}_normal.png`, `{prefix}_gloss.png`
    /// and `{prefix}_specular.png` from `dir`. The diffuse map is required;
    /// any other missing map falls back to the flat default.
    pub fn load(dir: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let diffuse = ImageTexture::load(dir.join(format!("{prefix}_diffuse.png")))?;
        let mut textures = Self::flat();
        textures.diffuse = Box::new(diffuse);

        for (suffix, slot) in [
            ("normal", &mut textures.normal),
            ("gloss", &mut textures.gloss),
            ("specular", &mut textures.specular),
        ] {
            let path = dir.join(format!("{prefix}_{suffix}.png"));
            match ImageTexture::load(&path) {
                Ok(texture) => *slot = Box::new(texture),
                Err(err) => log::warn!("Using default {suffix} map: {err}"),
            }
        }

        Ok(textures)
    }
}

impl Default for MaterialTextures {
    fn default() -> Self {
        Self::flat()
    }
}

/// Tangent-space "straight up" normal encoded in [0, 1].
fn flat_normal() -> SolidColor {
    SolidColor(Vec3::new(0.5, 0.5, 1.0))
}
