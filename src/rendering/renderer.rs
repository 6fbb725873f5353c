/// Frame driver: clear, vertex stage, triangle setup, then the fragment stage
/// either on the calling thread or across horizontal framebuffer stripes.
use super::color::{gray, max_to_one, pack_color, WHITE};
use super::framebuffer::Framebuffer;
use super::rasterizer::{CullMode, PixelTarget, TriangleReject, TriangleSetup};
use super::shading::{depth_to_gray, PixelShader, RenderMode, ShadingConfig, ShadingMode};
use super::texture::MaterialTextures;
use super::vertex_stage::{project_to_screen, VertexOut};
use crate::camera::CameraMatrices;
use crate::count_call;
use crate::meshing::Mesh;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use crate::perf_scope;
use glam::Vec2;
use rayon::prelude::*;

/// Background gray for the regular view.
pub const BACKGROUND_GRAY: f32 = 0.39;
/// Background gray while the uniform background toggle is on.
pub const UNIFORM_BACKGROUND_GRAY: f32 = 0.1;

/// Everything the frame driver reads from the outside world each frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameConfig {
    pub shading_mode: ShadingMode,
    pub render_mode: RenderMode,
    pub use_normal_map: bool,
    pub uniform_background: bool,
    pub cull_mode: CullMode,
    /// Number of horizontal stripes rendered in parallel. 0 and 1 both mean
    /// single-threaded.
    pub stripes: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            shading_mode: ShadingMode::default(),
            render_mode: RenderMode::default(),
            use_normal_map: true,
            uniform_background: false,
            cull_mode: CullMode::default(),
            stripes: 1,
        }
    }
}

impl FrameConfig {
    pub fn clear_color(&self) -> u32 {
        if self.uniform_background {
            gray(UNIFORM_BACKGROUND_GRAY)
        } else {
            gray(BACKGROUND_GRAY)
        }
    }
}

/// Per-frame counts, always collected (unlike the profiling counters).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub triangles_submitted: usize,
    pub degenerate: usize,
    pub outside_ndc: usize,
    pub near_zero_w: usize,
    pub near_zero_z: usize,
    /// Passed setup but too small on screen to produce fragments.
    pub zero_area: usize,
    /// Passed setup but removed by the cull mode.
    pub culled: usize,
    pub rasterized: usize,
    pub pixels_written: usize,
}

impl FrameStats {
    fn record_reject(&mut self, reject: TriangleReject) {
        match reject {
            TriangleReject::DegenerateIndices => self.degenerate += 1,
            TriangleReject::OutsideNdc => self.outside_ndc += 1,
            TriangleReject::NearZeroW => self.near_zero_w += 1,
            TriangleReject::NearZeroZ => self.near_zero_z += 1,
        }
    }

    pub fn rejected(&self) -> usize {
        self.degenerate + self.outside_ndc + self.near_zero_w + self.near_zero_z
    }
}

/// Owns the per-frame scratch buffers; capacity is kept between frames.
#[derive(Debug, Default)]
pub struct Renderer {
    pub shading: ShadingConfig,
    screen_vertices: Vec<Vec2>,
    setups: Vec<TriangleSetup>,
}

impl Renderer {
    pub fn new(shading: ShadingConfig) -> Self {
        Self {
            shading,
            screen_vertices: Vec::new(),
            setups: Vec::new(),
        }
    }

    /// Render `mesh` into `framebuffer`. The framebuffer is cleared first, so
    /// after this returns `framebuffer.color_buffer` holds the whole frame.
    pub fn render_frame(
        &mut self,
        mesh: &mut Mesh,
        camera: &CameraMatrices,
        textures: &MaterialTextures,
        config: &FrameConfig,
        framebuffer: &mut Framebuffer,
    ) -> FrameStats {
        perf_scope!("render_frame");
        framebuffer.clear(config.clear_color());

        let mut stats = FrameStats::default();
        let (width, height) = (framebuffer.width, framebuffer.height);
        if width == 0 || height == 0 {
            return stats;
        }

        mesh.transform_into_cache(camera);
        let vertices = mesh.transformed();
        project_to_screen(vertices, width, height, &mut self.screen_vertices);

        self.setups.clear();
        for triangle in mesh.triangles() {
            stats.triangles_submitted += 1;
            match TriangleSetup::new(
                triangle,
                &self.screen_vertices,
                vertices,
                width,
                height,
                config.cull_mode,
            ) {
                Ok(setup) => {
                    if setup.is_coverable() {
                        stats.rasterized += 1;
                    } else if setup.is_zero_area() {
                        stats.zero_area += 1;
                    } else {
                        stats.culled += 1;
                    }
                    self.setups.push(setup);
                }
                Err(reject) => stats.record_reject(reject),
            }
        }

        let shader = PixelShader::new(self.shading, textures, config.use_normal_map);
        let setups = self.setups.as_slice();

        let stripes = config.stripes.clamp(1, height);
        stats.pixels_written = if stripes > 1 {
            framebuffer
                .split_into_stripes(stripes)
                .into_par_iter()
                .map(|mut slice| draw_triangles(&mut slice, setups, vertices, &shader, config))
                .sum()
        } else {
            let mut target = framebuffer.as_full_slice_mut();
            draw_triangles(&mut target, setups, vertices, &shader, config)
        };

        log::debug!(
            "frame: {} submitted, {} rejected, {} zero area, {} culled, {} rasterized, {} pixels",
            stats.triangles_submitted,
            stats.rejected(),
            stats.zero_area,
            stats.culled,
            stats.rasterized,
            stats.pixels_written
        );
        stats
    }
}

/// Fragment stage over prepared triangles, in submission order, limited to
/// the target's rows. Returns the number of color writes.
pub fn draw_triangles<T: PixelTarget>(
    target: &mut T,
    setups: &[TriangleSetup],
    vertices: &[VertexOut],
    shader: &PixelShader<'_>,
    config: &FrameConfig,
) -> usize {
    let rows = target.rows();
    let mut written = 0;

    match config.render_mode {
        RenderMode::BoundingBox => {
            let white = pack_color(WHITE);
            for setup in setups {
                let bounds = setup.bounds();
                for y in bounds.rows_within(rows.clone()) {
                    for x in bounds.columns() {
                        if let Some(index) = target.color_index(x, y) {
                            target.write_color(index, white);
                            written += 1;
                        }
                    }
                }
            }
        }
        RenderMode::DepthValues => {
            for setup in setups {
                setup.for_each_fragment(rows.clone(), |fragment| {
                    if let Some(index) =
                        target.test_depth_and_get_index(fragment.x, fragment.y, fragment.depth)
                    {
                        target.write_color(index, pack_color(depth_to_gray(fragment.depth)));
                        written += 1;
                    }
                });
            }
        }
        RenderMode::Textured => {
            let shade = PixelShader::shade_fn(config.shading_mode);
            for setup in setups {
                setup.for_each_fragment(rows.clone(), |fragment| {
                    if let Some(index) =
                        target.test_depth_and_get_index(fragment.x, fragment.y, fragment.depth)
                    {
                        let attributes = setup.interpolate(&fragment, vertices);
                        let color = max_to_one(shade(shader, &attributes));
                        target.write_color(index, pack_color(color));
                        count_call!(FUNCTION_COUNTERS.pixels_shaded);
                        written += 1;
                    }
                });
            }
        }
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshing::Vertex;
    use glam::{Vec2, Vec3};

    /// One clockwise triangle straight ahead of an identity camera.
    fn facing_triangle() -> Mesh {
        let n = Vec3::NEG_Z;
        let vertices = vec![
            Vertex::new(Vec3::new(-0.5, 0.5, 0.5), Vec2::ZERO, n, Vec3::X),
            Vertex::new(Vec3::new(0.5, 0.5, 0.5), Vec2::X, n, Vec3::X),
            Vertex::new(Vec3::new(-0.5, -0.5, 0.5), Vec2::Y, n, Vec3::X),
        ];
        Mesh::new(vertices, vec![0, 1, 2]).unwrap()
    }

    fn render(config: &FrameConfig, fb: &mut Framebuffer) -> FrameStats {
        let mut mesh = facing_triangle();
        let textures = MaterialTextures::flat();
        Renderer::default().render_frame(&mut mesh, &CameraMatrices::identity(), &textures, config, fb)
    }

    #[test]
    fn background_follows_toggle() {
        let mut fb = Framebuffer::new(8, 8);
        let mut config = FrameConfig::default();
        render(&config, &mut fb);
        assert_eq!(fb.pixel(0, 7), Some(gray(BACKGROUND_GRAY)));

        config.uniform_background = true;
        render(&config, &mut fb);
        assert_eq!(fb.pixel(0, 7), Some(gray(UNIFORM_BACKGROUND_GRAY)));
    }

    #[test]
    fn visible_triangle_is_counted() {
        let mut fb = Framebuffer::new(16, 16);
        let stats = render(&FrameConfig::default(), &mut fb);
        assert_eq!(stats.triangles_submitted, 1);
        assert_eq!(stats.rasterized, 1);
        assert!(stats.pixels_written > 0);
    }

    #[test]
    fn front_cull_mode_hides_front_faces() {
        let mut fb = Framebuffer::new(16, 16);
        let config = FrameConfig {
            cull_mode: CullMode::Front,
            ..Default::default()
        };
        let stats = render(&config, &mut fb);
        assert_eq!(stats.culled, 1);
        assert_eq!(stats.zero_area, 0);
        assert_eq!(stats.pixels_written, 0);
    }

    #[test]
    fn bounding_box_mode_writes_whole_box() {
        let mut fb = Framebuffer::new(16, 16);
        let config = FrameConfig {
            render_mode: RenderMode::BoundingBox,
            ..Default::default()
        };
        let stats = render(&config, &mut fb);
        // Screen vertices (4,4), (12,4), (4,12) grown by one pixel: 3..=13
        assert_eq!(stats.pixels_written, 11 * 11);
        assert_eq!(fb.pixel(13, 13), Some(pack_color(WHITE)));
        assert_eq!(fb.pixel(2, 2), Some(gray(BACKGROUND_GRAY)));
    }

    #[test]
    fn zero_sized_framebuffer_is_skipped() {
        let mut fb = Framebuffer::new(0, 0);
        let stats = render(&FrameConfig::default(), &mut fb);
        assert_eq!(stats, FrameStats::default());
    }
}
