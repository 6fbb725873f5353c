/// Software rasterization pipeline
/// Vertex stage -> triangle setup -> depth test -> pixel shader
pub mod color;
pub mod depth;
pub mod framebuffer;
pub mod rasterizer;
pub mod renderer;
pub mod shading;
pub mod texture;
pub mod vertex_stage;

pub use color::ColorRgb;
pub use framebuffer::{FrameSlice, Framebuffer};
pub use rasterizer::{CullMode, Fragment, PixelBounds, PixelTarget, TriangleReject, TriangleSetup};
pub use renderer::{FrameConfig, FrameStats, Renderer};
pub use shading::{PixelShader, RenderMode, ShadingConfig, ShadingMode, SurfaceAttributes};
pub use texture::{Checkerboard, ImageTexture, MaterialTextures, Sampler, SolidColor};
pub use vertex_stage::{TransformMatrices, VertexOut};
