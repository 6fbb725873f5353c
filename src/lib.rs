/// Software Rasterizer - CPU triangle rendering with perspective-correct
/// texturing, depth testing and Phong shading
pub mod camera;
pub mod config;
pub mod error;
pub mod meshing;
pub mod perf;
pub mod rendering;

pub use camera::{Camera, CameraController, CameraMatrices};
pub use config::AppConfig;
pub use error::{RenderError, Result};
pub use meshing::{load_obj, Mesh, MeshTransform, ObjOptions, Vertex};
pub use perf::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};
pub use rendering::{
    CullMode, FrameConfig, FrameStats, Framebuffer, MaterialTextures, RenderMode, Renderer,
    ShadingConfig, ShadingMode,
};
