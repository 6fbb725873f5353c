//! Command line configuration for the viewer binary.

use crate::meshing::ObjOptions;
use crate::rendering::FrameConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "software_rasterizer",
    about = "CPU triangle rasterizer viewer",
    long_about = "Renders a textured mesh entirely on the CPU.\n\n\
                  Keys: F2 rotation, F5 shading mode, F6 normal map, F7 depth view, \
                  F8 bounding boxes, F9 cull mode, F10 uniform background, F11 FPS, \
                  WASD/Space/Shift + left mouse drag to move, Esc to quit."
)]
pub struct AppConfig {
    /// Initial window width in pixels.
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Initial window height in pixels.
    #[arg(long, default_value = "480")]
    pub height: u32,

    /// OBJ file to display. A UV sphere is used when omitted.
    #[arg(long)]
    pub obj: Option<PathBuf>,

    /// Keep the OBJ's coordinates instead of converting from right-handed.
    #[arg(long, requires = "obj")]
    pub obj_as_is: bool,

    /// Directory holding `{prefix}_diffuse.png` and the optional
    /// `_normal`, `_gloss` and `_specular` maps.
    #[arg(long)]
    pub textures: Option<PathBuf>,

    /// File name prefix of the texture set.
    #[arg(long, default_value = "vehicle")]
    pub texture_prefix: String,

    /// Horizontal stripes rendered in parallel (1 = single-threaded).
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u16).range(1..))]
    pub stripes: u16,

    /// Start with the mesh rotating.
    #[arg(long)]
    pub rotate: bool,

    /// Exit after rendering N frames.
    #[arg(long)]
    pub max_frames: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::parse_from(["software_rasterizer"])
    }
}

impl AppConfig {
    pub fn obj_options(&self) -> ObjOptions {
        if self.obj_as_is {
            ObjOptions::AS_IS
        } else {
            ObjOptions::default()
        }
    }

    /// Initial per-frame settings; key toggles modify the copy held by the
    /// event loop.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            stripes: self.stripes as usize,
            ..FrameConfig::default()
        }
    }
}
