/// Error types for the collaborator layers (asset loading, mesh construction).
/// The rasterization core itself never fails; it rejects geometry silently.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("OBJ parse error at line {line}: {message}")]
    ObjParse { line: usize, message: String },

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Invalid texture: {0}")]
    InvalidTexture(String),

    /// Window creation or presentation failed.
    #[error("Display error: {0}")]
    Display(String),
}

impl RenderError {
    pub fn display(err: impl std::fmt::Display) -> Self {
        Self::Display(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
