use thiserror::Error;

/// Errors that can occur while building borders from a region raster.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BorderError {
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("unmapped colour {rgb:?} at pixel ({x}, {y})")]
    UnknownColor { x: u32, y: u32, rgb: [u8; 3] },

    #[error("definition table line {line}: {message}")]
    Definitions { line: usize, message: String },

    #[error("owner table: {0}")]
    Owners(String),

    #[error("flood kernel '{kernel}' failed: {message}")]
    Kernel { kernel: String, message: String },

    #[error("render error: {0}")]
    Render(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
