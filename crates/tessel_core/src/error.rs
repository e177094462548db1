//! Error types for scene configuration and image output.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a scene description.
///
/// All of these are configuration errors: they are reported before any
/// render work is scheduled.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Invalid filter radius {0}: must be finite and positive")]
    InvalidFilterRadius(f32),

    #[error("Invalid filter parameter `{name}` = {value}")]
    InvalidFilterParameter { name: &'static str, value: f32 },

    #[error("Invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("Invalid tile size {0}: must be positive")]
    InvalidTileSize(u32),

    #[error("Invalid sample count {0}: must be positive")]
    InvalidSampleCount(u32),

    #[error("Invalid camera clip range [{near}, {far}]")]
    InvalidClipRange { near: f32, far: f32 },

    #[error("Failed to read scene file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scene parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Errors that can occur while building or saving a bitmap.
#[derive(Error, Debug)]
pub enum BitmapError {
    #[error("Pixel buffer has {actual} values, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

pub type BitmapResult<T> = Result<T, BitmapError>;
