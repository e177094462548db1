//! Renderer error types.

use tessel_core::{BitmapError, SceneError};
use tessel_math::IVec2;
use thiserror::Error;

/// Errors raised when configuring or running a render.
///
/// Everything here is reported before worker threads start; per-sample
/// problems are absorbed as zero contributions and never surface.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid image size {0}: both dimensions must be positive")]
    InvalidImageSize(IVec2),

    #[error("Invalid tile size {0}: must be positive")]
    InvalidTileSize(i32),

    #[error("Invalid block size {0}: both dimensions must be positive")]
    InvalidBlockSize(IVec2),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Bitmap(#[from] BitmapError),

    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type RenderResult<T> = Result<T, RenderError>;
