//! Tessel Renderer - parallel tiled image reconstruction
//!
//! Splits the image into square tiles handed out in a spiral from the
//! center, renders each tile on a worker thread into a scratch
//! [`ImageBlock`], and merges the filtered result into one full-image
//! block that is normalized into the final picture.

mod atomic;
mod block;
mod camera;
mod error;
mod generator;
mod integrator;
mod renderer;
mod sampler;

pub use atomic::AtomicFloat;
pub use block::{
    accumulate_2d, BufferView, FilterTable, ImageBlock, CHANNEL_COUNT, FILTER_RESOLUTION,
    WEIGHT_CHANNEL,
};
pub use camera::Camera;
pub use error::{RenderError, RenderResult};
pub use generator::{BlockGenerator, Tile};
pub use integrator::{sample_value, CameraIntegrator, Color, Integrator, SampleSource};
pub use renderer::{render_block, Renderer};
pub use sampler::{Independent, Sampler};

/// Re-export math types used in the public API
pub use tessel_math::{IVec2, Ray, Rect2i, Vec2, Vec3};
