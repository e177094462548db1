//! Tessel Core - scene description, reconstruction filters and image output.
//!
//! This crate provides:
//!
//! - **Reconstruction filters**: `BoxFilter`, `TentFilter`, `GaussianFilter`
//!   behind the `ReconstructionFilter` trait
//! - **Scene description**: `SceneDescription` and `RenderSettings`, loaded
//!   from JSON
//! - **Output**: `Bitmap`, a linear RGB float image saved as PNG or EXR
//!
//! # Example
//!
//! ```ignore
//! use tessel_core::SceneDescription;
//!
//! let scene = SceneDescription::from_file("scene.json")?;
//! let filter = scene.settings.filter.build()?;
//! println!("{}x{} with filter radius {}",
//!     scene.settings.width,
//!     scene.settings.height,
//!     filter.radius());
//! ```

pub mod bitmap;
pub mod error;
pub mod filter;
pub mod scene;

// Re-export commonly used types
pub use bitmap::Bitmap;
pub use error::{BitmapError, BitmapResult, SceneError, SceneResult};
pub use filter::{BoxFilter, FilterDesc, GaussianFilter, ReconstructionFilter, TentFilter};
pub use scene::{CameraDesc, IntegratorDesc, RenderSettings, SceneDescription};
