//! Scene description for Tessel.
//!
//! A scene file is a small JSON document naming the render settings, the
//! camera and the integrator to run. Geometry and materials are not part
//! of the description; integrators shade from the camera ray alone.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tessel_math::Vec3;

use crate::error::{SceneError, SceneResult};
use crate::filter::FilterDesc;

/// Image and scheduling settings for one render.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Maximum edge length of a square tile
    pub tile_size: u32,

    /// Samples taken per pixel
    pub samples_per_pixel: u32,

    /// Worker thread count (0 = one per core)
    pub threads: usize,

    /// Reconstruction filter used when splatting samples
    pub filter: FilterDesc,

    /// Base seed for the per-tile samplers
    pub seed: u64,
}

impl RenderSettings {
    pub const DEFAULT_TILE_SIZE: u32 = 32;

    /// Check every setting that would otherwise produce a corrupt buffer.
    pub fn validate(&self) -> SceneResult<()> {
        let max = i32::MAX as u32;
        if self.width == 0 || self.height == 0 || self.width > max || self.height > max {
            return Err(SceneError::InvalidImageSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.tile_size == 0 || self.tile_size > max {
            return Err(SceneError::InvalidTileSize(self.tile_size));
        }
        if self.samples_per_pixel == 0 {
            return Err(SceneError::InvalidSampleCount(self.samples_per_pixel));
        }
        // Builds the filter once to run its own parameter checks.
        self.filter.build()?;
        Ok(())
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            tile_size: Self::DEFAULT_TILE_SIZE,
            samples_per_pixel: 1,
            threads: 0,
            filter: FilterDesc::default(),
            seed: 0,
        }
    }
}

/// Pinhole camera placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDesc {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
    pub up: [f32; 3],

    /// Vertical field of view in degrees
    pub fov: f32,

    /// Distance to the near clip plane along the view axis
    pub near_clip: f32,

    /// Distance to the far clip plane along the view axis
    pub far_clip: f32,
}

impl CameraDesc {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn look_at(&self) -> Vec3 {
        Vec3::from_array(self.look_at)
    }

    pub fn up(&self) -> Vec3 {
        Vec3::from_array(self.up)
    }

    /// Check the clip range: `0 < near_clip < far_clip`.
    pub fn validate(&self) -> SceneResult<()> {
        if !(self.near_clip > 0.0 && self.near_clip < self.far_clip) {
            return Err(SceneError::InvalidClipRange {
                near: self.near_clip,
                far: self.far_clip,
            });
        }
        Ok(())
    }
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            look_at: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
            fov: 30.0,
            near_clip: 1e-2,
            far_clip: 1e4,
        }
    }
}

/// Which per-sample shading routine to run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IntegratorDesc {
    /// Vertical white-to-blue sky gradient
    #[default]
    Sky,
    /// Every sample returns the same color
    Constant { color: [f32; 3] },
    /// Ray direction mapped to RGB
    Direction,
}

/// A complete scene file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub settings: RenderSettings,
    pub camera: CameraDesc,
    pub integrator: IntegratorDesc,

    /// Where to write the image when no path is given on the command line
    pub output: Option<PathBuf>,
}

impl SceneDescription {
    /// Parse and validate a scene from a JSON string.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let scene: SceneDescription = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Load, parse and validate a scene file.
    pub fn from_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = Self::from_json(&json)?;
        log::info!(
            "Loaded scene {} ({}x{}, {} spp, {} filter)",
            path.display(),
            scene.settings.width,
            scene.settings.height,
            scene.settings.samples_per_pixel,
            scene.settings.filter.name()
        );
        Ok(scene)
    }

    pub fn validate(&self) -> SceneResult<()> {
        self.settings.validate()?;
        self.camera.validate()
    }

    /// Serialize back to pretty JSON.
    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let scene = SceneDescription::default();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.settings.tile_size, 32);
        assert_eq!(scene.integrator, IntegratorDesc::Sky);
    }

    #[test]
    fn test_parse_partial_scene() {
        let scene = SceneDescription::from_json(
            r#"{
                "settings": { "width": 64, "height": 48, "filter": { "type": "box" } },
                "integrator": { "type": "constant", "color": [1.0, 0.5, 0.25] },
                "output": "out.png"
            }"#,
        )
        .unwrap();

        assert_eq!(scene.settings.width, 64);
        assert_eq!(scene.settings.height, 48);
        assert_eq!(scene.settings.samples_per_pixel, 1);
        assert_eq!(scene.settings.filter, FilterDesc::Box { radius: 0.5 });
        assert_eq!(
            scene.integrator,
            IntegratorDesc::Constant {
                color: [1.0, 0.5, 0.25]
            }
        );
        assert_eq!(scene.output, Some(PathBuf::from("out.png")));
        assert_eq!(scene.camera.look_at(), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!((scene.camera.near_clip, scene.camera.far_clip), (1e-2, 1e4));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = SceneDescription::from_json(r#"{ "settings": { "width": 0 } }"#).unwrap_err();
        assert!(matches!(err, SceneError::InvalidImageSize { width: 0, .. }));

        let err = SceneDescription::from_json(r#"{ "settings": { "tile_size": 0 } }"#).unwrap_err();
        assert!(matches!(err, SceneError::InvalidTileSize(0)));

        let err =
            SceneDescription::from_json(r#"{ "settings": { "samples_per_pixel": 0 } }"#).unwrap_err();
        assert!(matches!(err, SceneError::InvalidSampleCount(0)));

        let err = SceneDescription::from_json(
            r#"{ "settings": { "filter": { "type": "tent", "radius": -1.0 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::InvalidFilterRadius(_)));

        let err = SceneDescription::from_json(
            r#"{ "camera": { "near_clip": 10.0, "far_clip": 5.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::InvalidClipRange { .. }));

        let err = SceneDescription::from_json(r#"{ "camera": { "near_clip": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, SceneError::InvalidClipRange { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = SceneDescription::from_json("{ settings: ").unwrap_err();
        assert!(matches!(err, SceneError::Json(_)));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut scene = SceneDescription::default();
        scene.settings.width = 16;
        scene.settings.height = 8;
        scene.integrator = IntegratorDesc::Direction;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(scene.to_json().unwrap().as_bytes()).unwrap();

        let loaded = SceneDescription::from_file(file.path()).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn test_missing_file() {
        let err = SceneDescription::from_file("/nonexistent/scene.json").unwrap_err();
        assert!(matches!(err, SceneError::Io { .. }));
    }
}
