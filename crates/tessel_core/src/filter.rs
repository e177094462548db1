//! Image reconstruction filters.
//!
//! When a radiance sample is added to the image it is convolved with a
//! radially symmetric filter. Filters only describe the 1-D falloff and its
//! support; tabulation and splatting happen in the renderer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

/// Generic radially symmetric image reconstruction filter.
pub trait ReconstructionFilter: fmt::Debug + Send + Sync {
    /// Filter radius in fractional pixels.
    fn radius(&self) -> f32;

    /// Evaluate the filter at distance `x` from the sample.
    ///
    /// Only queried for `x` in `[0, radius]`; the result is non-negative.
    fn eval(&self, x: f32) -> f32;
}

fn check_radius(radius: f32) -> SceneResult<f32> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(SceneError::InvalidFilterRadius(radius))
    }
}

/// Box filter: every sample inside the support has weight one.
///
/// With the default radius of half a pixel this is plain point sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxFilter {
    radius: f32,
}

impl BoxFilter {
    pub const DEFAULT_RADIUS: f32 = 0.5;

    pub fn new(radius: f32) -> SceneResult<Self> {
        Ok(Self {
            radius: check_radius(radius)?,
        })
    }
}

impl Default for BoxFilter {
    fn default() -> Self {
        Self {
            radius: Self::DEFAULT_RADIUS,
        }
    }
}

impl ReconstructionFilter for BoxFilter {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn eval(&self, _x: f32) -> f32 {
        1.0
    }
}

/// Tent (triangle) filter, linear falloff from 1 at the center to 0 at the
/// radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TentFilter {
    radius: f32,
    inv_radius: f32,
}

impl TentFilter {
    pub const DEFAULT_RADIUS: f32 = 1.0;

    pub fn new(radius: f32) -> SceneResult<Self> {
        let radius = check_radius(radius)?;
        Ok(Self {
            radius,
            inv_radius: 1.0 / radius,
        })
    }
}

impl Default for TentFilter {
    fn default() -> Self {
        Self {
            radius: Self::DEFAULT_RADIUS,
            inv_radius: 1.0 / Self::DEFAULT_RADIUS,
        }
    }
}

impl ReconstructionFilter for TentFilter {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn eval(&self, x: f32) -> f32 {
        (1.0 - (x * self.inv_radius).abs()).max(0.0)
    }
}

/// Windowed Gaussian filter.
///
/// The Gaussian is shifted down by its value at the radius so that it
/// reaches exactly zero at the edge of the support.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianFilter {
    radius: f32,
    stddev: f32,
    alpha: f32,
    edge: f32,
}

impl GaussianFilter {
    pub const DEFAULT_RADIUS: f32 = 2.0;
    pub const DEFAULT_STDDEV: f32 = 0.5;

    pub fn new(radius: f32, stddev: f32) -> SceneResult<Self> {
        let radius = check_radius(radius)?;
        if !(stddev.is_finite() && stddev > 0.0) {
            return Err(SceneError::InvalidFilterParameter {
                name: "stddev",
                value: stddev,
            });
        }
        let alpha = -1.0 / (2.0 * stddev * stddev);
        Ok(Self {
            radius,
            stddev,
            alpha,
            edge: (alpha * radius * radius).exp(),
        })
    }

    pub fn stddev(&self) -> f32 {
        self.stddev
    }
}

impl ReconstructionFilter for GaussianFilter {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn eval(&self, x: f32) -> f32 {
        ((self.alpha * x * x).exp() - self.edge).max(0.0)
    }
}

/// Serializable filter selection, as written in a scene file.
///
/// ```json
/// { "type": "gaussian", "radius": 2.0, "stddev": 0.5 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FilterDesc {
    Box {
        #[serde(default = "default_box_radius")]
        radius: f32,
    },
    Tent {
        #[serde(default = "default_tent_radius")]
        radius: f32,
    },
    Gaussian {
        #[serde(default = "default_gaussian_radius")]
        radius: f32,
        #[serde(default = "default_gaussian_stddev")]
        stddev: f32,
    },
}

fn default_box_radius() -> f32 {
    BoxFilter::DEFAULT_RADIUS
}

fn default_tent_radius() -> f32 {
    TentFilter::DEFAULT_RADIUS
}

fn default_gaussian_radius() -> f32 {
    GaussianFilter::DEFAULT_RADIUS
}

fn default_gaussian_stddev() -> f32 {
    GaussianFilter::DEFAULT_STDDEV
}

impl Default for FilterDesc {
    fn default() -> Self {
        FilterDesc::Tent {
            radius: TentFilter::DEFAULT_RADIUS,
        }
    }
}

impl FilterDesc {
    /// Instantiate the described filter, validating its parameters.
    pub fn build(&self) -> SceneResult<Box<dyn ReconstructionFilter>> {
        Ok(match *self {
            FilterDesc::Box { radius } => Box::new(BoxFilter::new(radius)?),
            FilterDesc::Tent { radius } => Box::new(TentFilter::new(radius)?),
            FilterDesc::Gaussian { radius, stddev } => {
                Box::new(GaussianFilter::new(radius, stddev)?)
            }
        })
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            FilterDesc::Box { .. } => "box",
            FilterDesc::Tent { .. } => "tent",
            FilterDesc::Gaussian { .. } => "gaussian",
        }
    }

    pub fn radius(&self) -> f32 {
        match *self {
            FilterDesc::Box { radius }
            | FilterDesc::Tent { radius }
            | FilterDesc::Gaussian { radius, .. } => radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tent_falloff() {
        let tent = TentFilter::new(2.0).unwrap();
        assert_eq!(tent.eval(0.0), 1.0);
        assert_eq!(tent.eval(1.0), 0.5);
        assert_eq!(tent.eval(-1.0), 0.5);
        assert_eq!(tent.eval(2.0), 0.0);
        assert_eq!(tent.eval(3.0), 0.0);
    }

    #[test]
    fn test_box_is_constant() {
        let b = BoxFilter::new(1.5).unwrap();
        assert_eq!(b.radius(), 1.5);
        assert_eq!(b.eval(0.0), 1.0);
        assert_eq!(b.eval(1.4), 1.0);
        assert_eq!(BoxFilter::default().radius(), 0.5);
    }

    #[test]
    fn test_gaussian_reaches_zero_at_radius() {
        let g = GaussianFilter::new(2.0, 0.5).unwrap();
        assert!((g.eval(0.0) - (1.0 - (-8.0f32).exp())).abs() < 1e-6);
        assert!(g.eval(1.0) < g.eval(0.5));
        assert_eq!(g.eval(2.0), 0.0);
    }

    #[test]
    fn test_invalid_radius_rejected() {
        assert!(matches!(
            TentFilter::new(0.0),
            Err(SceneError::InvalidFilterRadius(r)) if r == 0.0
        ));
        assert!(BoxFilter::new(-1.0).is_err());
        assert!(GaussianFilter::new(f32::NAN, 0.5).is_err());
        assert!(matches!(
            GaussianFilter::new(2.0, 0.0),
            Err(SceneError::InvalidFilterParameter { name: "stddev", .. })
        ));
    }

    #[test]
    fn test_filter_desc_json() {
        let desc: FilterDesc = serde_json::from_str(r#"{ "type": "gaussian" }"#).unwrap();
        assert_eq!(
            desc,
            FilterDesc::Gaussian {
                radius: 2.0,
                stddev: 0.5
            }
        );

        let desc: FilterDesc = serde_json::from_str(r#"{ "type": "tent", "radius": 1.5 }"#).unwrap();
        let filter = desc.build().unwrap();
        assert_eq!(filter.radius(), 1.5);
        assert_eq!(desc.name(), "tent");
    }

    #[test]
    fn test_filter_desc_build_validates() {
        let desc = FilterDesc::Box { radius: 0.0 };
        assert!(desc.build().is_err());
    }
}
