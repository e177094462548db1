//! Per-sample radiance evaluation.
//!
//! The tile pipeline only needs one thing from shading code: given a
//! sampler and an image-space position, produce the color channels and
//! weight to splat. That contract is [`SampleSource`].

use tessel_core::IntegratorDesc;
use tessel_math::{Ray, Vec2, Vec3};

use crate::block::CHANNEL_COUNT;
use crate::camera::Camera;
use crate::sampler::Sampler;

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// Produces the sample recorded at an image position.
///
/// The returned array holds RGB followed by the sample weight (normally
/// 1). Implementations are shared by all worker threads.
pub trait SampleSource: Sync {
    fn render_sample(&self, sampler: &mut dyn Sampler, position: Vec2) -> [f32; CHANNEL_COUNT];
}

impl<F> SampleSource for F
where
    F: Fn(&mut dyn Sampler, Vec2) -> [f32; CHANNEL_COUNT] + Sync,
{
    fn render_sample(&self, sampler: &mut dyn Sampler, position: Vec2) -> [f32; CHANNEL_COUNT] {
        self(sampler, position)
    }
}

/// Pack a color and unit weight into a sample.
#[inline]
pub fn sample_value(color: Color) -> [f32; CHANNEL_COUNT] {
    [color.x, color.y, color.z, 1.0]
}

/// Shading routines that need nothing but the primary ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Integrator {
    /// White-to-blue gradient on the ray's vertical direction
    Sky,
    /// The same color everywhere
    Constant(Color),
    /// Unit ray direction remapped from [-1, 1] to [0, 1]
    Direction,
}

impl From<&IntegratorDesc> for Integrator {
    fn from(desc: &IntegratorDesc) -> Self {
        match desc {
            IntegratorDesc::Sky => Integrator::Sky,
            IntegratorDesc::Constant { color } => Integrator::Constant(Vec3::from_array(*color)),
            IntegratorDesc::Direction => Integrator::Direction,
        }
    }
}

impl Integrator {
    /// Radiance arriving along `ray`.
    pub fn li(&self, ray: &Ray) -> Color {
        match *self {
            Integrator::Sky => sky_gradient(ray),
            Integrator::Constant(color) => color,
            Integrator::Direction => (ray.direction.normalize() + Vec3::ONE) * 0.5,
        }
    }
}

/// Compute sky gradient background.
fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction.normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Camera plus integrator: the sample source built from a scene file.
#[derive(Debug, Clone)]
pub struct CameraIntegrator {
    pub camera: Camera,
    pub integrator: Integrator,
}

impl CameraIntegrator {
    pub fn new(camera: Camera, integrator: Integrator) -> Self {
        Self { camera, integrator }
    }
}

impl SampleSource for CameraIntegrator {
    fn render_sample(&self, _sampler: &mut dyn Sampler, position: Vec2) -> [f32; CHANNEL_COUNT] {
        let ray = self.camera.sample_ray(position);
        sample_value(self.integrator.li(&ray))
    }
}
