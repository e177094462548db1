use crate::Vec3;

/// Offset used to keep secondary rays from re-hitting their own surface.
///
/// Also the tolerance used when deciding whether a reconstruction filter is
/// wider than a single pixel.
pub const RAY_EPSILON: f32 = 1500.0 * (f32::EPSILON / 2.0);

/// A ray segment in 3D space.
///
/// Only parameters in `[mint, maxt]` along `direction` are part of the ray.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub mint: f32,
    pub maxt: f32,
    pub time: f32,
}

impl Ray {
    /// Create a new ray covering `[RAY_EPSILON, inf)`.
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self::with_segment(origin, direction, RAY_EPSILON, f32::INFINITY, time)
    }

    /// Create a new ray restricted to `[mint, maxt]`.
    pub fn with_segment(origin: Vec3, direction: Vec3, mint: f32, maxt: f32, time: f32) -> Self {
        Self {
            origin,
            direction,
            mint,
            maxt,
            time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_creation() {
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let direction = Vec3::new(0.0, 2.0, 0.0);
        let ray = Ray::new(origin, direction, 0.5);

        assert_eq!(ray.origin, origin);
        assert_eq!(ray.direction, direction);
        assert_eq!(ray.mint, RAY_EPSILON);
        assert_eq!(ray.maxt, f32::INFINITY);
        assert_eq!(ray.time, 0.5);
    }

    #[test]
    fn test_ray_with_segment() {
        let ray = Ray::with_segment(Vec3::ZERO, Vec3::Z, 1.0, 5.0, 0.0);
        assert_eq!((ray.mint, ray.maxt), (1.0, 5.0));
    }

    #[test]
    fn test_ray_epsilon_magnitude() {
        assert!(RAY_EPSILON > 8.9e-5 && RAY_EPSILON < 9.0e-5);
    }
}
