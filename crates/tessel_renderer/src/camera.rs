//! Camera for ray generation.

use tessel_core::CameraDesc;
use tessel_math::{Ray, Vec2, Vec3};

/// Pinhole perspective camera.
///
/// Maps continuous image-space positions (pixels, origin at the top-left
/// corner) to primary rays.
#[derive(Clone, Debug)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    vfov: f32, // Vertical field of view in degrees

    // Clip planes, as distances along the view axis
    near_clip: f32,
    far_clip: f32,

    // Cached computed values (set by initialize())
    center: Vec3,
    viewport_upper_left: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    w: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 1280,
            image_height: 720,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 30.0,
            near_clip: 1e-2,
            far_clip: 1e4,
            center: Vec3::ZERO,
            viewport_upper_left: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            w: Vec3::Z,
        }
    }

    /// Build and initialize a camera from a scene file entry.
    pub fn from_desc(desc: &CameraDesc, width: u32, height: u32) -> Self {
        let mut camera = Self::new()
            .with_resolution(width, height)
            .with_position(desc.position(), desc.look_at(), desc.up())
            .with_fov(desc.fov)
            .with_clip(desc.near_clip, desc.far_clip);
        camera.initialize();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn with_fov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    /// Set the near and far clip distances.
    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near_clip = near;
        self.far_clip = far;
        self
    }

    /// Initialize the camera (must be called before generating rays).
    pub fn initialize(&mut self) {
        self.center = self.look_from;

        // Viewport on the plane one unit in front of the camera
        let h = (self.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Camera basis
        self.w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(self.w).normalize();
        let v = self.w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;
        self.viewport_upper_left = self.center - self.w - viewport_u / 2.0 - viewport_v / 2.0;
    }

    /// Primary ray through image-space `position`.
    ///
    /// The ray segment spans the part of the view between the clip planes.
    pub fn sample_ray(&self, position: Vec2) -> Ray {
        let target = self.viewport_upper_left
            + position.x * self.pixel_delta_u
            + position.y * self.pixel_delta_v;
        let direction = (target - self.center).normalize();

        let inv_z = 1.0 / direction.dot(self.forward());
        Ray::with_segment(
            self.center,
            direction,
            self.near_clip * inv_z,
            self.far_clip * inv_z,
            0.0,
        )
    }

    /// Viewing direction.
    pub fn forward(&self) -> Vec3 {
        -self.w
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
