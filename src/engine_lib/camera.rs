// src/engine_lib/camera.rs

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::config::CameraSettings;

/// Perspective camera sitting at the origin looking down -Z.
///
/// The camera never moves; head pose reaches the scene through the root matrix
/// when a headset is presenting.
#[derive(Debug, Clone)]
pub struct Camera {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    pub projection: Mat4,
}

impl Camera {
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        let mut camera = Self {
            fov_y_deg: settings.view_angle_deg,
            aspect,
            znear: settings.near,
            zfar: settings.far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    pub fn update_projection_matrix(&mut self) {
        let aspect = if self.aspect.is_finite() && self.aspect > 0.0 { self.aspect } else { 1.0 };
        self.projection = Mat4::perspective_rh(self.fov_y_deg.to_radians(), aspect, self.znear, self.zfar);
    }

    /// Overrides the projection with one supplied by a display. Cleared by the next
    /// `update_projection_matrix`.
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection
    }

    /// Ray through a point in normalized device coordinates (x right, y up, both in [-1, 1]).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> (Vec3, Vec3) {
        let inverse = self.view_projection().inverse();
        let near = inverse * ndc.extend(0.0).extend(1.0);
        let far = inverse * ndc.extend(0.5).extend(1.0);
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;
        (Vec3::ZERO, (far - near).normalize_or_zero())
    }
}
