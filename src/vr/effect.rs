// src/vr/effect.rs

use glam::Mat4;

use crate::engine_lib::camera::Camera;
use crate::engine_lib::scene_types::Scene;
use crate::engine_lib::stereo::Eye;
use crate::rendering_lib::backend::{RenderBackend, Viewport};

/// Side-by-side eye compositor: left eye in the left half of the surface, right eye in the right half.
#[derive(Debug, Clone, Copy, Default)]
pub struct StereoEffect;

impl StereoEffect {
    pub fn eye_viewport(&self, eye: Eye, (width, height): (u32, u32)) -> Viewport {
        let eye_width = width as f32 * 0.5;
        let x = match eye {
            Eye::Left => 0.0,
            Eye::Right => eye_width,
        };
        Viewport { x, y: 0.0, width: eye_width, height: height as f32 }
    }

    /// Draws one eye. The view matrix goes onto the scene root, so the scene
    /// must already have `matrix_auto_update` switched off.
    pub fn render_eye(
        &self,
        eye: Eye,
        view: Mat4,
        projection: Mat4,
        scene: &mut Scene,
        camera: &mut Camera,
        backend: &mut dyn RenderBackend,
    ) {
        backend.set_viewport(self.eye_viewport(eye, backend.size()));
        camera.set_projection(projection);
        scene.matrix = view;
        scene.update_matrix_world();
        backend.render(scene, camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eyes_split_surface_in_half() {
        let effect = StereoEffect;
        let left = effect.eye_viewport(Eye::Left, (1280, 720));
        let right = effect.eye_viewport(Eye::Right, (1280, 720));
        assert_eq!(left, Viewport { x: 0.0, y: 0.0, width: 640.0, height: 720.0 });
        assert_eq!(right, Viewport { x: 640.0, y: 0.0, width: 640.0, height: 720.0 });
    }

    #[test]
    fn odd_widths_keep_fractional_halves() {
        let right = StereoEffect.eye_viewport(Eye::Right, (1001, 10));
        assert_eq!(right.x, 500.5);
        assert_eq!(right.width, 500.5);
    }
}
