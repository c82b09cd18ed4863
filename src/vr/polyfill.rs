// src/vr/polyfill.rs

use glam::{Mat4, Vec3};

use super::display::{DisplayCapabilities, DisplayProvider, FrameData, PresentLayer, VrDisplay};
use crate::config::CameraSettings;
use crate::engine_lib::controller::SharedPose;
use crate::engine_lib::stereo::FrameScheduler;
use crate::error::VrError;

const POLYFILL_FRAME_MS: f64 = 1000.0 / 60.0;

/// Software display for machines without a headset: presents side-by-side
/// into the window, with head orientation supplied by the desktop pose controls.
pub struct CardboardDisplay {
    name: String,
    depth_near: f32,
    depth_far: f32,
    fov_y_deg: f32,
    ipd: f32,
    pose: SharedPose,
    layer: Option<PresentLayer>,
    frame_index: u64,
    frames_submitted: u64,
}

impl CardboardDisplay {
    pub fn new(camera: &CameraSettings, ipd: f32, pose: SharedPose) -> Self {
        Self {
            name: "Cardboard VRDisplay (polyfill)".to_string(),
            depth_near: camera.near,
            depth_far: camera.far,
            fov_y_deg: camera.view_angle_deg,
            ipd,
            pose,
            layer: None,
            frame_index: 0,
            frames_submitted: 0,
        }
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    fn eye_aspect(&self) -> f32 {
        match self.layer {
            Some(layer) if layer.height > 0 => (layer.width as f32 * 0.5) / layer.height as f32,
            _ => 1.0,
        }
    }

    fn eye_view(&self, head: Mat4, offset: f32) -> Mat4 {
        (head * Mat4::from_translation(Vec3::new(offset, 0.0, 0.0))).inverse()
    }
}

impl VrDisplay for CardboardDisplay {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> DisplayCapabilities {
        DisplayCapabilities {
            can_present: true,
            has_orientation: true,
            has_position: false,
            max_layers: 1,
        }
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        self.depth_near = near;
        self.depth_far = far;
    }

    fn depth_range(&self) -> (f32, f32) {
        (self.depth_near, self.depth_far)
    }

    fn is_presenting(&self) -> bool {
        self.layer.is_some()
    }

    fn request_present(&mut self, layer: PresentLayer) -> Result<(), VrError> {
        if layer.width == 0 || layer.height == 0 {
            return Err(VrError::PresentRejected(self.name.clone()));
        }
        log::info!("{}: presenting {}x{}", self.name, layer.width, layer.height);
        self.layer = Some(layer);
        Ok(())
    }

    fn exit_present(&mut self) {
        if self.layer.take().is_some() {
            log::info!("{}: exited presentation", self.name);
        }
    }

    fn get_frame_data(&mut self, frame: &mut FrameData) {
        let orientation = self.pose.get();
        let head = Mat4::from_quat(orientation);
        let half_ipd = self.ipd * 0.5;
        let projection = Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.eye_aspect(),
            self.depth_near,
            self.depth_far,
        );

        frame.timestamp_ms = self.frame_index as f64 * POLYFILL_FRAME_MS;
        frame.orientation = orientation;
        frame.position = None;
        frame.left_view = self.eye_view(head, -half_ipd);
        frame.right_view = self.eye_view(head, half_ipd);
        frame.left_projection = projection;
        frame.right_projection = projection;
        self.frame_index += 1;
    }

    fn request_animation_frame(&mut self, window: &mut dyn FrameScheduler) {
        window.request_animation_frame();
    }

    fn submit_frame(&mut self) {
        // Both eyes are already in the window surface; nothing to hand off.
        self.frames_submitted += 1;
    }

    fn update_layer(&mut self, layer: PresentLayer) {
        if self.layer.is_some() {
            self.layer = Some(layer);
        }
    }
}

/// Enumerates exactly one polyfill display.
pub struct PolyfillProvider {
    camera: CameraSettings,
    ipd: f32,
    pose: SharedPose,
}

impl PolyfillProvider {
    pub fn new(camera: CameraSettings, ipd: f32, pose: SharedPose) -> Self {
        Self { camera, ipd, pose }
    }
}

impl DisplayProvider for PolyfillProvider {
    fn get_displays(&mut self) -> Result<Vec<Box<dyn VrDisplay>>, VrError> {
        Ok(vec![Box::new(CardboardDisplay::new(&self.camera, self.ipd, self.pose.clone()))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_lib::controller::PoseControls;
    use glam::Quat;

    fn display() -> CardboardDisplay {
        CardboardDisplay::new(&CameraSettings::default(), 0.064, PoseControls::default().pose_handle())
    }

    #[test]
    fn rejects_empty_layer() {
        let mut d = display();
        let err = d.request_present(PresentLayer { width: 0, height: 600 }).unwrap_err();
        assert!(matches!(err, VrError::PresentRejected(_)));
        assert!(!d.is_presenting());
    }

    #[test]
    fn eye_views_are_offset_by_ipd() {
        let mut d = display();
        d.request_present(PresentLayer { width: 1600, height: 800 }).unwrap();
        let mut frame = FrameData::default();
        d.get_frame_data(&mut frame);

        let left_origin = frame.left_view.inverse().w_axis.truncate();
        let right_origin = frame.right_view.inverse().w_axis.truncate();
        assert!((left_origin.x + 0.032).abs() < 1e-6);
        assert!((right_origin.x - 0.032).abs() < 1e-6);
        // Eye aspect is half the layer width over its height.
        let expected = Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.1, 10000.0);
        assert_eq!(frame.left_projection, expected);
    }

    #[test]
    fn frame_data_follows_shared_pose() {
        let pose = PoseControls::default().pose_handle();
        let mut d = CardboardDisplay::new(&CameraSettings::default(), 0.0, pose.clone());
        pose.set(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let mut frame = FrameData::default();
        d.get_frame_data(&mut frame);
        assert_eq!(frame.orientation, pose.get());
        // Head turned left: a point on -X ends up in front of the eye.
        let p = frame.left_view.transform_point3(Vec3::new(-5.0, 0.0, 0.0));
        assert!(p.z < -4.9);
    }

    #[test]
    fn exit_and_layer_updates() {
        let mut d = display();
        d.update_layer(PresentLayer { width: 10, height: 10 });
        assert!(!d.is_presenting());
        d.request_present(PresentLayer { width: 10, height: 10 }).unwrap();
        d.exit_present();
        assert!(!d.is_presenting());
    }

    #[test]
    fn submits_are_counted_and_ride_the_window_clock() {
        let mut d = display();
        let mut window = crate::test_support::CountingScheduler::default();
        d.request_present(PresentLayer { width: 800, height: 600 }).unwrap();
        for _ in 0..3 {
            d.request_animation_frame(&mut window);
            d.submit_frame();
        }
        assert_eq!(d.frames_submitted(), 3);
        assert_eq!(window.requests, 3);
    }

    #[test]
    fn depth_range_reaches_the_eye_projection() {
        let mut d = display();
        assert_eq!(d.depth_range(), (0.1, 10000.0));
        d.set_depth_range(0.5, 50.0);
        assert_eq!(d.depth_range(), (0.5, 50.0));

        d.request_present(PresentLayer { width: 1600, height: 800 }).unwrap();
        let mut frame = FrameData::default();
        d.get_frame_data(&mut frame);
        assert_eq!(frame.left_projection, Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.5, 50.0));
    }
}
