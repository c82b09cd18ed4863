// src/engine_lib/controller.rs

use std::cell::Cell;
use std::rc::Rc;

use glam::{EulerRot, Quat};
use winit::{
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Head orientation shared between the controls that write it and the polyfill display that reads it.
pub type SharedPose = Rc<Cell<Quat>>;

/// Desktop stand-in for headset orientation tracking: right-drag or arrow keys
/// turn the head.
pub struct PoseControls {
    yaw_delta_keyboard: f32,
    pitch_delta_keyboard: f32,

    mouse_dx_accum: f32,
    mouse_dy_accum: f32,

    current_yaw: f32,
    current_pitch: f32,

    pub mouse_sensitivity: f32,
    dragging: bool,
    pose: SharedPose,
}

impl Default for PoseControls {
    fn default() -> Self {
        Self::new(0.002)
    }
}

impl PoseControls {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            yaw_delta_keyboard: 0.0,
            pitch_delta_keyboard: 0.0,
            mouse_dx_accum: 0.0,
            mouse_dy_accum: 0.0,
            current_yaw: 0.0,
            current_pitch: 0.0,
            mouse_sensitivity: sensitivity,
            dragging: false,
            pose: Rc::new(Cell::new(Quat::IDENTITY)),
        }
    }

    pub fn pose_handle(&self) -> SharedPose {
        Rc::clone(&self.pose)
    }

    pub fn orientation(&self) -> Quat {
        self.pose.get()
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let pressed = key_event.state == ElementState::Pressed;
                let axis = if pressed { 1.0 } else { 0.0 };
                match key_event.physical_key {
                    PhysicalKey::Code(KeyCode::ArrowLeft) => { self.yaw_delta_keyboard = axis; true }
                    PhysicalKey::Code(KeyCode::ArrowRight) => { self.yaw_delta_keyboard = -axis; true }
                    PhysicalKey::Code(KeyCode::ArrowUp) => { self.pitch_delta_keyboard = axis; true }
                    PhysicalKey::Code(KeyCode::ArrowDown) => { self.pitch_delta_keyboard = -axis; true }
                    PhysicalKey::Code(KeyCode::KeyR) if pressed => { self.reset(); true }
                    _ => false,
                }
            }
            WindowEvent::MouseInput { state, button: MouseButton::Right, .. } => {
                self.dragging = *state == ElementState::Pressed;
                true
            }
            WindowEvent::Focused(false) => {
                self.dragging = false;
                false
            }
            _ => false,
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.add_mouse_delta(*dx as f32, *dy as f32);
        }
    }

    pub fn add_mouse_delta(&mut self, dx: f32, dy: f32) {
        if !self.dragging {
            return;
        }
        self.mouse_dx_accum += dx;
        self.mouse_dy_accum += dy;
    }

    pub fn reset(&mut self) {
        self.current_yaw = 0.0;
        self.current_pitch = 0.0;
        self.mouse_dx_accum = 0.0;
        self.mouse_dy_accum = 0.0;
        self.pose.set(Quat::IDENTITY);
    }

    pub fn update(&mut self, dt: f32) {
        let rot_speed_keyboard = 1.5 * dt;

        self.current_yaw -= self.mouse_dx_accum * self.mouse_sensitivity;
        self.current_yaw += self.yaw_delta_keyboard * rot_speed_keyboard;

        self.current_pitch -= self.mouse_dy_accum * self.mouse_sensitivity;
        self.current_pitch += self.pitch_delta_keyboard * rot_speed_keyboard;

        self.mouse_dx_accum = 0.0;
        self.mouse_dy_accum = 0.0;

        let pitch_limit = std::f32::consts::FRAC_PI_2 - 0.01;
        self.current_pitch = self.current_pitch.clamp(-pitch_limit, pitch_limit);

        self.pose.set(Quat::from_euler(EulerRot::YXZ, self.current_yaw, self.current_pitch, 0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn mouse_motion_ignored_unless_dragging() {
        let mut controls = PoseControls::default();
        controls.add_mouse_delta(100.0, 0.0);
        controls.update(0.016);
        assert_eq!(controls.orientation(), Quat::IDENTITY);

        controls.dragging = true;
        controls.add_mouse_delta(100.0, 0.0);
        controls.update(0.016);
        assert_ne!(controls.orientation(), Quat::IDENTITY);
    }

    #[test]
    fn pitch_is_clamped_short_of_vertical() {
        let mut controls = PoseControls::new(1.0);
        controls.dragging = true;
        controls.add_mouse_delta(0.0, -10_000.0);
        controls.update(0.016);
        let forward = controls.orientation() * Vec3::NEG_Z;
        assert!(forward.y < 1.0);
        assert!(forward.y > 0.99);
    }

    #[test]
    fn shared_handle_sees_updates_and_reset() {
        let mut controls = PoseControls::default();
        let handle = controls.pose_handle();
        controls.yaw_delta_keyboard = 1.0;
        controls.update(1.0);
        assert_eq!(handle.get(), controls.orientation());
        assert_ne!(handle.get(), Quat::IDENTITY);
        controls.reset();
        assert_eq!(handle.get(), Quat::IDENTITY);
    }
}
