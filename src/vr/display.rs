// src/vr/display.rs

use glam::{Mat4, Quat, Vec3};

use crate::engine_lib::stereo::{Eye, FrameScheduler};
use crate::error::VrResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayCapabilities {
    pub can_present: bool,
    pub has_orientation: bool,
    pub has_position: bool,
    pub max_layers: u32,
}

/// Per-frame pose and eye matrices. Allocated once and refilled by the display every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    pub timestamp_ms: f64,
    pub left_view: Mat4,
    pub left_projection: Mat4,
    pub right_view: Mat4,
    pub right_projection: Mat4,
    pub orientation: Quat,
    pub position: Option<Vec3>,
}

impl Default for FrameData {
    fn default() -> Self {
        Self {
            timestamp_ms: 0.0,
            left_view: Mat4::IDENTITY,
            left_projection: Mat4::IDENTITY,
            right_view: Mat4::IDENTITY,
            right_projection: Mat4::IDENTITY,
            orientation: Quat::IDENTITY,
            position: None,
        }
    }
}

impl FrameData {
    pub fn view(&self, eye: Eye) -> Mat4 {
        match eye {
            Eye::Left => self.left_view,
            Eye::Right => self.right_view,
        }
    }

    pub fn projection(&self, eye: Eye) -> Mat4 {
        match eye {
            Eye::Left => self.left_projection,
            Eye::Right => self.right_projection,
        }
    }
}

/// The surface a display presents from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentLayer {
    pub width: u32,
    pub height: u32,
}

/// Platform notifications that a display wants to start or stop presenting
/// (headset put on, taken off, window hidden).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    Activate,
    Deactivate,
}

pub trait VrDisplay {
    fn display_name(&self) -> &str;
    fn capabilities(&self) -> DisplayCapabilities;
    fn set_depth_range(&mut self, near: f32, far: f32);
    fn depth_range(&self) -> (f32, f32);
    fn is_presenting(&self) -> bool;
    fn request_present(&mut self, layer: PresentLayer) -> VrResult<()>;
    fn exit_present(&mut self);
    /// Writes the latest pose and eye matrices into a caller-owned buffer.
    fn get_frame_data(&mut self, frame: &mut FrameData);
    /// Schedules the next tick on the display's own clock. Displays without one
    /// forward to `window`.
    fn request_animation_frame(&mut self, window: &mut dyn FrameScheduler);
    fn submit_frame(&mut self);
    /// Called when the presenting surface changes size.
    fn update_layer(&mut self, _layer: PresentLayer) {}
}

pub trait DisplayProvider {
    fn get_displays(&mut self) -> VrResult<Vec<Box<dyn VrDisplay>>>;
}
