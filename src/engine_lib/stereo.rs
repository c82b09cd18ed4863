// src/engine_lib/stereo.rs

use crate::engine_lib::camera::Camera;
use crate::engine_lib::scene_types::Scene;
use crate::rendering_lib::backend::RenderBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// A "run me again" registration. Fire and forget: nothing is awaited.
pub trait FrameScheduler {
    fn request_animation_frame(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StereoBegin {
    /// Nothing may be drawn this tick; the strategy has already rescheduled.
    SkipFrame,
    Render,
}

/// Plug-in for the two-eye render path.
///
/// The engine owns clearing and the auto-update switches; a strategy supplies
/// per-eye matrices and viewports and owns frame scheduling while active.
pub trait StereoStrategy {
    fn is_active(&self) -> bool;
    fn begin_frame(&mut self, window: &mut dyn FrameScheduler) -> StereoBegin;
    fn render_eye(&mut self, eye: Eye, scene: &mut Scene, camera: &mut Camera, backend: &mut dyn RenderBackend);
    fn end_frame(&mut self, window: &mut dyn FrameScheduler);
}
