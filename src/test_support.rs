// src/test_support.rs

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::engine_lib::camera::Camera;
use crate::engine_lib::scene_types::Scene;
use crate::engine_lib::stereo::FrameScheduler;
use crate::error::VrError;
use crate::rendering_lib::backend::{RenderBackend, Viewport};
use crate::vr::display::{DisplayCapabilities, DisplayProvider, FrameData, PresentLayer, VrDisplay};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    SetSize(u32, u32),
    SetViewport(Viewport),
    SetAutoClear(bool),
    Clear,
    ClearDepth,
    Render { viewport: Viewport, root: Mat4, projection: Mat4, auto_update: bool },
}

/// Backend that records every call instead of drawing.
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    size: (u32, u32),
    viewport: Viewport,
    auto_clear: bool,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            size: (width, height),
            viewport: Viewport::full(width, height),
            auto_clear: true,
        }
    }

    pub fn renders(&self) -> Vec<&BackendCall> {
        self.calls.iter().filter(|c| matches!(c, BackendCall::Render { .. })).collect()
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }
}

impl RenderBackend for RecordingBackend {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.calls.push(BackendCall::SetSize(width, height));
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.calls.push(BackendCall::SetViewport(viewport));
    }

    fn set_auto_clear(&mut self, auto_clear: bool) {
        self.auto_clear = auto_clear;
        self.calls.push(BackendCall::SetAutoClear(auto_clear));
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    fn clear(&mut self) {
        self.calls.push(BackendCall::Clear);
    }

    fn clear_depth(&mut self) {
        self.calls.push(BackendCall::ClearDepth);
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) {
        self.calls.push(BackendCall::Render {
            viewport: self.viewport,
            root: scene.matrix,
            projection: camera.projection,
            auto_update: scene.matrix_auto_update,
        });
    }
}

#[derive(Debug, Default)]
pub struct CountingScheduler {
    pub requests: u32,
}

impl FrameScheduler for CountingScheduler {
    fn request_animation_frame(&mut self) {
        self.requests += 1;
    }
}

#[derive(Debug, Default)]
pub struct DisplayLog {
    pub presenting: bool,
    pub reject_present: bool,
    pub present_requests: u32,
    pub exits: u32,
    pub frame_data_reads: u32,
    pub raf_requests: u32,
    pub submits: u32,
    pub depth_range: (f32, f32),
    pub layer: Option<PresentLayer>,
}

pub type SharedDisplayLog = Rc<RefCell<DisplayLog>>;

pub const SCRIPTED_HALF_IPD: f32 = 0.03;

/// Headset double with its own frame clock. State lives in a shared log so
/// tests can inspect and poke it after the display has been boxed away.
pub struct ScriptedDisplay {
    name: String,
    can_present: bool,
    log: SharedDisplayLog,
}

impl ScriptedDisplay {
    pub fn new(name: &str, can_present: bool) -> (Self, SharedDisplayLog) {
        let log = SharedDisplayLog::default();
        let display = Self { name: name.to_string(), can_present, log: Rc::clone(&log) };
        (display, log)
    }

    pub fn eye_projection() -> Mat4 {
        Mat4::perspective_rh(1.5, 0.9, 0.1, 10000.0)
    }
}

impl VrDisplay for ScriptedDisplay {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> DisplayCapabilities {
        DisplayCapabilities {
            can_present: self.can_present,
            has_orientation: true,
            has_position: true,
            max_layers: 1,
        }
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        self.log.borrow_mut().depth_range = (near, far);
    }

    fn depth_range(&self) -> (f32, f32) {
        self.log.borrow().depth_range
    }

    fn is_presenting(&self) -> bool {
        self.log.borrow().presenting
    }

    fn request_present(&mut self, layer: PresentLayer) -> Result<(), VrError> {
        let mut log = self.log.borrow_mut();
        log.present_requests += 1;
        if log.reject_present {
            return Err(VrError::PresentRejected(self.name.clone()));
        }
        log.presenting = true;
        log.layer = Some(layer);
        Ok(())
    }

    fn exit_present(&mut self) {
        let mut log = self.log.borrow_mut();
        log.exits += 1;
        log.presenting = false;
    }

    fn get_frame_data(&mut self, frame: &mut FrameData) {
        self.log.borrow_mut().frame_data_reads += 1;
        frame.left_view = Mat4::from_translation(Vec3::new(SCRIPTED_HALF_IPD, 0.0, 0.0));
        frame.right_view = Mat4::from_translation(Vec3::new(-SCRIPTED_HALF_IPD, 0.0, 0.0));
        frame.left_projection = Self::eye_projection();
        frame.right_projection = Self::eye_projection();
    }

    fn request_animation_frame(&mut self, _window: &mut dyn FrameScheduler) {
        self.log.borrow_mut().raf_requests += 1;
    }

    fn submit_frame(&mut self) {
        self.log.borrow_mut().submits += 1;
    }

    fn update_layer(&mut self, layer: PresentLayer) {
        self.log.borrow_mut().layer = Some(layer);
    }
}

pub struct ScriptedProvider {
    result: Option<Result<Vec<Box<dyn VrDisplay>>, VrError>>,
}

impl ScriptedProvider {
    pub fn with_displays(displays: Vec<Box<dyn VrDisplay>>) -> Self {
        Self { result: Some(Ok(displays)) }
    }

    pub fn failing(error: VrError) -> Self {
        Self { result: Some(Err(error)) }
    }
}

impl DisplayProvider for ScriptedProvider {
    fn get_displays(&mut self) -> Result<Vec<Box<dyn VrDisplay>>, VrError> {
        self.result.take().unwrap_or_else(|| Ok(Vec::new()))
    }
}
