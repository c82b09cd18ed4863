// src/demo.rs

use log::{debug, error, info};

use crate::bootstrap::Libraries;
use crate::config::DemoConfig;
use crate::demo_scene::{create_meshes, DemoMeshes};
use crate::engine_lib::camera::Camera;
use crate::engine_lib::interaction;
use crate::engine_lib::ray_input::{RayInput, RayMode};
use crate::engine_lib::scene_types::{EntityId, Scene};
use crate::engine_lib::stereo::{Eye, FrameScheduler, StereoBegin, StereoStrategy};
use crate::error::VrError;
use crate::rendering_lib::backend::{RenderBackend, Viewport};
use crate::vr::display::{DisplayEvent, PresentLayer};
use crate::vr::session::VrState;

/// What a tick ended up drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Mono,
    /// First tick after entering presentation: nothing drawn, display clock armed.
    SkippedFirstVrFrame,
    Stereo,
}

/// Box rotation (x, y) in radians for a given elapsed time.
pub fn box_rotation(elapsed_ms: f64, time_scale: f64, amplitude: f32) -> (f32, f32) {
    let t = elapsed_ms * time_scale;
    (t.sin() as f32 * amplitude, t.cos() as f32 * amplitude)
}

/// The rotating box in the wireframe room, plus everything needed to show it in a headset.
pub struct Demo {
    config: DemoConfig,
    width: u32,
    height: u32,
    aspect: f32,
    camera: Option<Camera>,
    scene: Scene,
    meshes: DemoMeshes,
    vr: VrState,
    ray_input: Option<RayInput>,
}

impl Demo {
    pub fn new(config: DemoConfig, backend: &mut dyn RenderBackend, width: u32, height: u32) -> Self {
        let mut scene = Scene::new();
        let meshes = create_meshes(&mut scene);
        let mut demo = Self {
            config,
            width,
            height,
            aspect: 1.0,
            camera: None,
            scene,
            meshes,
            vr: VrState::Unsupported,
            ray_input: None,
        };
        // Runs before the camera exists; only the surface is sized here.
        demo.resize(backend, width, height);
        demo.camera = Some(Camera::new(&demo.config.camera, demo.aspect));
        demo
    }

    /// Looks for a display able to present and wires up the picker. Missing VR
    /// support is logged once and leaves the desktop path as the only path.
    pub fn setup_vr(&mut self, libraries: &mut Libraries, backend: &mut dyn RenderBackend) {
        let provider = libraries.display_provider.as_mut().filter(|_| self.config.vr_enabled);
        let Some(provider) = provider else {
            error!("{}", VrError::Unsupported);
            self.vr = VrState::Unsupported;
            return;
        };
        let effect = libraries.effect.unwrap_or_default();
        let state = match VrState::discover(provider.as_mut(), effect, &self.config.camera) {
            Ok(state) => state,
            Err(err) => {
                error!("{err}");
                self.vr = VrState::NoDevice;
                return;
            }
        };
        self.vr = state;

        let mut ray_input = libraries.ray_input.take().unwrap_or_default();
        ray_input.add(self.meshes.box_id);
        self.ray_input = Some(ray_input);
        self.resize(backend, self.width, self.height);
        interaction::on_deselected(&mut self.scene, Some(self.meshes.box_id));
        info!("VR setup finished: {}", self.vr.status_label());
    }

    pub fn resize(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.aspect = self.width as f32 / self.height as f32;
        backend.set_size(self.width, self.height);
        let layer = self.present_layer();
        if let VrState::Ready(session) = &mut self.vr {
            session.update_layer(layer);
        }
        if let Some(camera) = self.camera.as_mut() {
            camera.set_aspect(self.aspect);
        }
        if let Some(ray_input) = self.ray_input.as_mut() {
            ray_input.set_size(self.width, self.height);
        }
    }

    /// One frame: rotate the box, update picking, then draw through whichever path is live.
    pub fn tick(
        &mut self,
        elapsed_ms: f64,
        backend: &mut dyn RenderBackend,
        window: &mut dyn FrameScheduler,
    ) -> FrameOutcome {
        self.update(elapsed_ms);
        self.sync_presentation(backend);
        self.update_input();
        self.render(backend, window)
    }

    pub fn update(&mut self, elapsed_ms: f64) {
        let (x, y) = box_rotation(elapsed_ms, self.config.rotation_time_scale, self.config.rotation_amplitude);
        if let Some(cube) = self.scene.get_mut(self.meshes.box_id) {
            cube.transform.rotation.x = x;
            cube.transform.rotation.y = y;
        }
    }

    pub fn activate_vr(&mut self) -> bool {
        let layer = self.present_layer();
        let VrState::Ready(session) = &mut self.vr else {
            return false;
        };
        session.activate(layer, &mut self.scene, self.ray_input.as_mut()).is_ok()
    }

    pub fn deactivate_vr(&mut self, backend: &mut dyn RenderBackend) -> bool {
        let exited = match &mut self.vr {
            VrState::Ready(session) => session.deactivate(&mut self.scene, self.ray_input.as_mut()),
            VrState::Unsupported | VrState::NoDevice => false,
        };
        if !exited {
            debug!("{}", VrError::NotPresenting);
            return false;
        }
        self.resize(backend, self.width, self.height);
        true
    }

    pub fn toggle_vr(&mut self, backend: &mut dyn RenderBackend) {
        if self.vr.is_presenting() {
            self.deactivate_vr(backend);
        } else {
            self.activate_vr();
        }
    }

    pub fn handle_display_event(&mut self, event: DisplayEvent, backend: &mut dyn RenderBackend) {
        match event {
            DisplayEvent::Activate => {
                self.activate_vr();
            }
            DisplayEvent::Deactivate => {
                self.deactivate_vr(backend);
            }
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn vr(&self) -> &VrState {
        &self.vr
    }

    pub fn box_id(&self) -> EntityId {
        self.meshes.box_id
    }

    pub fn room_id(&self) -> EntityId {
        self.meshes.room_id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn ray_input(&self) -> Option<&RayInput> {
        self.ray_input.as_ref()
    }

    pub fn ray_input_mut(&mut self) -> Option<&mut RayInput> {
        self.ray_input.as_mut()
    }

    /// Label for the enter/exit control; `None` when there is nothing to present on.
    pub fn toggle_label(&self) -> Option<&'static str> {
        match &self.vr {
            VrState::Ready(session) if session.is_presenting() => Some("Exit VR"),
            VrState::Ready(_) => Some("Enable VR"),
            VrState::Unsupported | VrState::NoDevice => None,
        }
    }

    fn present_layer(&self) -> PresentLayer {
        PresentLayer { width: self.width, height: self.height }
    }

    fn sync_presentation(&mut self, backend: &mut dyn RenderBackend) {
        let lost = match &mut self.vr {
            VrState::Ready(session) => session.sync_with_display(&mut self.scene, self.ray_input.as_mut()),
            VrState::Unsupported | VrState::NoDevice => false,
        };
        if lost {
            self.resize(backend, self.width, self.height);
        }
    }

    fn update_input(&mut self) {
        let (Some(ray_input), Some(camera)) = (self.ray_input.as_mut(), self.camera.as_ref()) else {
            return;
        };
        if ray_input.controller().was_pressed() {
            if let VrState::Ready(session) = &mut self.vr {
                if session.is_showing_modal() {
                    session.hide_modal(&mut self.scene, Some(&mut *ray_input));
                }
            }
        }
        ray_input.set_mode(if self.vr.is_presenting() { RayMode::Gaze } else { RayMode::Mouse });
        for event in ray_input.update(&mut self.scene, camera) {
            interaction::apply_ray_event(&mut self.scene, event);
        }
    }

    fn render(&mut self, backend: &mut dyn RenderBackend, window: &mut dyn FrameScheduler) -> FrameOutcome {
        let Some(camera) = self.camera.as_mut() else {
            window.request_animation_frame();
            return FrameOutcome::Mono;
        };
        match self.vr.stereo_mut().filter(|stereo| stereo.is_active()) {
            Some(stereo) => render_stereo(stereo, &mut self.scene, camera, backend, window),
            None => {
                render_mono(&mut self.scene, camera, backend);
                window.request_animation_frame();
                FrameOutcome::Mono
            }
        }
    }
}

fn render_mono(scene: &mut Scene, camera: &Camera, backend: &mut dyn RenderBackend) {
    // Stereo frames leave both switches off; put them back for the single pass.
    backend.set_auto_clear(true);
    scene.matrix_auto_update = true;
    let (width, height) = backend.size();
    backend.set_viewport(Viewport::full(width, height));
    scene.update_matrix_world();
    backend.render(scene, camera);
}

fn render_stereo(
    stereo: &mut dyn StereoStrategy,
    scene: &mut Scene,
    camera: &mut Camera,
    backend: &mut dyn RenderBackend,
    window: &mut dyn FrameScheduler,
) -> FrameOutcome {
    if stereo.begin_frame(window) == StereoBegin::SkipFrame {
        return FrameOutcome::SkippedFirstVrFrame;
    }
    scene.matrix_auto_update = false;
    backend.set_auto_clear(false);
    backend.clear();
    stereo.render_eye(Eye::Left, scene, camera, backend);
    backend.clear_depth();
    stereo.render_eye(Eye::Right, scene, camera, backend);
    stereo.end_frame(window);
    FrameOutcome::Stereo
}
