// src/vr/session.rs

use log::{error, info, warn};

use super::display::{DisplayProvider, FrameData, PresentLayer, VrDisplay};
use super::effect::StereoEffect;
use crate::config::CameraSettings;
use crate::demo_scene::create_press_button_modal;
use crate::engine_lib::camera::Camera;
use crate::engine_lib::ray_input::RayInput;
use crate::engine_lib::scene_types::{EntityId, Scene};
use crate::engine_lib::stereo::{Eye, FrameScheduler, StereoBegin, StereoStrategy};
use crate::error::VrError;
use crate::rendering_lib::backend::RenderBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Hidden,
    Shown(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Idle,
    Presenting {
        /// Set on entry; the first tick only hands scheduling over to the display.
        first_frame: bool,
        modal: ModalState,
    },
}

/// VR support for the whole run. Decided once at startup.
pub enum VrState {
    /// No VR runtime at all; every VR path is skipped for the session.
    Unsupported,
    /// Runtime present but nothing able to present (or enumeration failed).
    NoDevice,
    Ready(VrSession),
}

impl VrState {
    /// Picks the first display that can present. Enumeration errors propagate; an
    /// empty result is logged and yields `NoDevice`.
    pub fn discover(
        provider: &mut dyn DisplayProvider,
        effect: StereoEffect,
        camera: &CameraSettings,
    ) -> Result<Self, VrError> {
        let displays = provider.get_displays()?;
        let Some(display) = displays.into_iter().find(|d| d.capabilities().can_present) else {
            warn!("{}", VrError::NoPresentableDisplay);
            return Ok(VrState::NoDevice);
        };
        info!("Using VR display: {}", display.display_name());
        Ok(VrState::Ready(VrSession::new(display, effect, camera)))
    }

    pub fn session(&self) -> Option<&VrSession> {
        match self {
            VrState::Ready(session) => Some(session),
            VrState::Unsupported | VrState::NoDevice => None,
        }
    }

    pub fn has_display(&self) -> bool {
        self.session().is_some()
    }

    pub fn is_presenting(&self) -> bool {
        self.session().is_some_and(VrSession::is_presenting)
    }

    pub fn is_showing_modal(&self) -> bool {
        self.session().is_some_and(VrSession::is_showing_modal)
    }

    pub fn stereo_mut(&mut self) -> Option<&mut dyn StereoStrategy> {
        match self {
            VrState::Ready(session) => Some(session),
            VrState::Unsupported | VrState::NoDevice => None,
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            VrState::Unsupported => "VR not supported",
            VrState::NoDevice => "No VR display",
            VrState::Ready(session) if session.is_presenting() => "Presenting",
            VrState::Ready(_) => "VR display ready",
        }
    }
}

pub struct VrSession {
    display: Box<dyn VrDisplay>,
    frame_data: FrameData,
    effect: StereoEffect,
    presentation: Presentation,
}

impl VrSession {
    pub fn new(mut display: Box<dyn VrDisplay>, effect: StereoEffect, camera: &CameraSettings) -> Self {
        display.set_depth_range(camera.near, camera.far);
        Self {
            display,
            frame_data: FrameData::default(),
            effect,
            presentation: Presentation::Idle,
        }
    }

    pub fn display(&self) -> &dyn VrDisplay {
        self.display.as_ref()
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn is_presenting(&self) -> bool {
        self.display.is_presenting()
    }

    pub fn is_showing_modal(&self) -> bool {
        matches!(self.presentation, Presentation::Presenting { modal: ModalState::Shown(_), .. })
    }

    /// Starts presenting from `layer` and puts the press-button modal in front of the viewer.
    /// A no-op while already presenting. A presentation the display dropped on its own is
    /// torn down first so its modal does not outlive it.
    pub fn activate(
        &mut self,
        layer: PresentLayer,
        scene: &mut Scene,
        ray_input: Option<&mut RayInput>,
    ) -> Result<(), VrError> {
        if matches!(self.presentation, Presentation::Presenting { .. }) {
            if self.display.is_presenting() {
                return Ok(());
            }
            self.finish_presentation(scene, ray_input);
        }
        if let Err(err) = self.display.request_present(layer) {
            error!("Unable to init VR: {err}");
            return Err(err);
        }
        let modal = scene.add(create_press_button_modal());
        self.presentation = Presentation::Presenting {
            first_frame: true,
            modal: ModalState::Shown(modal),
        };
        Ok(())
    }

    /// Returns false (and does nothing) unless the display is presenting.
    pub fn deactivate(&mut self, scene: &mut Scene, ray_input: Option<&mut RayInput>) -> bool {
        if !self.display.is_presenting() {
            return false;
        }
        self.display.exit_present();
        self.finish_presentation(scene, ray_input);
        true
    }

    /// Removes the modal and shows the picker's reticle in its place. False if no modal was shown.
    pub fn hide_modal(&mut self, scene: &mut Scene, ray_input: Option<&mut RayInput>) -> bool {
        let Presentation::Presenting { modal, .. } = &mut self.presentation else {
            return false;
        };
        let ModalState::Shown(id) = *modal else {
            return false;
        };
        scene.remove(id);
        *modal = ModalState::Hidden;
        if let Some(ray_input) = ray_input {
            ray_input.attach_mesh(scene);
        }
        true
    }

    /// Notices a display that stopped presenting on its own. Returns true if the session fell back to idle.
    pub fn sync_with_display(&mut self, scene: &mut Scene, ray_input: Option<&mut RayInput>) -> bool {
        if matches!(self.presentation, Presentation::Idle) || self.display.is_presenting() {
            return false;
        }
        warn!("{} stopped presenting", self.display.display_name());
        self.finish_presentation(scene, ray_input);
        true
    }

    pub fn update_layer(&mut self, layer: PresentLayer) {
        self.display.update_layer(layer);
    }

    fn finish_presentation(&mut self, scene: &mut Scene, ray_input: Option<&mut RayInput>) {
        self.hide_modal(scene, ray_input);
        self.presentation = Presentation::Idle;
    }
}

impl StereoStrategy for VrSession {
    fn is_active(&self) -> bool {
        matches!(self.presentation, Presentation::Presenting { .. }) && self.display.is_presenting()
    }

    fn begin_frame(&mut self, window: &mut dyn FrameScheduler) -> StereoBegin {
        if let Presentation::Presenting { first_frame, .. } = &mut self.presentation {
            if *first_frame {
                // The tick that got us here came from the window's clock; submitting
                // from it is invalid, so hand over to the display's clock first.
                *first_frame = false;
                self.display.request_animation_frame(window);
                return StereoBegin::SkipFrame;
            }
        }
        self.display.get_frame_data(&mut self.frame_data);
        StereoBegin::Render
    }

    fn render_eye(&mut self, eye: Eye, scene: &mut Scene, camera: &mut Camera, backend: &mut dyn RenderBackend) {
        let view = self.frame_data.view(eye);
        let projection = self.frame_data.projection(eye);
        self.effect.render_eye(eye, view, projection, scene, camera, backend);
    }

    fn end_frame(&mut self, window: &mut dyn FrameScheduler) {
        self.display.request_animation_frame(window);
        self.display.submit_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CountingScheduler, ScriptedDisplay, ScriptedProvider};

    fn ready_session() -> (VrSession, crate::test_support::SharedDisplayLog) {
        let (display, log) = ScriptedDisplay::new("HMD", true);
        let session = VrSession::new(Box::new(display), StereoEffect, &CameraSettings::default());
        (session, log)
    }

    #[test]
    fn discovery_with_no_presentable_display_stays_without_device() {
        let (display, _) = ScriptedDisplay::new("Magic window", false);
        let mut provider = ScriptedProvider::with_displays(vec![Box::new(display)]);
        let state = VrState::discover(&mut provider, StereoEffect, &CameraSettings::default()).unwrap();
        assert!(matches!(state, VrState::NoDevice));
        assert!(!state.has_display());
    }

    #[test]
    fn discovery_copies_depth_range_onto_first_presentable_display() {
        let (magic, _) = ScriptedDisplay::new("Magic window", false);
        let (hmd, log) = ScriptedDisplay::new("HMD", true);
        let (second, _) = ScriptedDisplay::new("Second HMD", true);
        let mut provider = ScriptedProvider::with_displays(vec![Box::new(magic), Box::new(hmd), Box::new(second)]);
        let state = VrState::discover(&mut provider, StereoEffect, &CameraSettings::default()).unwrap();
        let session = state.session().expect("display found");
        assert_eq!(session.display().display_name(), "HMD");
        assert_eq!(log.borrow().depth_range, (0.1, 10000.0));
    }

    #[test]
    fn enumeration_failure_propagates() {
        let mut provider = ScriptedProvider::failing(VrError::Enumeration("runtime crashed".into()));
        let result = VrState::discover(&mut provider, StereoEffect, &CameraSettings::default());
        assert!(matches!(result, Err(VrError::Enumeration(_))));
    }

    #[test]
    fn rejected_present_leaves_session_idle() {
        let (mut session, log) = ready_session();
        log.borrow_mut().reject_present = true;
        let mut scene = Scene::new();
        let result = session.activate(PresentLayer { width: 800, height: 600 }, &mut scene, None);
        assert!(matches!(result, Err(VrError::PresentRejected(_))));
        assert_eq!(session.presentation(), Presentation::Idle);
        assert!(scene.is_empty());
    }

    #[test]
    fn activation_shows_modal_and_arms_first_frame_guard() {
        let (mut session, _) = ready_session();
        let mut scene = Scene::new();
        session.activate(PresentLayer { width: 800, height: 600 }, &mut scene, None).unwrap();
        let Presentation::Presenting { first_frame, modal: ModalState::Shown(id) } = session.presentation() else {
            panic!("expected presenting with modal");
        };
        assert!(first_frame);
        assert!(scene.contains(id));

        // Activating again while presenting must not stack a second modal.
        session.activate(PresentLayer { width: 800, height: 600 }, &mut scene, None).unwrap();
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn first_frame_skips_then_renders() {
        let (mut session, log) = ready_session();
        let mut scene = Scene::new();
        let mut window = CountingScheduler::default();
        session.activate(PresentLayer { width: 800, height: 600 }, &mut scene, None).unwrap();

        assert_eq!(session.begin_frame(&mut window), StereoBegin::SkipFrame);
        assert_eq!(log.borrow().raf_requests, 1);
        assert_eq!(log.borrow().frame_data_reads, 0);

        assert_eq!(session.begin_frame(&mut window), StereoBegin::Render);
        assert_eq!(log.borrow().frame_data_reads, 1);
        assert_eq!(window.requests, 0);
    }

    #[test]
    fn hide_modal_swaps_in_reticle() {
        let (mut session, _) = ready_session();
        let mut scene = Scene::new();
        let mut ray_input = RayInput::new();
        session.activate(PresentLayer { width: 800, height: 600 }, &mut scene, Some(&mut ray_input)).unwrap();
        assert!(session.hide_modal(&mut scene, Some(&mut ray_input)));
        assert!(!session.is_showing_modal());
        let reticle = ray_input.mesh_id().expect("reticle attached");
        assert!(scene.contains(reticle));
        assert_eq!(scene.len(), 1);
        assert!(!session.hide_modal(&mut scene, Some(&mut ray_input)));
    }

    #[test]
    fn display_that_stops_on_its_own_returns_session_to_idle() {
        let (mut session, log) = ready_session();
        let mut scene = Scene::new();
        session.activate(PresentLayer { width: 800, height: 600 }, &mut scene, None).unwrap();
        log.borrow_mut().presenting = false;
        assert!(session.sync_with_display(&mut scene, None));
        assert_eq!(session.presentation(), Presentation::Idle);
        assert!(scene.is_empty());
        assert!(!session.sync_with_display(&mut scene, None));
    }

    #[test]
    fn reactivating_after_display_dropped_out_replaces_stale_modal() {
        let (mut session, log) = ready_session();
        let mut scene = Scene::new();
        let mut ray_input = RayInput::new();
        let layer = PresentLayer { width: 800, height: 600 };
        session.activate(layer, &mut scene, Some(&mut ray_input)).unwrap();
        let Presentation::Presenting { modal: ModalState::Shown(stale), .. } = session.presentation() else {
            panic!("expected presenting with modal");
        };

        log.borrow_mut().presenting = false;
        session.activate(layer, &mut scene, Some(&mut ray_input)).unwrap();
        assert!(!scene.contains(stale));
        assert_eq!(log.borrow().present_requests, 2);
        let Presentation::Presenting { first_frame, modal: ModalState::Shown(fresh) } = session.presentation() else {
            panic!("expected a fresh presentation");
        };
        assert!(first_frame);
        assert!(scene.contains(fresh));
        // Fresh modal plus the reticle left behind by the torn-down presentation.
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn session_forwards_camera_depth_range() {
        let (session, _) = ready_session();
        assert_eq!(session.display().depth_range(), (0.1, 10000.0));
    }
}
