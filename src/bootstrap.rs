// src/bootstrap.rs

use log::debug;

use crate::config::DemoConfig;
use crate::engine_lib::controller::PoseControls;
use crate::engine_lib::ray_input::RayInput;
use crate::vr::display::DisplayProvider;
use crate::vr::effect::StereoEffect;
use crate::vr::polyfill::PolyfillProvider;

/// Optional collaborators handed to the demo at startup. Anything left as
/// `None` after `install` is a feature the demo runs without.
#[derive(Default)]
pub struct Libraries {
    pub display_provider: Option<Box<dyn DisplayProvider>>,
    pub effect: Option<StereoEffect>,
    pub pose_controls: Option<PoseControls>,
    pub ray_input: Option<RayInput>,
}

impl Libraries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_display_provider(mut self, provider: Box<dyn DisplayProvider>) -> Self {
        self.display_provider = Some(provider);
        self
    }

    pub fn with_ray_input(mut self, ray_input: RayInput) -> Self {
        self.ray_input = Some(ray_input);
        self
    }
}

/// Fills in every handle that is still empty. Handles already present are left alone,
/// so running this more than once changes nothing.
pub fn install(mut libs: Libraries, config: &DemoConfig) -> Libraries {
    if libs.effect.is_none() {
        debug!("installing stereo effect");
        libs.effect = Some(StereoEffect);
    }
    if libs.pose_controls.is_none() {
        debug!("installing pose controls");
        libs.pose_controls = Some(PoseControls::default());
    }
    if libs.ray_input.is_none() {
        debug!("installing ray input");
        libs.ray_input = Some(RayInput::new());
    }
    if libs.display_provider.is_none() && config.install_polyfill {
        if let Some(controls) = libs.pose_controls.as_ref() {
            debug!("installing cardboard display polyfill");
            libs.display_provider = Some(Box::new(PolyfillProvider::new(
                config.camera,
                config.ipd,
                controls.pose_handle(),
            )));
        }
    }
    libs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedDisplay, ScriptedProvider};
    use crate::vr::display::{FrameData, VrDisplay};

    #[test]
    fn fills_every_missing_handle() {
        let libs = install(Libraries::new(), &DemoConfig::default());
        assert!(libs.display_provider.is_some());
        assert!(libs.effect.is_some());
        assert!(libs.pose_controls.is_some());
        assert!(libs.ray_input.is_some());
    }

    #[test]
    fn keeps_handles_already_present() {
        let (display, _) = ScriptedDisplay::new("Injected", true);
        let libs = Libraries::new()
            .with_display_provider(Box::new(ScriptedProvider::with_displays(vec![Box::new(display)])));
        let config = DemoConfig::default();
        let mut libs = install(install(libs, &config), &config);

        let displays = libs.display_provider.as_mut().unwrap().get_displays().unwrap();
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].display_name(), "Injected");
    }

    #[test]
    fn polyfill_can_be_switched_off() {
        let config = DemoConfig { install_polyfill: false, ..DemoConfig::default() };
        let libs = install(Libraries::new(), &config);
        assert!(libs.display_provider.is_none());
        assert!(libs.ray_input.is_some());
    }

    #[test]
    fn polyfill_reads_installed_pose() {
        let mut libs = install(Libraries::new(), &DemoConfig::default());
        let pose = libs.pose_controls.as_ref().unwrap().pose_handle();
        pose.set(glam::Quat::from_rotation_y(0.5));
        let mut displays = libs.display_provider.as_mut().unwrap().get_displays().unwrap();
        let mut frame = FrameData::default();
        displays[0].get_frame_data(&mut frame);
        assert_eq!(frame.orientation, pose.get());
    }

    #[test]
    fn injected_ray_input_survives_install() {
        let mut picker = RayInput::new();
        picker.add(7);
        picker.set_size(320, 240);
        let libs = install(Libraries::new().with_ray_input(picker), &DemoConfig::default());
        assert_eq!(libs.ray_input.as_ref().unwrap().size(), (320, 240));
    }
}
