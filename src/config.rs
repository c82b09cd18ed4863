// src/config.rs

pub const ENV_DISABLE_VR: &str = "VR_ROOM_DISABLE_VR";
pub const ENV_NO_POLYFILL: &str = "VR_ROOM_NO_POLYFILL";
pub const ENV_IPD: &str = "VR_ROOM_IPD";

/// Perspective settings shared by the desktop camera and the headset depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub view_angle_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            view_angle_deg: 45.0,
            near: 0.1,
            far: 10000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub window_size: (u32, u32),
    pub camera: CameraSettings,
    /// Multiplier applied to elapsed milliseconds before taking sin/cos.
    pub rotation_time_scale: f64,
    pub rotation_amplitude: f32,
    pub vr_enabled: bool,
    pub install_polyfill: bool,
    /// Interpupillary distance used by the polyfill display, in metres.
    pub ipd: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "VR Room Demo".to_string(),
            window_size: (1024, 768),
            camera: CameraSettings::default(),
            rotation_time_scale: 0.0001,
            rotation_amplitude: 4.0,
            vr_enabled: true,
            install_polyfill: true,
            ipd: 0.064,
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup(ENV_DISABLE_VR).is_some_and(|v| is_truthy(&v)) {
            self.vr_enabled = false;
        }
        if lookup(ENV_NO_POLYFILL).is_some_and(|v| is_truthy(&v)) {
            self.install_polyfill = false;
        }
        if let Some(raw) = lookup(ENV_IPD) {
            match raw.trim().parse::<f32>() {
                Ok(ipd) if ipd.is_finite() && ipd >= 0.0 => self.ipd = ipd,
                _ => log::warn!("Ignoring invalid {ENV_IPD} value {raw:?}"),
            }
        }
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_camera_settings() {
        let config = DemoConfig::default();
        assert_eq!(config.camera.view_angle_deg, 45.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.camera.far, 10000.0);
        assert_eq!(config.rotation_amplitude, 4.0);
        assert!(config.vr_enabled);
        assert!(config.install_polyfill);
    }

    #[test]
    fn env_overrides_disable_vr_and_polyfill() {
        let config = DemoConfig::default().with_overrides(lookup_from(&[
            (ENV_DISABLE_VR, "1"),
            (ENV_NO_POLYFILL, "true"),
            (ENV_IPD, "0.07"),
        ]));
        assert!(!config.vr_enabled);
        assert!(!config.install_polyfill);
        assert!((config.ipd - 0.07).abs() < 1e-6);
    }

    #[test]
    fn invalid_ipd_is_ignored() {
        let config = DemoConfig::default().with_overrides(lookup_from(&[(ENV_IPD, "wide")]));
        assert!((config.ipd - 0.064).abs() < 1e-6);

        let config = DemoConfig::default().with_overrides(lookup_from(&[(ENV_DISABLE_VR, "0")]));
        assert!(config.vr_enabled);
    }
}
