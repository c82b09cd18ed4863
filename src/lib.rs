// src/lib.rs

pub mod assets;
pub mod bootstrap;
pub mod config;
pub mod demo;
pub mod demo_scene;
pub mod engine_lib;
pub mod error;
pub mod rendering_lib;
pub mod vr;

#[cfg(test)]
mod test_support;

pub use bootstrap::{install, Libraries};
pub use config::DemoConfig;
pub use demo::{Demo, FrameOutcome};
pub use error::{AssetError, VrError, VrResult};
