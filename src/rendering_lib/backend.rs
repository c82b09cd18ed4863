// src/rendering_lib/backend.rs

use crate::engine_lib::camera::Camera;
use crate::engine_lib::scene_types::Scene;

/// Pixel rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0.0, y: 0.0, width: width as f32, height: height as f32 }
    }
}

/// What the demo needs from a renderer.
///
/// Clearing follows immediate-mode semantics: with auto-clear on, every
/// `render` starts by clearing colour and depth; with it off, only explicit
/// `clear`/`clear_depth` calls clear, and they apply to the next draw.
pub trait RenderBackend {
    fn set_size(&mut self, width: u32, height: u32);
    fn size(&self) -> (u32, u32);
    fn set_viewport(&mut self, viewport: Viewport);
    fn set_auto_clear(&mut self, auto_clear: bool);
    fn auto_clear(&self) -> bool;
    /// Clears colour and depth.
    fn clear(&mut self);
    fn clear_depth(&mut self);
    /// Draws every entity using the world matrices currently stored in the scene.
    fn render(&mut self, scene: &Scene, camera: &Camera);
}
