// src/engine_lib/mod.rs

pub mod camera;
pub mod controller;
pub mod geometry;
pub mod interaction;
pub mod ray_input;
pub mod scene_types; // Entities, materials, and the scene root
pub mod stereo;

pub use camera::Camera;
pub use controller::{PoseControls, SharedPose};
pub use ray_input::{RayController, RayEvent, RayEventKind, RayInput, RayMode};
pub use scene_types::{Entity, EntityId, Material, Scene, Shading, Side};
pub use stereo::{Eye, FrameScheduler, StereoBegin, StereoStrategy};
