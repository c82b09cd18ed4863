// src/engine_lib/ray_input.rs

use glam::{Vec2, Vec3};

use super::camera::Camera;
use super::geometry::plane_geometry;
use super::scene_types::{Entity, EntityId, Material, Scene};

const RETICLE_DISTANCE: f32 = 3.0;
const RETICLE_SIZE: f32 = 0.04;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayEventKind {
    /// Ray started pointing at a tracked mesh.
    Over,
    /// Ray stopped pointing at a tracked mesh.
    Out,
    /// Button pressed, with whatever the ray points at (possibly nothing).
    Down,
    /// Button released.
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayEvent {
    pub kind: RayEventKind,
    pub mesh: Option<EntityId>,
}

/// Where the ray comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayMode {
    /// Through the mouse pointer.
    Mouse,
    /// Straight ahead from the viewer, used while a headset presents.
    Gaze,
}

/// Button state with press/release edges latched until the next picker update.
#[derive(Debug, Default, Clone)]
pub struct RayController {
    is_down: bool,
    pressed_edge: bool,
    released_edge: bool,
}

impl RayController {
    pub fn set_button(&mut self, down: bool) {
        if down && !self.is_down {
            self.pressed_edge = true;
        }
        if !down && self.is_down {
            self.released_edge = true;
        }
        self.is_down = down;
    }

    /// True between a press and the next `RayInput::update`.
    pub fn was_pressed(&self) -> bool {
        self.pressed_edge
    }

    pub fn is_down(&self) -> bool {
        self.is_down
    }

    fn take_edges(&mut self) -> (bool, bool) {
        let edges = (self.pressed_edge, self.released_edge);
        self.pressed_edge = false;
        self.released_edge = false;
        edges
    }
}

/// Ray picker over a set of tracked meshes.
pub struct RayInput {
    tracked: Vec<EntityId>,
    mode: RayMode,
    size: (u32, u32),
    pointer_ndc: Vec2,
    hovered: Option<EntityId>,
    controller: RayController,
    reticle: Entity,
    reticle_id: Option<EntityId>,
}

impl Default for RayInput {
    fn default() -> Self {
        Self::new()
    }
}

impl RayInput {
    pub fn new() -> Self {
        let mut material = Material::basic([1.0, 1.0, 1.0]);
        material.transparent = true;
        material.opacity = 0.8;
        Self {
            tracked: Vec::new(),
            mode: RayMode::Mouse,
            size: (1, 1),
            pointer_ndc: Vec2::ZERO,
            hovered: None,
            controller: RayController::default(),
            reticle: Entity::new("Ray Reticle", plane_geometry(RETICLE_SIZE, RETICLE_SIZE), material)
                .with_position(Vec3::new(0.0, 0.0, -RETICLE_DISTANCE)),
            reticle_id: None,
        }
    }

    pub fn add(&mut self, id: EntityId) {
        if !self.tracked.contains(&id) {
            self.tracked.push(id);
        }
    }

    pub fn remove(&mut self, id: EntityId) {
        self.tracked.retain(|t| *t != id);
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn set_mode(&mut self, mode: RayMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> RayMode {
        self.mode
    }

    /// Pointer position in window pixels, origin top-left.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        self.pointer_ndc = Vec2::new(x / w * 2.0 - 1.0, 1.0 - y / h * 2.0);
    }

    pub fn pointer_ndc(&self) -> Vec2 {
        self.pointer_ndc
    }

    pub fn controller(&self) -> &RayController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut RayController {
        &mut self.controller
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    /// The picker's own visual (a small reticle).
    pub fn mesh(&self) -> &Entity {
        &self.reticle
    }

    pub fn mesh_id(&self) -> Option<EntityId> {
        self.reticle_id
    }

    /// Puts the reticle into `scene` unless it is already there.
    pub fn attach_mesh(&mut self, scene: &mut Scene) -> EntityId {
        if let Some(id) = self.reticle_id.filter(|id| scene.contains(*id)) {
            return id;
        }
        let id = scene.add(self.reticle.clone());
        self.reticle_id = Some(id);
        id
    }

    /// Casts the ray, works out hover changes and button edges, and moves the reticle.
    pub fn update(&mut self, scene: &mut Scene, camera: &Camera) -> Vec<RayEvent> {
        let ndc = match self.mode {
            RayMode::Mouse => self.pointer_ndc,
            RayMode::Gaze => Vec2::ZERO,
        };
        let (origin, dir) = camera.ray_from_ndc(ndc);
        let root = scene.matrix;

        let mut nearest: Option<(EntityId, f32)> = None;
        for id in &self.tracked {
            let Some(entity) = scene.get(*id) else { continue };
            let world = root * entity.transform.matrix();
            let bounds = entity.geometry.bounds.transformed(&world);
            if let Some(t) = bounds.intersect_ray(origin, dir) {
                if nearest.map_or(true, |(_, best)| t < best) {
                    nearest = Some((*id, t));
                }
            }
        }
        let hit = nearest.map(|(id, _)| id);

        let mut events = Vec::new();
        if hit != self.hovered {
            if let Some(previous) = self.hovered {
                events.push(RayEvent { kind: RayEventKind::Out, mesh: Some(previous) });
            }
            if let Some(current) = hit {
                events.push(RayEvent { kind: RayEventKind::Over, mesh: Some(current) });
            }
            self.hovered = hit;
        }

        let (pressed, released) = self.controller.take_edges();
        if pressed {
            events.push(RayEvent { kind: RayEventKind::Down, mesh: hit });
        }
        if released {
            events.push(RayEvent { kind: RayEventKind::Up, mesh: hit });
        }

        if let Some(reticle) = self.reticle_id.and_then(|id| scene.get_mut(id)) {
            let distance = nearest.map_or(RETICLE_DISTANCE, |(_, t)| t * 0.98);
            reticle.transform.position = root.inverse().transform_point3(origin + dir * distance);
        }

        events
    }
}
