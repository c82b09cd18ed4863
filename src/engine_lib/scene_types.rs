// src/engine_lib/scene_types.rs
use std::collections::BTreeMap;
use glam::{EulerRot, Mat4, Quat, Vec3};

use super::geometry::Geometry;

pub type EntityId = u32;

/// Which faces of a mesh get rasterized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Double,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shading {
    /// Colour derived from the surface normal.
    Normal,
    /// Flat colour.
    Basic { color: [f32; 3] },
    /// Flat quad with an optional image; drawn with its tint when no texture is bound.
    Sprite { color: [f32; 3], texture: Option<String> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub shading: Shading,
    pub opacity: f32,
    pub transparent: bool,
    pub wireframe: bool,
    pub side: Side,
}

impl Material {
    pub fn normal() -> Self {
        Self { shading: Shading::Normal, opacity: 1.0, transparent: false, wireframe: false, side: Side::Front }
    }

    pub fn basic(color: [f32; 3]) -> Self {
        Self { shading: Shading::Basic { color }, ..Self::normal() }
    }

    pub fn sprite(color: [f32; 3], texture: Option<String>) -> Self {
        Self { shading: Shading::Sprite { color, texture }, side: Side::Double, ..Self::normal() }
    }

    /// Opacity as the renderer sees it; opaque materials ignore `opacity`.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent { self.opacity.clamp(0.0, 1.0) } else { 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation;
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            self.position,
        )
    }
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub name: String,
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
    pub world_matrix: Mat4,
}

impl Entity {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            transform: Transform::default(),
            world_matrix: Mat4::IDENTITY,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }
}

/// Flat scene graph: a root matrix and its direct children.
///
/// With `matrix_auto_update` set the root matrix is reset to identity on every
/// world update. The stereo path clears the flag and writes the eye's view
/// matrix into `matrix` itself.
#[derive(Debug)]
pub struct Scene {
    entities: BTreeMap<EntityId, Entity>,
    next_id: EntityId,
    pub matrix: Mat4,
    pub matrix_auto_update: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 0,
            matrix: Mat4::IDENTITY,
            matrix_auto_update: true,
        }
    }

    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.insert(id, entity);
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }

    pub fn update_matrix_world(&mut self) {
        if self.matrix_auto_update {
            self.matrix = Mat4::IDENTITY;
        }
        let root = self.matrix;
        for entity in self.entities.values_mut() {
            let world = root * entity.transform.matrix();
            entity.world_matrix = if matches!(entity.material.shading, Shading::Sprite { .. }) {
                billboard(world.w_axis.truncate(), entity.transform.scale)
            } else {
                world
            };
        }
    }
}

/// Sprites keep their position but drop every rotation, so the quad stays square-on
/// to a camera at the origin whatever the root matrix holds.
fn billboard(position: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, position)
}
