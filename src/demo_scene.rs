// src/demo_scene.rs

use glam::Vec3;

use crate::engine_lib::geometry::{box_geometry, plane_geometry};
use crate::engine_lib::scene_types::{Entity, EntityId, Material, Scene, Side};

pub const BOX_SIZE: f32 = 1.0;
pub const SCENE_DEPTH: f32 = -5.0;
pub const MODAL_DEPTH: f32 = -4.0;
pub const MODAL_SCALE: f32 = 2.0;
pub const MODAL_TEXTURE: &str = "images/press-button.png";
pub const MODAL_TEXT: &str = "Press a button to continue";

pub struct DemoMeshes {
    pub box_id: EntityId,
    pub room_id: EntityId,
}

fn create_box() -> Entity {
    Entity::new("Box", box_geometry(BOX_SIZE, BOX_SIZE, BOX_SIZE, 1, 1, 1), Material::normal())
        .with_position(Vec3::new(0.0, 0.0, SCENE_DEPTH))
}

fn create_room() -> Entity {
    let mut material = Material::basic([1.0, 1.0, 1.0]);
    material.wireframe = true;
    material.opacity = 0.3;
    material.transparent = true;
    material.side = Side::Back;
    Entity::new("Room", box_geometry(10.0, 2.0, 10.0, 10, 2, 10), material)
        .with_position(Vec3::new(0.0, 0.0, SCENE_DEPTH))
}

pub fn create_meshes(scene: &mut Scene) -> DemoMeshes {
    let box_id = scene.add(create_box());
    let room_id = scene.add(create_room());
    DemoMeshes { box_id, room_id }
}

/// The "press a button" instruction card shown in front of the viewer after entering VR.
pub fn create_press_button_modal() -> Entity {
    Entity::new(
        "Press Button Modal",
        plane_geometry(1.0, 1.0),
        Material::sprite([1.0, 1.0, 1.0], Some(MODAL_TEXTURE.to_string())),
    )
    .with_position(Vec3::new(0.0, 0.0, MODAL_DEPTH))
    .with_scale(Vec3::new(MODAL_SCALE, MODAL_SCALE, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_lib::scene_types::Shading;

    #[test]
    fn scene_contains_box_and_room() {
        let mut scene = Scene::new();
        let meshes = create_meshes(&mut scene);
        assert_eq!(scene.len(), 2);

        let cube = scene.get(meshes.box_id).unwrap();
        assert_eq!(cube.transform.position.z, -5.0);
        assert_eq!(cube.material.shading, Shading::Normal);

        let room = scene.get(meshes.room_id).unwrap();
        assert!(room.material.wireframe);
        assert!(room.material.transparent);
        assert_eq!(room.material.opacity, 0.3);
        assert_eq!(room.material.side, Side::Back);
    }

    #[test]
    fn modal_faces_viewer() {
        let modal = create_press_button_modal();
        assert_eq!(modal.transform.position, Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(modal.transform.scale.x, 2.0);
        assert_eq!(modal.transform.scale.y, 2.0);
        assert!(matches!(modal.material.shading, Shading::Sprite { texture: Some(_), .. }));
    }
}
