// src/engine_lib/interaction.rs

use super::ray_input::{RayEvent, RayEventKind};
use super::scene_types::{EntityId, Scene};

pub const SELECTED_OPACITY: f32 = 1.0;
pub const DESELECTED_OPACITY: f32 = 0.5;

fn set_opacity(scene: &mut Scene, mesh: Option<EntityId>, opacity: f32) {
    let Some(entity) = mesh.and_then(|id| scene.get_mut(id)) else {
        return;
    };
    entity.material.transparent = true;
    entity.material.opacity = opacity;
}

pub fn on_selected(scene: &mut Scene, mesh: Option<EntityId>) {
    set_opacity(scene, mesh, SELECTED_OPACITY);
}

pub fn on_deselected(scene: &mut Scene, mesh: Option<EntityId>) {
    set_opacity(scene, mesh, DESELECTED_OPACITY);
}

/// Over/Down select, Out/Up deselect.
pub fn apply_ray_event(scene: &mut Scene, event: RayEvent) {
    match event.kind {
        RayEventKind::Over | RayEventKind::Down => on_selected(scene, event.mesh),
        RayEventKind::Out | RayEventKind::Up => on_deselected(scene, event.mesh),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_scene::create_meshes;

    #[test]
    fn hover_enter_then_exit_leaves_half_opacity() {
        let mut scene = Scene::new();
        let meshes = create_meshes(&mut scene);
        apply_ray_event(&mut scene, RayEvent { kind: RayEventKind::Over, mesh: Some(meshes.box_id) });
        apply_ray_event(&mut scene, RayEvent { kind: RayEventKind::Out, mesh: Some(meshes.box_id) });
        let material = &scene.get(meshes.box_id).unwrap().material;
        assert!(material.transparent);
        assert_eq!(material.opacity, 0.5);
    }

    #[test]
    fn hover_enter_alone_leaves_full_opacity() {
        let mut scene = Scene::new();
        let meshes = create_meshes(&mut scene);
        apply_ray_event(&mut scene, RayEvent { kind: RayEventKind::Over, mesh: Some(meshes.box_id) });
        assert_eq!(scene.get(meshes.box_id).unwrap().material.opacity, 1.0);
    }

    #[test]
    fn missing_target_is_ignored() {
        let mut scene = Scene::new();
        let meshes = create_meshes(&mut scene);
        on_selected(&mut scene, None);
        on_deselected(&mut scene, Some(999));
        let material = &scene.get(meshes.box_id).unwrap().material;
        assert!(!material.transparent);
        assert_eq!(material.opacity, 1.0);
    }
}
