// src/ui.rs
use egui;

use vr_room_demo::demo_scene::MODAL_TEXT;

pub struct UiStatus {
    pub vr_status: &'static str,
    pub toggle_label: Option<&'static str>,
    pub showing_modal: bool,
    pub hovered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    None,
    ToggleVr,
}

pub fn build_ui(ctx: &egui::Context, status: &UiStatus) -> UiAction {
    let mut action = UiAction::None;
    egui::Window::new("VR Room")
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
        .resizable(false)
        .show(ctx, |ui| {
            ui.vertical(|ui| {
                ui.label(status.vr_status);
                if status.showing_modal {
                    ui.label(MODAL_TEXT);
                }
                if status.hovered {
                    ui.label("Pointing at the box");
                }
                ui.separator();

                // The enter/exit control only exists once a display has been found.
                if let Some(label) = status.toggle_label {
                    if ui.button(label).clicked() {
                        action = UiAction::ToggleVr;
                    }
                }

                ui.separator();
                ui.label("V: Enter/Exit VR");
                ui.label("Left mouse / Space: Controller button");
                ui.label("Right drag / Arrow Keys: Turn head");
                ui.label("R: Reset head orientation");
            });
        });
    action
}
