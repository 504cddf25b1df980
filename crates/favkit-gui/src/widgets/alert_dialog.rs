//! Modal alert window

use crate::ui_state::UiState;

/// Show the oldest pending alert until it is acknowledged.
pub fn render(ctx: &egui::Context, ui_state: &mut UiState) {
    let Some(message) = ui_state.alerts.front().cloned() else {
        return;
    };

    let mut acknowledged = false;
    egui::Window::new("favkit")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.set_min_width(320.0);
            ui.label(&message);
            ui.add_space(8.0);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                acknowledged = ui.button("OK").clicked();
            });
        });

    if acknowledged || ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
        ui_state.dismiss_alert();
    }
}
