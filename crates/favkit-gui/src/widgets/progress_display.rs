//! Progress display widget

use crate::state::TaskState;

/// Returns true when "Open Folder" was clicked.
pub fn render(ui: &mut egui::Ui, state: &TaskState) -> bool {
    let mut open_folder = false;
    match state {
        TaskState::Running { task, progress } => {
            ui.vertical(|ui| {
                ui.heading(format!("{task}..."));

                if let Some(export_state) = progress.export_state {
                    ui.label(format!("State: {export_state}"));
                }
                if let Some(ref stage) = progress.stage {
                    ui.label(format!("Stage: {stage}"));
                }
                if let Some(elapsed_ms) = progress.elapsed_ms {
                    ui.label(format!("Elapsed: {:.1}s", elapsed_ms / 1000.0));
                }

                ui.add(egui::ProgressBar::new(f32::NAN));
            });
        }
        TaskState::Completed { summary, folder } => {
            ui.vertical(|ui| {
                ui.colored_label(egui::Color32::GREEN, "✓ Done");
                ui.label(summary);
                if let Some(folder) = folder {
                    ui.horizontal(|ui| {
                        ui.monospace(folder.display().to_string());
                        open_folder = ui.button("Open Folder").clicked();
                    });
                }
            });
        }
        TaskState::Error { message } => {
            ui.vertical(|ui| {
                ui.colored_label(egui::Color32::RED, "✗ Failed");
                ui.label(message);
            });
        }
        TaskState::Idle => {}
    }
    open_folder
}
