//! Technical log widget

use crate::ui_state::{LogEntry, LogLevel, UiState};

fn level_style(level: LogLevel) -> (egui::Color32, &'static str) {
    match level {
        LogLevel::Info => (egui::Color32::GRAY, "INFO"),
        LogLevel::Warning => (egui::Color32::YELLOW, "WARN"),
        LogLevel::Error => (egui::Color32::RED, "ERROR"),
    }
}

fn as_text(entries: &[&LogEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let (_, prefix) = level_style(entry.level);
            format!("{} {prefix} {}", entry.timestamp, entry.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render(ui: &mut egui::Ui, ui_state: &mut UiState) {
    let errors_only = ui_state.log_errors_only;
    let visible: Vec<&LogEntry> = ui_state
        .technical_log
        .iter()
        .filter(|entry| !errors_only || entry.level != LogLevel::Info)
        .collect();

    let mut copy = None;
    let mut clear = false;
    let mut errors_toggle = errors_only;
    ui.horizontal(|ui| {
        ui.label(format!("{} / 200", ui_state.technical_log.len()));
        ui.checkbox(&mut errors_toggle, "Warnings and errors only");
        if ui.button("Copy").clicked() {
            copy = Some(as_text(&visible));
        }
        clear = ui.button("Clear").clicked();
    });
    ui.separator();

    egui::ScrollArea::vertical()
        .max_height(300.0)
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for entry in &visible {
                let (color, prefix) = level_style(entry.level);
                ui.horizontal(|ui| {
                    ui.monospace(&entry.timestamp);
                    ui.colored_label(color, prefix);
                    ui.label(&entry.message);
                });
            }
        });

    if let Some(text) = copy {
        ui.ctx().copy_text(text);
    }
    ui_state.log_errors_only = errors_toggle;
    if clear {
        ui_state.technical_log.clear();
    }
}
