//! Canvas and export preferences form

use favkit_core::{Fill, ResampleFilter};

use crate::state::AppState;

const FILTERS: [ResampleFilter; 4] = [
    ResampleFilter::Nearest,
    ResampleFilter::Bilinear,
    ResampleFilter::Bicubic,
    ResampleFilter::Lanczos,
];

const FILLS: [(Fill, &str); 3] = [
    (Fill::White, "White"),
    (Fill::Black, "Black"),
    (Fill::Transparent, "Transparent"),
];

/// Returns true if any preference changed.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) -> bool {
    let mut changed = false;

    egui::Grid::new("preferences_grid")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Canvas size");
            ui.horizontal(|ui| {
                changed |= ui
                    .add(egui::DragValue::new(&mut state.config.canvas.width).range(1..=4096))
                    .changed();
                ui.label("x");
                changed |= ui
                    .add(egui::DragValue::new(&mut state.config.canvas.height).range(1..=4096))
                    .changed();
            });
            ui.end_row();

            ui.label("Canvas fill");
            egui::ComboBox::from_id_salt("canvas_fill")
                .selected_text(
                    FILLS
                        .iter()
                        .find(|(fill, _)| *fill == state.config.canvas.fill)
                        .map_or("White", |(_, label)| *label),
                )
                .show_ui(ui, |ui| {
                    for (fill, label) in FILLS {
                        changed |= ui
                            .selectable_value(&mut state.config.canvas.fill, fill, label)
                            .changed();
                    }
                });
            ui.end_row();

            ui.label("1x size");
            changed |= ui
                .add(
                    egui::DragValue::new(&mut state.config.export.small_size)
                        .range(1..=512)
                        .suffix(" px"),
                )
                .changed();
            ui.end_row();

            ui.label("Resample filter")
                .on_hover_text("Filter used when shrinking to the 1x size");
            egui::ComboBox::from_id_salt("resample_filter")
                .selected_text(state.config.export.resample.as_str())
                .show_ui(ui, |ui| {
                    for filter in FILTERS {
                        changed |= ui
                            .selectable_value(
                                &mut state.config.export.resample,
                                filter,
                                filter.as_str(),
                            )
                            .changed();
                    }
                });
            ui.end_row();
        });

    changed
}
