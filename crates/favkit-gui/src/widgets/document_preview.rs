//! Preview of the active document

use favkit_core::{DocumentSnapshot, Editor};

use crate::ui_state::UiState;

const PREVIEW_EDGE: f32 = 184.0;

/// Upload the active document as a texture when it changed since the last frame.
pub fn refresh(ctx: &egui::Context, editor: &Editor, ui_state: &mut UiState) {
    let Some(snapshot) = editor.active_snapshot() else {
        ui_state.preview = None;
        return;
    };
    if matches!(ui_state.preview, Some((id, _)) if id == snapshot.id) {
        return;
    }
    let texture = ctx.load_texture(
        format!("document-{}", snapshot.id),
        color_image(&snapshot),
        egui::TextureOptions::NEAREST,
    );
    ui_state.preview = Some((snapshot.id, texture));
}

/// Force the next `refresh` to re-upload.
pub fn invalidate(ui_state: &mut UiState) {
    ui_state.preview = None;
}

fn color_image(snapshot: &DocumentSnapshot) -> egui::ColorImage {
    let (width, height) = snapshot.pixels.dimensions();
    egui::ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        snapshot.pixels.as_raw(),
    )
}

pub fn render(ui: &mut egui::Ui, editor: &Editor, ui_state: &UiState) {
    let Some((_, texture)) = &ui_state.preview else {
        ui.label("No document open. Open an image or generate a canvas.");
        return;
    };
    let Some(snapshot) = editor.active_snapshot() else {
        return;
    };

    ui.horizontal(|ui| {
        let [width, height] = texture.size();
        let scale = PREVIEW_EDGE / width.max(height).max(1) as f32;
        let size = egui::vec2(width as f32 * scale, height as f32 * scale);
        ui.add(egui::Image::from_texture(egui::load::SizedTexture::new(
            texture.id(),
            size,
        )));

        ui.vertical(|ui| {
            ui.strong(&snapshot.name);
            ui.label(format!("{width} x {height} px"));
            ui.label(format!("{} ppi", snapshot.resolution));
            ui.label(format!("{:?}", snapshot.mode));
        });
    });
}
