//! favkit GUI built on eframe/egui

pub mod app;
pub mod async_bridge;
pub mod dialogs;
pub mod processor;
pub mod state;
pub mod ui_state;
pub mod widgets;

use anyhow::{Context, anyhow};
use favkit_core::logging::{LoggingDestination, init_logging};

/// Main entry point for the GUI
pub fn run() -> anyhow::Result<()> {
    if let Err(err) = init_logging(LoggingDestination::FileOnly) {
        eprintln!("Warning: logging disabled: {err}");
    }

    let bridge = async_bridge::AsyncBridge::new().context("failed to start async runtime")?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 720.0])
            .with_min_inner_size([420.0, 520.0])
            .with_resizable(true)
            .with_title("favkit"),
        ..Default::default()
    };

    eframe::run_native(
        "favkit",
        native_options,
        Box::new(|cc| Ok(Box::new(app::FavkitApp::new(cc, bridge)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
