//! UI widgets for the favkit GUI

pub mod alert_dialog;
pub mod document_preview;
pub mod export_options;
pub mod progress_display;
pub mod technical_log;
