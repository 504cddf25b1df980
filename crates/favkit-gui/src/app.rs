//! Main application structure for the favkit GUI

use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{info, warn};

use crate::async_bridge::{AsyncBridge, ProgressKind, ProgressUpdate};
use crate::dialogs;
use crate::processor;
use crate::state::{AppState, ProgressInfo, TaskState};
use crate::ui_state::{LogEntry, LogLevel, Theme, UiState};
use crate::widgets;

pub struct FavkitApp {
    state: AppState,

    ui_state: UiState,

    async_bridge: AsyncBridge,

    last_save: Instant,

    config_dirty: bool,
}

impl FavkitApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, async_bridge: AsyncBridge) -> Self {
        let state = AppState::new();
        let ui_state = UiState::new(state.config.ui.theme, state.config.ui.show_technical_log);

        let mut app = Self {
            state,
            ui_state,
            async_bridge,
            last_save: Instant::now(),
            config_dirty: false,
        };

        app.add_log(LogLevel::Info, "Application started");
        if let Some(path) = favkit_core::logging::current_log_path() {
            app.add_log(LogLevel::Info, format!("Logging to {}", path.display()));
        }
        app
    }

    fn add_log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.ui_state.add_log_entry(LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            message: message.into(),
        });
    }

    fn apply_theme(&self, ctx: &egui::Context) {
        let theme = match self.ui_state.theme {
            Theme::Dark => egui::ThemePreference::Dark,
            Theme::Light => egui::ThemePreference::Light,
            Theme::System => egui::ThemePreference::System,
        };
        ctx.set_theme(theme);
    }

    /// Auto-save configuration if dirty and enough time has passed
    fn handle_auto_save(&mut self) {
        if self.config_dirty && self.last_save.elapsed() > Duration::from_millis(300) {
            if let Err(e) = self.state.save_config() {
                self.add_log(LogLevel::Error, format!("Failed to save config: {e}"));
            }
            self.config_dirty = false;
            self.last_save = Instant::now();
        }
    }

    fn mark_dirty(&mut self) {
        self.config_dirty = true;
    }

    fn handle_progress_update(&mut self, update: ProgressUpdate) {
        match update.kind {
            ProgressKind::Started { task } => {
                self.add_log(LogLevel::Info, format!("Started: {task}"));
                self.state.task_state = TaskState::Running {
                    task,
                    progress: ProgressInfo::default(),
                };
            }
            ProgressKind::Stage { stage } => {
                if let Some(message) = &update.message {
                    self.add_log(LogLevel::Info, message.clone());
                }
                if let TaskState::Running { progress, .. } = &mut self.state.task_state {
                    progress.stage = Some(stage);
                    progress.elapsed_ms = update.elapsed_ms;
                }
            }
            ProgressKind::State { state } => {
                if let TaskState::Running { progress, .. } = &mut self.state.task_state {
                    progress.export_state = Some(state);
                    progress.elapsed_ms = update.elapsed_ms;
                }
            }
            ProgressKind::Alert { message } => {
                self.add_log(LogLevel::Warning, format!("Alert: {message}"));
                self.ui_state.push_alert(message);
            }
            ProgressKind::Completed { summary, folder } => {
                self.add_log(LogLevel::Info, summary.clone());
                if let Some(dir) = &folder {
                    self.state.config.export.last_folder = Some(dir.display().to_string());
                    self.mark_dirty();
                }
                widgets::document_preview::invalidate(&mut self.ui_state);
                self.state.task_state = TaskState::Completed { summary, folder };
                self.async_bridge.clear_progress_receiver();
            }
            ProgressKind::Failed { error } => {
                self.add_log(LogLevel::Error, format!("Failed: {error}"));
                self.state.task_state = TaskState::Error { message: error };
                self.async_bridge.clear_progress_receiver();
            }
        }
    }

    fn start_open(&mut self) {
        let Some(path) = dialogs::pick_image() else {
            return;
        };
        info!(path = %path.display(), "Opening image");
        let rx = processor::start_open(&self.async_bridge, &self.state, path);
        self.async_bridge.register_progress_receiver(rx);
    }

    fn start_canvas(&mut self) {
        let rx = processor::start_canvas(&self.async_bridge, &self.state);
        self.async_bridge.register_progress_receiver(rx);
    }

    fn start_export(&mut self) {
        let rx = processor::start_export(&self.async_bridge, &self.state);
        self.async_bridge.register_progress_receiver(rx);
    }

    fn open_folder(&mut self) {
        let TaskState::Completed {
            folder: Some(folder),
            ..
        } = &self.state.task_state
        else {
            return;
        };
        let folder = folder.clone();
        if let Err(e) = open::that(&folder) {
            warn!(error = %e, "Failed to open folder");
            self.add_log(LogLevel::Error, format!("Failed to open folder: {e}"));
        }
    }

    fn render_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("favkit");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let theme_label = match self.ui_state.theme {
                        Theme::Dark => "☀ Light",
                        Theme::Light => "💻 System",
                        Theme::System => "🌙 Dark",
                    };
                    if ui.button(theme_label).clicked() {
                        self.ui_state.theme = match self.ui_state.theme {
                            Theme::Dark => Theme::Light,
                            Theme::Light => Theme::System,
                            Theme::System => Theme::Dark,
                        };
                        self.state.config.ui.theme = self.ui_state.theme.into();
                        self.mark_dirty();
                    }
                });
            });
        });
    }

    fn render_main_ui(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.group(|ui| {
                    ui.set_min_width(ui.available_width());
                    ui.heading("Document");
                    widgets::document_preview::render(ui, &self.state.editor, &self.ui_state);
                });

                ui.add_space(8.0);

                ui.group(|ui| {
                    ui.set_min_width(ui.available_width());
                    ui.heading("Options");
                    if widgets::export_options::render(ui, &mut self.state) {
                        self.mark_dirty();
                    }
                });

                ui.add_space(16.0);

                ui.separator();
                self.render_actions(ui);
                ui.separator();

                ui.add_space(8.0);

                if !matches!(self.state.task_state, TaskState::Idle) {
                    let mut open_folder = false;
                    ui.group(|ui| {
                        ui.set_min_width(ui.available_width());
                        open_folder =
                            widgets::progress_display::render(ui, &self.state.task_state);
                    });
                    if open_folder {
                        self.open_folder();
                    }
                    ui.add_space(8.0);
                }

                let log_response = egui::CollapsingHeader::new("Technical Log")
                    .default_open(self.ui_state.technical_log_expanded)
                    .show(ui, |ui| {
                        widgets::technical_log::render(ui, &mut self.ui_state);
                    });
                if log_response.header_response.clicked() {
                    self.ui_state.technical_log_expanded = !self.ui_state.technical_log_expanded;
                    self.state.config.ui.show_technical_log = self.ui_state.technical_log_expanded;
                    self.mark_dirty();
                }
            });
    }

    fn render_actions(&mut self, ui: &mut egui::Ui) {
        let idle = !self.state.is_busy();
        ui.add_enabled_ui(idle, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open Image…").clicked() {
                    self.start_open();
                }
                if ui.button("Generate Canvas").clicked() {
                    self.start_canvas();
                }
            });

            ui.add_space(8.0);

            let button_size = egui::vec2(ui.available_width(), 60.0);
            let button = egui::Button::new(egui::RichText::new("▶ Export Favicons").size(24.0))
                .fill(egui::Color32::from_rgb(0, 150, 0))
                .min_size(button_size);
            if ui.add(button).clicked() {
                self.start_export();
            }
        });
        if !idle {
            ui.label(egui::RichText::new("⏳ Working...").size(18.0));
        }
    }
}

impl eframe::App for FavkitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_theme(ctx);

        // Collect first; the handler needs &mut self
        let mut updates = Vec::new();
        self.async_bridge.poll_progress(|update| updates.push(update));
        for update in updates {
            self.handle_progress_update(update);
        }

        widgets::document_preview::refresh(ctx, &self.state.editor, &mut self.ui_state);

        if self.state.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        self.render_top_panel(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_main_ui(ui);
        });

        widgets::alert_dialog::render(ctx, &mut self.ui_state);

        self.handle_auto_save();
    }
}
