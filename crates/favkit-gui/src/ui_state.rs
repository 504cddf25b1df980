//! UI-specific state (ephemeral)

use std::collections::VecDeque;

use favkit_core::{DocumentId, ThemePreference};

const MAX_LOG_ENTRIES: usize = 200;

/// UI-specific state that doesn't need to be persisted
pub struct UiState {
    pub theme: Theme,

    pub technical_log_expanded: bool,

    /// Technical log entries (max 200)
    pub technical_log: VecDeque<LogEntry>,

    /// Hide info entries in the technical log
    pub log_errors_only: bool,

    /// Alerts waiting to be acknowledged, oldest first
    pub alerts: VecDeque<String>,

    /// Texture of the active document and the document it was built from
    pub preview: Option<(DocumentId, egui::TextureHandle)>,
}

impl UiState {
    pub fn new(theme: ThemePreference, technical_log_expanded: bool) -> Self {
        Self {
            theme: Theme::from(theme),
            technical_log_expanded,
            technical_log: VecDeque::with_capacity(MAX_LOG_ENTRIES),
            log_errors_only: false,
            alerts: VecDeque::new(),
            preview: None,
        }
    }

    /// Add a log entry, maintaining max 200 entries
    pub fn add_log_entry(&mut self, entry: LogEntry) {
        if self.technical_log.len() >= MAX_LOG_ENTRIES {
            self.technical_log.pop_front();
        }
        self.technical_log.push_back(entry);
    }

    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(ThemePreference::default(), false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
    /// Follow the operating system
    System,
}

impl From<ThemePreference> for Theme {
    fn from(value: ThemePreference) -> Self {
        match value {
            ThemePreference::Dark => Theme::Dark,
            ThemePreference::Light => Theme::Light,
            ThemePreference::System => Theme::System,
        }
    }
}

impl From<Theme> for ThemePreference {
    fn from(value: Theme) -> Self {
        match value {
            Theme::Dark => ThemePreference::Dark,
            Theme::Light => ThemePreference::Light,
            Theme::System => ThemePreference::System,
        }
    }
}

/// Technical log entry
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

/// Log level for coloring
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}
