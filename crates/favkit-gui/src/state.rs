//! Application state for the favkit GUI

use std::path::PathBuf;
use std::sync::Arc;

use favkit_core::config::FileConfig;
use favkit_core::{Editor, ExportState};
use tracing::warn;

/// Main application state (domain/persistent)
pub struct AppState {
    pub config: FileConfig,

    /// The editor every task runs against; shared with spawned tasks
    pub editor: Arc<Editor>,

    pub task_state: TaskState,
}

impl AppState {
    pub fn new() -> Self {
        let load = favkit_core::load_config();
        for warning in &load.warnings {
            warn!("{warning}");
        }
        Self::from_config(load.config)
    }

    pub fn from_config(config: FileConfig) -> Self {
        let editor = Arc::new(Editor::with_filter(config.export.resample));
        Self {
            config,
            editor,
            task_state: TaskState::Idle,
        }
    }

    pub fn save_config(&self) -> Result<(), String> {
        favkit_core::save_config(&self.config).map_err(|e| e.to_string())
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.task_state, TaskState::Running { .. })
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// State of the most recent background task
#[derive(Clone, Debug)]
pub enum TaskState {
    Idle,
    Running {
        task: String,
        progress: ProgressInfo,
    },
    Completed {
        summary: String,
        /// Destination of a finished export
        folder: Option<PathBuf>,
    },
    Error {
        message: String,
    },
}

#[derive(Clone, Debug, Default)]
pub struct ProgressInfo {
    pub export_state: Option<ExportState>,
    pub stage: Option<String>,
    pub elapsed_ms: Option<f64>,
}
