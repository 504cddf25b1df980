//! Core library crate: the editing engine, the canvas and favicon export
//! workflows, configuration and logging shared by the CLI and GUI.

pub mod canvas;
pub mod config;
pub mod document;
pub mod editor;
pub mod export;
pub mod host;
pub mod logging;
pub mod notify;
pub mod progress;
pub mod storage;

pub use canvas::{CANVAS_COMMAND_NAME, create_canvas};
pub use config::{
    CanvasPreferences, ConfigError, ConfigLoadResult, ConfigSource, ExportPreferences, FileConfig,
    ThemePreference, UiPreferences, config_directory, config_path, load_config, save_config,
};
pub use document::{
    ColorMode, DocumentSnapshot, DocumentSpec, Fill, MAX_DIMENSION, ResampleFilter,
    check_dimensions,
};
pub use editor::Editor;
pub use export::{
    EXPORT_COMMAND_NAME, ExportError, ExportOptions, ExportReport, ExportedFile, Exporter,
    OUTPUT_FILES, PreconditionError,
};
pub use host::{
    BatchCommand, BatchOptions, CommandKind, DocumentId, DocumentRef, Host, HostError, ModalScope,
};
pub use notify::{Notifier, RecordingNotifier};
pub use progress::{BranchStep, ExportState, ProgressCallback, ProgressEvent, ProgressEventKind};
pub use storage::{FileEntry, FixedFolderPicker, FolderPicker, LocalFolder, StorageError};
