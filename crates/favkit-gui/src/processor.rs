//! Spawns favkit-core workflows on the bridge runtime and forwards their
//! progress and alerts to the UI thread.

use std::path::PathBuf;
use std::sync::Arc;

use favkit_core::{
    CANVAS_COMMAND_NAME, EXPORT_COMMAND_NAME, Exporter, Notifier, ProgressCallback,
    ProgressEvent, ProgressEventKind, create_canvas,
};
use tokio::sync::mpsc;
use tracing::error;

use crate::async_bridge::{AsyncBridge, ProgressKind, ProgressUpdate};
use crate::dialogs::DialogFolderPicker;
use crate::state::AppState;

type Sender = mpsc::UnboundedSender<ProgressUpdate>;
type Receiver = mpsc::UnboundedReceiver<ProgressUpdate>;

const OPEN_TASK_NAME: &str = "Open Image";

/// Routes workflow alerts to the alert window.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: Sender,
}

impl ChannelNotifier {
    pub fn new(tx: Sender) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn show_alert(&self, message: &str) {
        let _ = self.tx.send(
            ProgressUpdate::new(ProgressKind::Alert {
                message: message.to_string(),
            })
            .with_message(message),
        );
    }
}

fn started_channel(task: &str) -> (Sender, Receiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let _ = tx.send(
        ProgressUpdate::new(ProgressKind::Started {
            task: task.to_string(),
        })
        .with_message(format!("{task} started")),
    );
    (tx, rx)
}

fn finished(tx: &Sender, summary: String, folder: Option<PathBuf>) {
    let _ = tx.send(
        ProgressUpdate::new(ProgressKind::Completed {
            summary: summary.clone(),
            folder,
        })
        .with_message(summary),
    );
}

fn failed(tx: &Sender, error: String) {
    let _ = tx.send(
        ProgressUpdate::new(ProgressKind::Failed {
            error: error.clone(),
        })
        .with_message(error),
    );
}

/// Export progress event as a UI update.
pub fn translate(event: ProgressEvent) -> ProgressUpdate {
    let kind = match (event.kind, event.state) {
        (ProgressEventKind::State, Some(state)) => ProgressKind::State { state },
        _ => ProgressKind::Stage {
            stage: event.stage.clone().unwrap_or_default(),
        },
    };
    ProgressUpdate {
        kind,
        message: event.message,
        elapsed_ms: Some(event.elapsed_ms),
    }
}

/// Run the favicon export against the active document.
pub fn start_export(bridge: &AsyncBridge, state: &AppState) -> Receiver {
    let (tx, rx) = started_channel(EXPORT_COMMAND_NAME);
    let editor = Arc::clone(&state.editor);
    editor.set_filter(state.config.export.resample);
    let options = state.config.export.options();
    let picker = DialogFolderPicker::new(state.config.export.last_folder_path());

    bridge.handle().spawn(async move {
        let notifier = ChannelNotifier::new(tx.clone());
        let progress_tx = tx.clone();
        let callback: ProgressCallback = Arc::new(move |event: ProgressEvent| {
            let _ = progress_tx.send(translate(event));
        });

        let result = Exporter::new(editor.as_ref(), &picker, &notifier)
            .with_options(options)
            .with_progress(callback)
            .run()
            .await;
        match result {
            Ok(report) => finished(
                &tx,
                format!("Exported {} favicon files", report.files.len()),
                Some(report.folder),
            ),
            Err(err) => failed(&tx, err.to_string()),
        }
    });
    rx
}

/// Create the blank favicon canvas from the configured preferences.
pub fn start_canvas(bridge: &AsyncBridge, state: &AppState) -> Receiver {
    let (tx, rx) = started_channel(CANVAS_COMMAND_NAME);
    let editor = Arc::clone(&state.editor);
    let spec = state.config.canvas.to_spec();

    bridge.handle().spawn(async move {
        let notifier = ChannelNotifier::new(tx.clone());
        match create_canvas(editor.as_ref(), &notifier, &spec).await {
            Ok(id) => finished(
                &tx,
                format!("Created {}x{} canvas {id}", spec.width, spec.height),
                None,
            ),
            Err(err) => failed(&tx, err.to_string()),
        }
    });
    rx
}

/// Decode `path` and make it the active document.
pub fn start_open(bridge: &AsyncBridge, state: &AppState, path: PathBuf) -> Receiver {
    let (tx, rx) = started_channel(OPEN_TASK_NAME);
    let editor = Arc::clone(&state.editor);

    bridge.handle().spawn(async move {
        match editor.open_file(&path).await {
            Ok(id) => finished(&tx, format!("Opened {} as {id}", path.display()), None),
            Err(err) => {
                error!(error = %err, path = %path.display(), "Failed to open image");
                ChannelNotifier::new(tx.clone()).show_alert(&format!("Failed to open image: {err}"));
                failed(&tx, err.to_string());
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use favkit_core::{ExportState, FileConfig};

    fn drain(mut rx: Receiver) -> Vec<ProgressKind> {
        let mut kinds = Vec::new();
        while let Some(update) = rx.blocking_recv() {
            let done = matches!(
                update.kind,
                ProgressKind::Completed { .. } | ProgressKind::Failed { .. }
            );
            kinds.push(update.kind);
            if done {
                break;
            }
        }
        kinds
    }

    #[test]
    fn canvas_task_creates_active_document() {
        let bridge = AsyncBridge::new().expect("runtime");
        let state = AppState::from_config(FileConfig::default());

        let kinds = drain(start_canvas(&bridge, &state));
        assert!(matches!(kinds.first(), Some(ProgressKind::Started { .. })));
        assert!(matches!(kinds.last(), Some(ProgressKind::Completed { folder: None, .. })));

        let snapshot = state.editor.active_snapshot().expect("active document");
        assert_eq!(snapshot.pixels.dimensions(), (46, 46));
    }

    #[test]
    fn invalid_canvas_raises_one_alert() {
        let bridge = AsyncBridge::new().expect("runtime");
        let mut config = FileConfig::default();
        config.canvas.width = 0;
        let state = AppState::from_config(config);

        let kinds = drain(start_canvas(&bridge, &state));
        let alerts = kinds
            .iter()
            .filter(|kind| matches!(kind, ProgressKind::Alert { .. }))
            .count();
        assert_eq!(alerts, 1);
        assert!(matches!(kinds.last(), Some(ProgressKind::Failed { .. })));
        assert!(state.editor.active_snapshot().is_none());
    }

    #[test]
    fn export_without_document_fails_before_any_dialog() {
        let bridge = AsyncBridge::new().expect("runtime");
        let state = AppState::from_config(FileConfig::default());

        let kinds = drain(start_export(&bridge, &state));
        assert!(kinds.iter().any(|kind| matches!(
            kind,
            ProgressKind::Alert { message } if message == "Please create or open a document first"
        )));
        assert!(kinds.iter().any(|kind| matches!(
            kind,
            ProgressKind::State {
                state: ExportState::Failed
            }
        )));
        assert!(matches!(kinds.last(), Some(ProgressKind::Failed { .. })));
    }

    #[test]
    fn missing_file_alerts() {
        let bridge = AsyncBridge::new().expect("runtime");
        let state = AppState::from_config(FileConfig::default());
        let path = std::env::temp_dir().join("favkit-definitely-missing.png");

        let kinds = drain(start_open(&bridge, &state, path));
        assert!(kinds.iter().any(|kind| matches!(kind, ProgressKind::Alert { .. })));
        assert!(matches!(kinds.last(), Some(ProgressKind::Failed { .. })));
    }
}
