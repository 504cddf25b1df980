//! Async runtime bridge for running editor tasks off the UI thread

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use favkit_core::ExportState;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc;

type Receiver = mpsc::UnboundedReceiver<ProgressUpdate>;

/// Bridge between the tokio runtime and egui
pub struct AsyncBridge {
    /// Wrapped in Option so Drop can shut it down without blocking
    runtime: Option<Runtime>,
    handle: Handle,

    /// Channel for receiving progress updates from the running task
    progress_rx: Arc<Mutex<Option<Receiver>>>,
}

/// Progress update from a background task
#[derive(Clone, Debug)]
pub struct ProgressUpdate {
    pub kind: ProgressKind,
    pub message: Option<String>,
    pub elapsed_ms: Option<f64>,
}

impl ProgressUpdate {
    pub fn new(kind: ProgressKind) -> Self {
        Self {
            kind,
            message: None,
            elapsed_ms: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Clone, Debug)]
pub enum ProgressKind {
    Started { task: String },
    Stage { stage: String },
    State { state: ExportState },
    /// An alert the workflow raised; shown as a modal window.
    Alert { message: String },
    Completed {
        summary: String,
        folder: Option<PathBuf>,
    },
    Failed { error: String },
}

impl AsyncBridge {
    pub fn new() -> std::io::Result<Self> {
        let runtime = Runtime::new()?;
        let handle = runtime.handle().clone();
        Ok(Self {
            runtime: Some(runtime),
            handle,
            progress_rx: Arc::new(Mutex::new(None)),
        })
    }

    /// Handle for spawning tasks
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    fn receiver(&self) -> MutexGuard<'_, Option<Receiver>> {
        self.progress_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_progress_receiver(&self, rx: Receiver) {
        *self.receiver() = Some(rx);
    }

    pub fn clear_progress_receiver(&self) {
        *self.receiver() = None;
    }

    /// Drain pending updates into `handler`
    pub fn poll_progress<F>(&self, mut handler: F)
    where
        F: FnMut(ProgressUpdate),
    {
        if let Some(rx) = self.receiver().as_mut() {
            while let Ok(update) = rx.try_recv() {
                handler(update);
            }
        }
    }
}

impl Drop for AsyncBridge {
    fn drop(&mut self) {
        // Avoids "Cannot drop a runtime in a context where blocking is not allowed"
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
