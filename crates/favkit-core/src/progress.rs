//! Progress reporting for export runs.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync + 'static>;

/// Step inside one export branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchStep {
    Duplicating,
    Transforming,
    Encoding,
    Closing,
}

/// Where an export run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "state")]
pub enum ExportState {
    Idle,
    Validating,
    FolderSelected,
    Branch { index: u8, step: BranchStep },
    Completed,
    Failed,
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportState::Idle => f.write_str("idle"),
            ExportState::Validating => f.write_str("validating"),
            ExportState::FolderSelected => f.write_str("folder selected"),
            ExportState::Branch { index, step } => write!(f, "branch {index}: {step:?}"),
            ExportState::Completed => f.write_str("completed"),
            ExportState::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub kind: ProgressEventKind,
    pub stage: Option<String>,
    pub elapsed_ms: f64,
    pub stage_elapsed_ms: Option<f64>,
    pub message: Option<String>,
    pub state: Option<ExportState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressEventKind {
    Begin,
    End,
    Note,
    State,
}

/// Emits stage timing and state transitions to `tracing` and an optional callback.
pub(crate) struct StageLogger {
    program_start: Instant,
    stage_start: Instant,
    current_stage: Option<String>,
    state: ExportState,
    callback: Option<ProgressCallback>,
}

impl StageLogger {
    pub(crate) fn new(callback: Option<ProgressCallback>) -> Self {
        let now = Instant::now();
        Self {
            program_start: now,
            stage_start: now,
            current_stage: None,
            state: ExportState::Idle,
            callback,
        }
    }

    pub(crate) fn state(&self) -> ExportState {
        self.state
    }

    fn emit(&self, kind: ProgressEventKind, stage_elapsed: Option<Duration>, message: String) {
        if let Some(cb) = &self.callback {
            cb(ProgressEvent {
                kind,
                stage: self.current_stage.clone(),
                elapsed_ms: to_ms(self.program_start.elapsed()),
                stage_elapsed_ms: stage_elapsed.map(to_ms),
                message: Some(message),
                state: Some(self.state),
            });
        }
    }

    pub(crate) fn begin(&mut self, name: &str) {
        self.stage_start = Instant::now();
        self.current_stage = Some(name.to_string());
        debug!(stage = name, "BEGIN");
        self.emit(ProgressEventKind::Begin, None, format!("Starting {name}"));
    }

    pub(crate) fn end(&mut self, name: &str) {
        let stage_elapsed = self.stage_start.elapsed();
        debug!(
            stage = name,
            elapsed_ms = format_ms(stage_elapsed).as_str(),
            "END"
        );
        self.emit(
            ProgressEventKind::End,
            Some(stage_elapsed),
            format!("Finished {name} (Δ {} ms)", format_ms(stage_elapsed)),
        );
        self.current_stage = None;
    }

    pub(crate) fn note(&mut self, message: impl Into<String>) {
        let text = message.into();
        info!("{text}");
        self.emit(ProgressEventKind::Note, Some(self.stage_start.elapsed()), text);
    }

    pub(crate) fn transition(&mut self, state: ExportState) {
        debug!(from = %self.state, to = %state, "Export state");
        self.state = state;
        self.emit(ProgressEventKind::State, None, state.to_string());
    }
}

fn to_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

fn format_ms(d: Duration) -> String {
    format!("{:.3}", to_ms(d))
}
