//! Favicon export: derives light/dark variants at 2x and 1x from the active
//! document and writes them into a picked folder.
//!
//! The pipeline runs inside one modal scope. At most one temporary duplicate is
//! open at a time, and it is closed without saving before the next branch
//! starts or before an error leaves the scope.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::host::{BatchCommand, BatchOptions, DocumentId, Host, HostError, ModalScope};
use crate::notify::Notifier;
use crate::progress::{BranchStep, ExportState, ProgressCallback, StageLogger};
use crate::storage::{FileEntry, FolderPicker, LocalFolder, StorageError};

pub const EXPORT_COMMAND_NAME: &str = "Export Favicons";

pub const LIGHT_2X: &str = "light@2x.png";
pub const DARK_2X: &str = "dark@2x.png";
pub const LIGHT_1X: &str = "light@1x.png";
pub const DARK_1X: &str = "dark@1x.png";
pub const LIGHT: &str = "light.png";
pub const DARK: &str = "dark.png";

/// Every file an export writes, in handle-creation order.
pub const OUTPUT_FILES: [&str; 6] = [LIGHT_2X, DARK_2X, LIGHT_1X, DARK_1X, LIGHT, DARK];

pub const DEFAULT_SMALL_SIZE: u32 = 23;

/// One pass over the active document.
struct BranchPlan {
    /// The first branch encodes the active document itself.
    duplicate: bool,
    invert: bool,
    downscale: bool,
    outputs: &'static [&'static str],
}

// Inversion always happens at full resolution, before any resize.
const BRANCHES: [BranchPlan; 4] = [
    BranchPlan {
        duplicate: false,
        invert: false,
        downscale: false,
        outputs: &[LIGHT_2X],
    },
    BranchPlan {
        duplicate: true,
        invert: true,
        downscale: false,
        outputs: &[DARK_2X],
    },
    BranchPlan {
        duplicate: true,
        invert: false,
        downscale: true,
        outputs: &[LIGHT_1X, LIGHT],
    },
    BranchPlan {
        duplicate: true,
        invert: true,
        downscale: true,
        outputs: &[DARK_1X, DARK],
    },
];

/// A failed check that aborts the export before anything is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Please create or open a document first")]
    NoActiveDocument,
    #[error("No folder selected")]
    NoFolderSelected,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ExportError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, ExportError::Precondition(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Edge length of the 1x outputs.
    pub small_size: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            small_size: DEFAULT_SMALL_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub name: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub folder: PathBuf,
    pub files: Vec<ExportedFile>,
}

impl ExportReport {
    pub fn success_message(&self) -> String {
        format!(
            "Successfully exported {} favicon files to:\n{}",
            self.files.len(),
            self.folder.display()
        )
    }
}

/// Runs the favicon export against a host.
pub struct Exporter<'a> {
    host: &'a dyn Host,
    picker: &'a dyn FolderPicker,
    notifier: &'a dyn Notifier,
    options: ExportOptions,
    progress: Option<ProgressCallback>,
}

impl<'a> Exporter<'a> {
    pub fn new(
        host: &'a dyn Host,
        picker: &'a dyn FolderPicker,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            host,
            picker,
            notifier,
            options: ExportOptions::default(),
            progress: None,
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Run one export. Exactly one alert is shown, whatever the outcome.
    pub async fn run(&self) -> Result<ExportReport, ExportError> {
        let mut logger = StageLogger::new(self.progress.clone());
        logger.transition(ExportState::Validating);

        let Some(original) = self.host.active_document().await else {
            return Err(self.reject(&mut logger, PreconditionError::NoActiveDocument));
        };

        let folder = match self.picker.pick_folder().await {
            Ok(Some(folder)) => folder,
            Ok(None) => return Err(self.reject(&mut logger, PreconditionError::NoFolderSelected)),
            Err(err) => return Err(self.fail(&mut logger, err.into())),
        };
        logger.transition(ExportState::FolderSelected);
        info!(
            document = %original,
            folder = %folder.native_path().display(),
            "Exporting favicons"
        );

        match self.run_modal(&mut logger, original, &folder).await {
            Ok(report) => {
                logger.transition(ExportState::Completed);
                self.notifier.show_alert(&report.success_message());
                Ok(report)
            }
            Err(err) => Err(self.fail(&mut logger, err)),
        }
    }

    fn reject(&self, logger: &mut StageLogger, err: PreconditionError) -> ExportError {
        warn!(reason = %err, "Export precondition failed");
        logger.transition(ExportState::Failed);
        self.notifier.show_alert(&err.to_string());
        err.into()
    }

    fn fail(&self, logger: &mut StageLogger, err: ExportError) -> ExportError {
        error!(error = %err, "Export error");
        logger.transition(ExportState::Failed);
        self.notifier.show_alert(&format!("Export failed: {err}"));
        err
    }

    async fn run_modal(
        &self,
        logger: &mut StageLogger,
        original: DocumentId,
        folder: &LocalFolder,
    ) -> Result<ExportReport, ExportError> {
        let scope = self.host.acquire_modal(EXPORT_COMMAND_NAME).await?;
        let mut temp = None;

        match self
            .run_branches(&scope, logger, original, folder, &mut temp)
            .await
        {
            Ok(report) => Ok(report),
            Err(err) => {
                error!(error = %err, "Error in export process");
                if let Some(document) = temp.take() {
                    if let ExportState::Branch { index, .. } = logger.state() {
                        logger.transition(ExportState::Branch {
                            index,
                            step: BranchStep::Closing,
                        });
                    }
                    if let Err(close_err) =
                        self.host.close_without_saving(&scope, document).await
                    {
                        warn!(
                            document = %document,
                            error = %close_err,
                            "Failed to close temporary document"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    async fn run_branches(
        &self,
        scope: &ModalScope,
        logger: &mut StageLogger,
        original: DocumentId,
        folder: &LocalFolder,
        temp: &mut Option<DocumentId>,
    ) -> Result<ExportReport, ExportError> {
        logger.begin("Create output files");
        let mut handles = Vec::with_capacity(OUTPUT_FILES.len());
        for name in OUTPUT_FILES {
            handles.push(folder.create_file(name, true).await?);
        }
        logger.end("Create output files");

        let mut files = Vec::with_capacity(OUTPUT_FILES.len());
        for (index, plan) in (1u8..).zip(BRANCHES.iter()) {
            let stage = format!("Branch {index}: {}", plan.outputs.join(", "));
            logger.begin(&stage);
            files.extend(
                self.run_branch(scope, logger, index, plan, original, &handles, temp)
                    .await?,
            );
            logger.end(&stage);
        }

        let entries = folder.entries().await?;
        info!(entries = entries.len(), "Export folder contents");

        Ok(ExportReport {
            folder: folder.native_path().to_path_buf(),
            files,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_branch(
        &self,
        scope: &ModalScope,
        logger: &mut StageLogger,
        index: u8,
        plan: &BranchPlan,
        original: DocumentId,
        handles: &[FileEntry],
        temp: &mut Option<DocumentId>,
    ) -> Result<Vec<ExportedFile>, ExportError> {
        let step = |step| ExportState::Branch { index, step };

        let document = if plan.duplicate {
            logger.transition(step(BranchStep::Duplicating));
            let copy = self.host.duplicate(scope, original).await?;
            *temp = Some(copy);
            copy
        } else {
            original
        };

        if plan.invert || plan.downscale {
            logger.transition(step(BranchStep::Transforming));
            if plan.invert {
                self.host
                    .batch_play(
                        scope,
                        &[BatchCommand::invert(document)],
                        BatchOptions::synchronous(),
                    )
                    .await?;
            }
            if plan.downscale {
                let size = self.options.small_size;
                self.host.resize_image(scope, document, size, size).await?;
            }
        }

        logger.transition(step(BranchStep::Encoding));
        let (width, height) = self.host.document_size(document).await?;
        let mut written = Vec::with_capacity(plan.outputs.len());
        for name in plan.outputs {
            let handle = handles
                .iter()
                .find(|handle| handle.name() == *name)
                .ok_or_else(|| StorageError::InvalidName((*name).to_string()))?;
            self.host.save_as_png(scope, document, handle).await?;
            logger.note(format!("Saved {name} at {width}x{height}"));
            written.push(ExportedFile {
                name: (*name).to_string(),
                path: handle.native_path().to_path_buf(),
                width,
                height,
            });
        }

        if let Some(copy) = temp.take() {
            logger.transition(step(BranchStep::Closing));
            if let Err(err) = self.host.close_without_saving(scope, copy).await {
                *temp = Some(copy);
                return Err(err.into());
            }
        }

        Ok(written)
    }
}
