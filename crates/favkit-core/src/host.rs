//! The editing-engine surface the canvas and export workflows are written against.
//!
//! Every call is an `async` suspension point. Callers await each one before
//! issuing the next. Mutating calls take the [`ModalScope`] they run under and
//! are rejected unless that scope is the one currently holding the host.

use std::fmt;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::DocumentSpec;
use crate::storage::FileEntry;

/// Opaque handle to a document open in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(u64);

impl DocumentId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Target of a batch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRef {
    Active,
    Id(DocumentId),
}

/// Edits the host knows how to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Invert the color channels; alpha is left untouched.
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCommand {
    pub kind: CommandKind,
    pub target: DocumentRef,
}

impl BatchCommand {
    pub const fn new(kind: CommandKind, target: DocumentRef) -> Self {
        Self { kind, target }
    }

    pub const fn invert(document: DocumentId) -> Self {
        Self::new(CommandKind::Invert, DocumentRef::Id(document))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Apply before `batch_play` returns instead of letting the host defer it.
    pub synchronous_execution: bool,
}

impl BatchOptions {
    pub const fn synchronous() -> Self {
        Self {
            synchronous_execution: true,
        }
    }
}

/// Errors reported by the host editing engine.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("no open document with id {0}")]
    NoSuchDocument(DocumentId),
    #[error("there is no active document")]
    NoActiveDocument,
    #[error("{operation} must run inside the modal scope currently holding the editor")]
    NotModal { operation: &'static str },
    #[error("invalid document parameters: {0}")]
    InvalidDocumentSpec(String),
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Rejected(String),
}

/// Exclusive document-mutation rights, tagged with the command name shown in
/// the host's activity log. Released when dropped, on every exit path.
#[must_use = "the modal scope is released as soon as it is dropped"]
pub struct ModalScope {
    command_name: String,
    /// Issued by the host; unique among the scopes it hands out.
    token: u64,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ModalScope {
    pub fn new(
        command_name: impl Into<String>,
        token: u64,
        release: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            command_name: command_name.into(),
            token,
            release: Some(Box::new(release)),
        }
    }

    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

impl fmt::Debug for ModalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalScope")
            .field("command_name", &self.command_name)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl Drop for ModalScope {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[async_trait]
pub trait Host: Send + Sync {
    async fn active_document(&self) -> Option<DocumentId>;

    async fn open_document_count(&self) -> usize;

    async fn document_size(&self, document: DocumentId) -> Result<(u32, u32), HostError>;

    /// Wait for exclusive mutation rights.
    async fn acquire_modal(&self, command_name: &str) -> Result<ModalScope, HostError>;

    /// Create a document; it becomes the active document.
    async fn create_document(
        &self,
        scope: &ModalScope,
        spec: &DocumentSpec,
    ) -> Result<DocumentId, HostError>;

    async fn duplicate(
        &self,
        scope: &ModalScope,
        document: DocumentId,
    ) -> Result<DocumentId, HostError>;

    /// Close, discarding any changes.
    async fn close_without_saving(
        &self,
        scope: &ModalScope,
        document: DocumentId,
    ) -> Result<(), HostError>;

    async fn resize_image(
        &self,
        scope: &ModalScope,
        document: DocumentId,
        width: u32,
        height: u32,
    ) -> Result<(), HostError>;

    async fn batch_play(
        &self,
        scope: &ModalScope,
        commands: &[BatchCommand],
        options: BatchOptions,
    ) -> Result<(), HostError>;

    /// Encode as PNG into `file`, replacing any existing contents.
    async fn save_as_png(
        &self,
        scope: &ModalScope,
        document: DocumentId,
        file: &FileEntry,
    ) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn modal_scope_releases_on_drop() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let scope = ModalScope::new("Test", 3, move || flag.store(true, Ordering::SeqCst));
        assert_eq!(scope.command_name(), "Test");
        assert_eq!(scope.token(), 3);
        assert!(!released.load(Ordering::SeqCst));
        drop(scope);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn modal_scope_releases_on_early_return() {
        fn fails(released: Arc<AtomicBool>) -> Result<(), HostError> {
            let _scope = ModalScope::new("Test", 1, move || released.store(true, Ordering::SeqCst));
            Err(HostError::Rejected("boom".into()))
        }

        let released = Arc::new(AtomicBool::new(false));
        assert!(fails(released.clone()).is_err());
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn document_id_display() {
        assert_eq!(DocumentId::new(7).to_string(), "#7");
    }
}
