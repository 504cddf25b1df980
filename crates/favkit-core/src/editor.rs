//! The in-process editing engine behind [`Host`].

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::document::{Document, DocumentSnapshot, DocumentSpec, ResampleFilter, check_dimensions};
use crate::host::{BatchCommand, BatchOptions, DocumentId, DocumentRef, Host, HostError, ModalScope};
use crate::storage::FileEntry;

const OPEN_COMMAND_NAME: &str = "Open Document";
const DEFAULT_RESOLUTION: f64 = 72.0;

/// Shared by every editor so a scope from one is never valid on another.
static NEXT_SCOPE_TOKEN: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct ActiveScope {
    token: u64,
    command: String,
}

#[derive(Debug, Default)]
struct EditorState {
    /// Open documents, oldest first.
    documents: Vec<Document>,
    active: Option<DocumentId>,
    next_id: u64,
    modal: Option<ActiveScope>,
    history: Vec<String>,
    filter: ResampleFilter,
}

impl EditorState {
    /// Only the scope currently holding the editor may mutate it.
    fn require_modal(&self, scope: &ModalScope, operation: &'static str) -> Result<(), HostError> {
        match &self.modal {
            Some(active) if active.token == scope.token() => Ok(()),
            held => {
                warn!(
                    operation,
                    caller = scope.command_name(),
                    holder = held.as_ref().map(|active| active.command.as_str()),
                    "Rejected mutation outside the holding modal scope"
                );
                Err(HostError::NotModal { operation })
            }
        }
    }

    fn allocate_id(&mut self) -> DocumentId {
        self.next_id += 1;
        DocumentId::new(self.next_id)
    }

    fn insert(&mut self, document: Document) -> DocumentId {
        let id = document.id;
        self.documents.push(document);
        self.active = Some(id);
        id
    }

    fn document(&self, id: DocumentId) -> Result<&Document, HostError> {
        self.documents
            .iter()
            .find(|document| document.id == id)
            .ok_or(HostError::NoSuchDocument(id))
    }

    fn document_mut(&mut self, id: DocumentId) -> Result<&mut Document, HostError> {
        self.documents
            .iter_mut()
            .find(|document| document.id == id)
            .ok_or(HostError::NoSuchDocument(id))
    }

    fn resolve(&self, target: DocumentRef) -> Result<DocumentId, HostError> {
        match target {
            DocumentRef::Active => self.active.ok_or(HostError::NoActiveDocument),
            DocumentRef::Id(id) => self.document(id).map(|document| document.id),
        }
    }

    fn remove(&mut self, id: DocumentId) -> Result<Document, HostError> {
        let position = self
            .documents
            .iter()
            .position(|document| document.id == id)
            .ok_or(HostError::NoSuchDocument(id))?;
        let document = self.documents.remove(position);
        if self.active == Some(id) {
            self.active = self.documents.last().map(|document| document.id);
        }
        Ok(document)
    }
}

fn lock(state: &Mutex<EditorState>) -> MutexGuard<'_, EditorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Raster editing engine holding every open document in memory.
#[derive(Debug)]
pub struct Editor {
    state: Arc<Mutex<EditorState>>,
    modal_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Editor {
    pub fn new() -> Self {
        Self::with_filter(ResampleFilter::default())
    }

    pub fn with_filter(filter: ResampleFilter) -> Self {
        let state = EditorState {
            filter,
            ..EditorState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            modal_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn filter(&self) -> ResampleFilter {
        self.state().filter
    }

    /// Filter used by every later resize.
    pub fn set_filter(&self, filter: ResampleFilter) {
        self.state().filter = filter;
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        lock(&self.state)
    }

    /// Command names of every modal scope entered so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    pub fn is_modal(&self) -> bool {
        self.state().modal.is_some()
    }

    pub fn snapshot(&self, document: DocumentId) -> Option<DocumentSnapshot> {
        let state = self.state();
        state.document(document).ok().map(DocumentSnapshot::from)
    }

    pub fn active_snapshot(&self) -> Option<DocumentSnapshot> {
        let state = self.state();
        let active = state.active?;
        state.document(active).ok().map(DocumentSnapshot::from)
    }

    /// Open an already decoded image as the active document.
    pub async fn open_image(
        &self,
        name: impl Into<String>,
        image: DynamicImage,
    ) -> Result<DocumentId, HostError> {
        check_dimensions(image.width(), image.height()).map_err(HostError::InvalidDocumentSpec)?;
        let _scope = self.acquire_modal(OPEN_COMMAND_NAME).await?;
        let mut state = self.state();
        let id = state.allocate_id();
        let document = Document::from_image(id, name.into(), image, DEFAULT_RESOLUTION);
        Ok(state.insert(document))
    }

    /// Decode an image file and make it the active document.
    pub async fn open_file(&self, path: &Path) -> Result<DocumentId, HostError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decode_error = |source| HostError::Decode {
            path: path.to_path_buf(),
            source,
        };
        // Header dimensions are checked before the pixels are allocated.
        let (width, height) = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|source| HostError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .into_dimensions()
            .map_err(decode_error)?;
        check_dimensions(width, height).map_err(HostError::InvalidDocumentSpec)?;
        let image = image::load_from_memory(&bytes).map_err(decode_error)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string());

        let _scope = self.acquire_modal(OPEN_COMMAND_NAME).await?;
        let id = {
            let mut state = self.state();
            let id = state.allocate_id();
            let document = Document::from_image(id, name, image, DEFAULT_RESOLUTION);
            state.insert(document)
        };
        info!(document = %id, path = %path.display(), "Opened document");
        Ok(id)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for Editor {
    async fn active_document(&self) -> Option<DocumentId> {
        self.state().active
    }

    async fn open_document_count(&self) -> usize {
        self.state().documents.len()
    }

    async fn document_size(&self, document: DocumentId) -> Result<(u32, u32), HostError> {
        let state = self.state();
        state.document(document).map(Document::dimensions)
    }

    async fn acquire_modal(&self, command_name: &str) -> Result<ModalScope, HostError> {
        let guard = self.modal_lock.clone().lock_owned().await;
        let token = NEXT_SCOPE_TOKEN.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = self.state();
            state.modal = Some(ActiveScope {
                token,
                command: command_name.to_string(),
            });
            state.history.push(command_name.to_string());
        }
        debug!(command = command_name, token, "Entered modal scope");

        let state = self.state.clone();
        let name = command_name.to_string();
        Ok(ModalScope::new(command_name, token, move || {
            let mut locked = lock(&state);
            let flushed: usize = locked
                .documents
                .iter_mut()
                .map(Document::flush_pending)
                .sum();
            locked.modal = None;
            drop(locked);
            drop(guard);
            debug!(command = %name, flushed, "Left modal scope");
        }))
    }

    async fn create_document(
        &self,
        scope: &ModalScope,
        spec: &DocumentSpec,
    ) -> Result<DocumentId, HostError> {
        spec.validate().map_err(HostError::InvalidDocumentSpec)?;
        let mut state = self.state();
        state.require_modal(scope, "createDocument")?;
        let id = state.allocate_id();
        let id = state.insert(Document::blank(id, spec));
        info!(
            document = %id,
            width = spec.width,
            height = spec.height,
            resolution = spec.resolution,
            "Created document"
        );
        Ok(id)
    }

    async fn duplicate(
        &self,
        scope: &ModalScope,
        document: DocumentId,
    ) -> Result<DocumentId, HostError> {
        let mut state = self.state();
        state.require_modal(scope, "duplicate")?;
        let id = state.allocate_id();
        let source = state.document_mut(document)?;
        source.flush_pending();
        let copy = source.duplicate(id);
        let id = state.insert(copy);
        debug!(source = %document, duplicate = %id, "Duplicated document");
        Ok(id)
    }

    async fn close_without_saving(
        &self,
        scope: &ModalScope,
        document: DocumentId,
    ) -> Result<(), HostError> {
        let mut state = self.state();
        state.require_modal(scope, "close")?;
        state.remove(document)?;
        debug!(document = %document, "Closed document without saving");
        Ok(())
    }

    async fn resize_image(
        &self,
        scope: &ModalScope,
        document: DocumentId,
        width: u32,
        height: u32,
    ) -> Result<(), HostError> {
        check_dimensions(width, height)
            .map_err(|reason| HostError::InvalidDocumentSpec(format!("cannot resize: {reason}")))?;
        let mut state = self.state();
        state.require_modal(scope, "resizeImage")?;
        let filter = state.filter;
        let target = state.document_mut(document)?;
        target.flush_pending();
        target.resize(width, height, filter);
        debug!(document = %document, width, height, filter = %filter, "Resized document");
        Ok(())
    }

    async fn batch_play(
        &self,
        scope: &ModalScope,
        commands: &[BatchCommand],
        options: BatchOptions,
    ) -> Result<(), HostError> {
        let mut state = self.state();
        state.require_modal(scope, "batchPlay")?;
        for command in commands {
            let id = state.resolve(command.target)?;
            let target = state.document_mut(id)?;
            if options.synchronous_execution {
                target.flush_pending();
                target.apply(command.kind);
            } else {
                target.pending.push(command.kind);
            }
            debug!(
                document = %id,
                command = ?command.kind,
                synchronous = options.synchronous_execution,
                "Played batch command"
            );
        }
        Ok(())
    }

    async fn save_as_png(
        &self,
        scope: &ModalScope,
        document: DocumentId,
        file: &FileEntry,
    ) -> Result<(), HostError> {
        let path = file.native_path().to_path_buf();
        let bytes = {
            let mut state = self.state();
            state.require_modal(scope, "saveAs.png")?;
            let target = state.document_mut(document)?;
            target.flush_pending();
            target.encode_png().map_err(|source| HostError::Encode {
                path: path.clone(),
                source,
            })?
        };

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| HostError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(document = %document, file = %path.display(), bytes = bytes.len(), "Saved PNG");
        Ok(())
    }
}
