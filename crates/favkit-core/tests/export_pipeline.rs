use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use favkit_core::{
    BatchCommand, BatchOptions, BranchStep, DocumentId, DocumentSpec, Editor, ExportOptions,
    ExportState, Exporter, FileEntry, FixedFolderPicker, FolderPicker, Host, HostError,
    LocalFolder, ModalScope, OUTPUT_FILES, ProgressEvent, ProgressEventKind, RecordingNotifier,
    StorageError, create_canvas,
};
use image::{Rgba, RgbaImage};
use tempfile::tempdir;

/// Picker that counts how often it was asked.
struct CountingPicker {
    inner: FixedFolderPicker,
    calls: AtomicUsize,
}

impl CountingPicker {
    fn new(inner: FixedFolderPicker) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FolderPicker for CountingPicker {
    async fn pick_folder(&self) -> Result<Option<LocalFolder>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.pick_folder().await
    }
}

struct BrokenPicker;

#[async_trait]
impl FolderPicker for BrokenPicker {
    async fn pick_folder(&self) -> Result<Option<LocalFolder>, StorageError> {
        Err(StorageError::InvalidName("picker exploded".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    Duplicate,
    BatchPlay,
    Resize,
    Save,
    Close,
}

/// Delegates to an [`Editor`], rejecting the `fail_at`-th call of `fail_op`.
struct FaultyHost {
    inner: Editor,
    fail_op: Op,
    fail_at: usize,
    seen: Mutex<HashMap<Op, usize>>,
}

impl FaultyHost {
    fn new(inner: Editor, fail_op: Op, fail_at: usize) -> Self {
        Self {
            inner,
            fail_op,
            fail_at,
            seen: Mutex::new(HashMap::new()),
        }
    }

    fn check(&self, op: Op) -> Result<(), HostError> {
        let mut seen = self.seen.lock().unwrap();
        let count = seen.entry(op).or_default();
        *count += 1;
        if op == self.fail_op && *count == self.fail_at {
            return Err(HostError::Rejected(format!(
                "injected {op:?} failure #{}",
                self.fail_at
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Host for FaultyHost {
    async fn active_document(&self) -> Option<DocumentId> {
        self.inner.active_document().await
    }

    async fn open_document_count(&self) -> usize {
        self.inner.open_document_count().await
    }

    async fn document_size(&self, document: DocumentId) -> Result<(u32, u32), HostError> {
        self.inner.document_size(document).await
    }

    async fn acquire_modal(&self, command_name: &str) -> Result<ModalScope, HostError> {
        self.inner.acquire_modal(command_name).await
    }

    async fn create_document(
        &self,
        scope: &ModalScope,
        spec: &DocumentSpec,
    ) -> Result<DocumentId, HostError> {
        self.inner.create_document(scope, spec).await
    }

    async fn duplicate(
        &self,
        scope: &ModalScope,
        document: DocumentId,
    ) -> Result<DocumentId, HostError> {
        self.check(Op::Duplicate)?;
        self.inner.duplicate(scope, document).await
    }

    async fn close_without_saving(
        &self,
        scope: &ModalScope,
        document: DocumentId,
    ) -> Result<(), HostError> {
        self.check(Op::Close)?;
        self.inner.close_without_saving(scope, document).await
    }

    async fn resize_image(
        &self,
        scope: &ModalScope,
        document: DocumentId,
        width: u32,
        height: u32,
    ) -> Result<(), HostError> {
        self.check(Op::Resize)?;
        self.inner.resize_image(scope, document, width, height).await
    }

    async fn batch_play(
        &self,
        scope: &ModalScope,
        commands: &[BatchCommand],
        options: BatchOptions,
    ) -> Result<(), HostError> {
        self.check(Op::BatchPlay)?;
        self.inner.batch_play(scope, commands, options).await
    }

    async fn save_as_png(
        &self,
        scope: &ModalScope,
        document: DocumentId,
        file: &FileEntry,
    ) -> Result<(), HostError> {
        self.check(Op::Save)?;
        self.inner.save_as_png(scope, document, file).await
    }
}

fn gradient() -> RgbaImage {
    RgbaImage::from_fn(46, 46, |x, y| {
        Rgba([(x * 5) as u8, (y * 5) as u8, ((x + y) * 2) as u8, 255])
    })
}

async fn editor_with_artwork() -> Editor {
    let editor = Editor::new();
    editor
        .open_image("artwork", image::DynamicImage::ImageRgba8(gradient()))
        .await
        .expect("open artwork");
    editor
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn sorted_outputs() -> Vec<String> {
    let mut names: Vec<String> = OUTPUT_FILES.iter().map(|name| name.to_string()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn export_without_active_document_writes_nothing() {
    let temp = tempdir().expect("tempdir");
    let editor = Editor::new();
    let picker = CountingPicker::new(FixedFolderPicker::new(temp.path()));
    let notifier = RecordingNotifier::new();

    let err = Exporter::new(&editor, &picker, &notifier)
        .run()
        .await
        .unwrap_err();

    assert!(err.is_precondition());
    assert_eq!(
        notifier.alerts(),
        vec!["Please create or open a document first".to_string()]
    );
    assert_eq!(picker.calls(), 0, "picker must not open without a document");
    assert!(file_names(temp.path()).is_empty());
    assert!(editor.history().is_empty(), "no modal scope may be entered");
}

#[tokio::test]
async fn cancelled_picker_writes_nothing() {
    let temp = tempdir().expect("tempdir");
    let editor = editor_with_artwork().await;
    let picker = CountingPicker::new(FixedFolderPicker::cancelled());
    let notifier = RecordingNotifier::new();

    let err = Exporter::new(&editor, &picker, &notifier)
        .run()
        .await
        .unwrap_err();

    assert!(err.is_precondition());
    assert_eq!(notifier.alerts(), vec!["No folder selected".to_string()]);
    assert_eq!(picker.calls(), 1);
    assert!(file_names(temp.path()).is_empty());
    assert_eq!(editor.open_document_count().await, 1);
}

#[tokio::test]
async fn picker_failure_is_reported_as_export_failure() {
    let editor = editor_with_artwork().await;
    let notifier = RecordingNotifier::new();

    let err = Exporter::new(&editor, &BrokenPicker, &notifier)
        .run()
        .await
        .unwrap_err();

    assert!(!err.is_precondition());
    let alerts = notifier.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("Export failed: "), "{alerts:?}");
}

#[tokio::test]
async fn export_writes_six_variants() {
    let temp = tempdir().expect("tempdir");
    let editor = editor_with_artwork().await;
    let picker = FixedFolderPicker::new(temp.path());
    let notifier = RecordingNotifier::new();

    let report = Exporter::new(&editor, &picker, &notifier)
        .run()
        .await
        .expect("export succeeds");

    assert_eq!(file_names(temp.path()), sorted_outputs());
    assert_eq!(report.files.len(), 6);
    assert_eq!(
        notifier.alerts(),
        vec![format!(
            "Successfully exported 6 favicon files to:\n{}",
            temp.path().display()
        )]
    );

    for name in ["light@2x.png", "dark@2x.png"] {
        let decoded = image::open(temp.path().join(name)).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (46, 46), "{name}");
    }
    for name in ["light@1x.png", "light.png", "dark@1x.png", "dark.png"] {
        let decoded = image::open(temp.path().join(name)).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (23, 23), "{name}");
    }

    let read = |name: &str| fs::read(temp.path().join(name)).expect("read output");
    assert_eq!(read("light@1x.png"), read("light.png"));
    assert_eq!(read("dark@1x.png"), read("dark.png"));
    assert_ne!(read("light@1x.png"), read("dark@1x.png"));

    let light = image::open(temp.path().join("light@2x.png")).expect("decode").to_rgba8();
    let dark = image::open(temp.path().join("dark@2x.png")).expect("decode").to_rgba8();
    assert_eq!(light, gradient(), "light@2x is the untouched document");
    for (lit, inv) in light.pixels().zip(dark.pixels()) {
        assert_eq!(
            *inv,
            Rgba([255 - lit[0], 255 - lit[1], 255 - lit[2], lit[3]])
        );
    }

    assert_eq!(editor.open_document_count().await, 1);
    assert!(!editor.is_modal());
    assert!(editor.history().iter().any(|name| name == "Export Favicons"));
}

#[tokio::test]
async fn rerun_overwrites_without_stray_files() {
    let temp = tempdir().expect("tempdir");
    let editor = editor_with_artwork().await;
    let picker = FixedFolderPicker::new(temp.path());
    let notifier = RecordingNotifier::new();
    let exporter = Exporter::new(&editor, &picker, &notifier);

    exporter.run().await.expect("first export");
    let first = fs::read(temp.path().join("dark.png")).expect("read");
    exporter.run().await.expect("second export");

    assert_eq!(file_names(temp.path()), sorted_outputs());
    assert_eq!(fs::read(temp.path().join("dark.png")).expect("read"), first);
    assert_eq!(notifier.alerts().len(), 2);
    assert_eq!(editor.open_document_count().await, 1);
}

#[tokio::test]
async fn export_of_generated_canvas() {
    let temp = tempdir().expect("tempdir");
    let editor = Editor::new();
    let notifier = RecordingNotifier::new();
    create_canvas(&editor, &notifier, &DocumentSpec::favicon_canvas())
        .await
        .expect("canvas");

    Exporter::new(&editor, &FixedFolderPicker::new(temp.path()), &notifier)
        .run()
        .await
        .expect("export");

    let dark = image::open(temp.path().join("dark.png")).expect("decode").to_rgba8();
    assert!(dark.pixels().all(|pixel| *pixel == Rgba([0, 0, 0, 255])));
    let light = image::open(temp.path().join("light.png")).expect("decode").to_rgba8();
    assert!(light.pixels().all(|pixel| *pixel == Rgba([255, 255, 255, 255])));
}

#[tokio::test]
async fn custom_small_size() {
    let temp = tempdir().expect("tempdir");
    let editor = editor_with_artwork().await;
    let notifier = RecordingNotifier::new();

    let report = Exporter::new(&editor, &FixedFolderPicker::new(temp.path()), &notifier)
        .with_options(ExportOptions { small_size: 16 })
        .run()
        .await
        .expect("export");

    let small: Vec<_> = report
        .files
        .iter()
        .filter(|file| file.width == 16 && file.height == 16)
        .map(|file| file.name.as_str())
        .collect();
    assert_eq!(small, vec!["light@1x.png", "light.png", "dark@1x.png", "dark.png"]);
}

#[tokio::test]
async fn progress_follows_state_machine() {
    let temp = tempdir().expect("tempdir");
    let editor = editor_with_artwork().await;
    let notifier = RecordingNotifier::new();
    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    Exporter::new(&editor, &FixedFolderPicker::new(temp.path()), &notifier)
        .with_progress(Arc::new(move |event: ProgressEvent| {
            sink.lock().unwrap().push(event);
        }))
        .run()
        .await
        .expect("export");

    let states: Vec<ExportState> = events
        .lock()
        .unwrap()
        .iter()
        .filter(|event| event.kind == ProgressEventKind::State)
        .filter_map(|event| event.state)
        .collect();

    let branch = |index, step| ExportState::Branch { index, step };
    assert_eq!(
        states,
        vec![
            ExportState::Validating,
            ExportState::FolderSelected,
            branch(1, BranchStep::Encoding),
            branch(2, BranchStep::Duplicating),
            branch(2, BranchStep::Transforming),
            branch(2, BranchStep::Encoding),
            branch(2, BranchStep::Closing),
            branch(3, BranchStep::Duplicating),
            branch(3, BranchStep::Transforming),
            branch(3, BranchStep::Encoding),
            branch(3, BranchStep::Closing),
            branch(4, BranchStep::Duplicating),
            branch(4, BranchStep::Transforming),
            branch(4, BranchStep::Encoding),
            branch(4, BranchStep::Closing),
            ExportState::Completed,
        ]
    );
}

#[tokio::test]
async fn any_single_fault_leaves_no_temporary_documents() {
    let cases = [
        (Op::Duplicate, 1),
        (Op::Duplicate, 2),
        (Op::Duplicate, 3),
        (Op::BatchPlay, 1),
        (Op::BatchPlay, 2),
        (Op::Resize, 1),
        (Op::Resize, 2),
        (Op::Save, 1),
        (Op::Save, 2),
        (Op::Save, 3),
        (Op::Save, 4),
        (Op::Save, 5),
        (Op::Save, 6),
        (Op::Close, 1),
        (Op::Close, 2),
        (Op::Close, 3),
    ];

    for (op, nth) in cases {
        let temp = tempdir().expect("tempdir");
        let host = FaultyHost::new(editor_with_artwork().await, op, nth);
        let before = host.open_document_count().await;
        let notifier = RecordingNotifier::new();

        let result = Exporter::new(&host, &FixedFolderPicker::new(temp.path()), &notifier)
            .run()
            .await;

        assert!(result.is_err(), "{op:?} #{nth} should fail the export");
        assert_eq!(
            host.open_document_count().await,
            before,
            "{op:?} #{nth} leaked a temporary document"
        );
        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1, "{op:?} #{nth}: {alerts:?}");
        assert!(alerts[0].starts_with("Export failed: "), "{alerts:?}");
        assert!(alerts[0].contains("injected"), "{alerts:?}");
        assert!(!host.inner.is_modal(), "{op:?} #{nth} left the modal scope held");
    }
}

#[tokio::test]
async fn fault_keeps_files_written_before_it() {
    let temp = tempdir().expect("tempdir");
    let host = FaultyHost::new(editor_with_artwork().await, Op::Resize, 1);
    let notifier = RecordingNotifier::new();

    Exporter::new(&host, &FixedFolderPicker::new(temp.path()), &notifier)
        .run()
        .await
        .unwrap_err();

    assert_eq!(
        file_names(temp.path()),
        vec!["dark@2x.png".to_string(), "light@2x.png".to_string()]
    );
}
