//! File and folder dialog utilities

use std::path::PathBuf;

use async_trait::async_trait;
use favkit_core::{FolderPicker, LocalFolder, StorageError};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Pick an image to open as the active document
pub fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open Image")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

/// Native folder chooser used as the export destination picker.
#[derive(Debug, Clone, Default)]
pub struct DialogFolderPicker {
    pub start_dir: Option<PathBuf>,
}

impl DialogFolderPicker {
    pub fn new(start_dir: Option<PathBuf>) -> Self {
        Self { start_dir }
    }
}

#[async_trait]
impl FolderPicker for DialogFolderPicker {
    async fn pick_folder(&self) -> Result<Option<LocalFolder>, StorageError> {
        let mut dialog = rfd::AsyncFileDialog::new().set_title("Select Output Folder for Favicons");
        if let Some(dir) = self.start_dir.as_ref().filter(|dir| dir.is_dir()) {
            dialog = dialog.set_directory(dir);
        }
        match dialog.pick_folder().await {
            Some(handle) => LocalFolder::open(handle.path().to_path_buf()).await.map(Some),
            None => Ok(None),
        }
    }
}
