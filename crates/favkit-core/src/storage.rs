//! Folder and file handles for export destinations.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid file name '{0}'")]
    InvalidName(String),
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Handle to a file inside a [`LocalFolder`]. Nothing is written until a
/// document is saved into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    name: String,
    path: PathBuf,
}

impl FileEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn native_path(&self) -> &Path {
        &self.path
    }
}

/// A directory on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFolder {
    path: PathBuf,
}

impl LocalFolder {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|err| StorageError::io(&path, err))?;
        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(path));
        }
        Ok(Self { path })
    }

    /// Open `path`, creating it (and its parents) when missing.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|err| StorageError::io(&path, err))?;
        Self::open(path).await
    }

    pub fn native_path(&self) -> &Path {
        &self.path
    }

    /// Get a handle for `name` in this folder. Without `overwrite`, an existing
    /// entry of the same name is an error.
    pub async fn create_file(&self, name: &str, overwrite: bool) -> Result<FileEntry, StorageError> {
        validate_file_name(name)?;
        let path = self.path.join(name);
        if !overwrite
            && tokio::fs::try_exists(&path)
                .await
                .map_err(|err| StorageError::io(&path, err))?
        {
            return Err(StorageError::AlreadyExists(path));
        }
        debug!(file = %path.display(), overwrite, "Created file handle");
        Ok(FileEntry {
            name: name.to_string(),
            path,
        })
    }

    /// Names of the entries in this folder, sorted.
    pub async fn entries(&self) -> Result<Vec<String>, StorageError> {
        let mut reader = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|err| StorageError::io(&self.path, err))?;
        let mut names = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|err| StorageError::io(&self.path, err))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

fn validate_file_name(name: &str) -> Result<(), StorageError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Asks the user (or the caller) for a destination folder.
#[async_trait]
pub trait FolderPicker: Send + Sync {
    /// `Ok(None)` means the picker was cancelled.
    async fn pick_folder(&self) -> Result<Option<LocalFolder>, StorageError>;
}

/// Picker that always answers with the same folder, creating it on demand.
/// `None` behaves like a cancelled dialog.
#[derive(Debug, Clone, Default)]
pub struct FixedFolderPicker(pub Option<PathBuf>);

impl FixedFolderPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    pub fn cancelled() -> Self {
        Self(None)
    }
}

#[async_trait]
impl FolderPicker for FixedFolderPicker {
    async fn pick_folder(&self) -> Result<Option<LocalFolder>, StorageError> {
        match &self.0 {
            Some(path) => LocalFolder::create(path.clone()).await.map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rejects_bad_names() {
        for name in ["", " a.png", "a/b.png", "..", "a\\b.png"] {
            assert!(validate_file_name(name).is_err(), "{name:?} should be rejected");
        }
        assert!(validate_file_name("light@2x.png").is_ok());
    }

    #[tokio::test]
    async fn create_file_respects_overwrite() {
        let temp = tempdir().expect("tempdir");
        let folder = LocalFolder::open(temp.path()).await.expect("open");
        std::fs::write(temp.path().join("dark.png"), b"old").expect("write fixture");

        let err = folder.create_file("dark.png", false).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        let entry = folder.create_file("dark.png", true).await.expect("overwrite");
        assert_eq!(entry.name(), "dark.png");
        assert_eq!(entry.native_path(), temp.path().join("dark.png"));
    }

    #[tokio::test]
    async fn handles_do_not_touch_disk() {
        let temp = tempdir().expect("tempdir");
        let folder = LocalFolder::open(temp.path()).await.expect("open");
        folder.create_file("light.png", true).await.expect("handle");
        assert!(folder.entries().await.expect("entries").is_empty());
    }

    #[tokio::test]
    async fn open_rejects_files() {
        let temp = tempdir().expect("tempdir");
        let file = temp.path().join("plain.txt");
        std::fs::write(&file, b"x").expect("write fixture");
        assert!(matches!(
            LocalFolder::open(&file).await,
            Err(StorageError::NotADirectory(_))
        ));
    }

    #[tokio::test]
    async fn fixed_picker_creates_folder() {
        let temp = tempdir().expect("tempdir");
        let target = temp.path().join("nested").join("icons");
        let folder = FixedFolderPicker::new(&target)
            .pick_folder()
            .await
            .expect("pick")
            .expect("folder");
        assert_eq!(folder.native_path(), target);
        assert!(target.is_dir());

        assert!(FixedFolderPicker::cancelled().pick_folder().await.expect("pick").is_none());
    }
}
