//! Upload store for post images
//!
//! Files live flat in one directory under their stored name (see
//! [`crate::services::naming`]). Several posts may share a stored file, so a
//! file is only removed once no post row references it any more.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Image extensions accepted for posts. The comparison is case-sensitive.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg"];

/// Error type for upload store operations
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Failed to create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write upload {name}: {source}")]
    Write {
        name: String,
        source: std::io::Error,
    },
    #[error("Failed to check upload {name}: {source}")]
    Stat {
        name: String,
        source: std::io::Error,
    },
    #[error("Failed to remove upload {name}: {source}")]
    Remove {
        name: String,
        source: std::io::Error,
    },
    #[error("Invalid stored file name: {0}")]
    InvalidName(String),
}

/// The extension of `original` when it is an accepted image type
pub fn accepted_extension(original: &str) -> Option<&str> {
    if original.is_empty() {
        return None;
    }
    let ext = super::naming::extension(original);
    ALLOWED_EXTENSIONS.contains(&ext).then_some(ext)
}

/// Where post images are kept
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Create the upload directory and its parents when missing
    async fn ensure_directory(&self) -> Result<(), UploadError>;

    /// Write `bytes` under `name`, replacing any existing file
    async fn store(&self, name: &str, bytes: &[u8]) -> Result<(), UploadError>;

    async fn exists(&self, name: &str) -> Result<bool, UploadError>;

    /// Remove `name`. A file that is already gone is not an error.
    async fn remove(&self, name: &str) -> Result<(), UploadError>;

    /// Remove `name` only when `reference_count` is zero.
    ///
    /// `reference_count` must be computed after the referencing row was
    /// deleted. Returns whether the file was removed.
    async fn delete_if_unreferenced(
        &self,
        name: &str,
        reference_count: i64,
    ) -> Result<bool, UploadError> {
        if reference_count > 0 {
            tracing::debug!(name, reference_count, "Upload still referenced, keeping file");
            return Ok(false);
        }
        self.remove(name).await?;
        Ok(true)
    }
}

/// Upload store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalUploadStore {
    dir: PathBuf,
}

impl LocalUploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, UploadError> {
        // stored names are flat; reject anything that could leave the directory
        if name.is_empty()
            || name.contains(['/', '\\'])
            || name == "."
            || name == ".."
        {
            return Err(UploadError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl UploadStore for LocalUploadStore {
    async fn ensure_directory(&self) -> Result<(), UploadError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| UploadError::CreateDir {
                path: self.dir.clone(),
                source,
            })
    }

    async fn store(&self, name: &str, bytes: &[u8]) -> Result<(), UploadError> {
        let path = self.path_for(name)?;
        self.ensure_directory().await?;
        fs::write(&path, bytes)
            .await
            .map_err(|source| UploadError::Write {
                name: name.to_string(),
                source,
            })?;
        tracing::debug!(name, size = bytes.len(), "Stored upload");
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, UploadError> {
        let path = self.path_for(name)?;
        fs::try_exists(&path)
            .await
            .map_err(|source| UploadError::Stat {
                name: name.to_string(),
                source,
            })
    }

    async fn remove(&self, name: &str) -> Result<(), UploadError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(name, "Removed unreferenced upload");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(name, "Upload to remove was already missing");
                Ok(())
            }
            Err(source) => Err(UploadError::Remove {
                name: name.to_string(),
                source,
            }),
        }
    }
}
