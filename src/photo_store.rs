//! # Photo Store Module
//!
//! Product photos live in one directory, one file per photo, named by a
//! random token so that names never collide and cannot be guessed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{MarketError, MarketResult};

/// Directory-backed storage for product photos
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the photo directory if it does not exist yet
    pub async fn ensure_dir(&self) -> MarketResult<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Write a photo and return the path stored in the product record
    pub async fn save(&self, bytes: &[u8]) -> MarketResult<String> {
        self.ensure_dir().await?;
        let path = self.dir.join(format!("{}.jpg", Uuid::new_v4()));
        fs::write(&path, bytes).await?;

        let path = path.to_string_lossy().into_owned();
        debug!(photo = %path, size = bytes.len(), "Photo saved");
        Ok(path)
    }

    /// Read a stored photo. A missing file is `ResourceMissing`.
    pub async fn load(&self, photo: &str) -> MarketResult<Vec<u8>> {
        match fs::read(photo).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(MarketError::ResourceMissing(photo.to_string()))
            }
            Err(e) => Err(MarketError::Io(e)),
        }
    }

    /// Remove a stored photo. Removing a file that is already gone succeeds.
    pub async fn remove(&self, photo: &str) -> MarketResult<()> {
        match fs::remove_file(photo).await {
            Ok(()) => {
                debug!(photo, "Photo removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(photo, "Photo was already missing");
                Ok(())
            }
            Err(e) => Err(MarketError::Io(e)),
        }
    }
}
