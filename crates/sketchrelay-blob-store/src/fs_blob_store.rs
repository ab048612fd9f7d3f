//! Filesystem implementation of the `BlobStore` trait.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use sketchrelay_core::blob::{BlobStore, validate_key};
use sketchrelay_core::error::DomainError;

/// Stores each blob as a file under a root directory, at the blob key's
/// relative path.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory blobs are stored under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DomainError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

fn io_error(action: &str, key: &str, err: &std::io::Error) -> DomainError {
    DomainError::Infrastructure(format!("blob {action} failed for {key}: {err}"))
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn read(&self, key: &str) -> Result<Vec<u8>, DomainError> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                DomainError::not_found("blob", key)
            } else {
                io_error("read", key, &e)
            }
        })
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), DomainError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("write", key, &e))?;
        }

        // Write beside the target, then rename over it, so readers never
        // see a partial blob.
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DomainError::Validation(format!("blob key has no file name: {key}")))?;
        let temp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|e| io_error("write", key, &e))?;
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                warn!(key, error = %cleanup, "could not remove temporary blob");
            }
            return Err(io_error("write", key, &e));
        }

        debug!(key, bytes = bytes.len(), "blob written");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error("lookup", key, &e))
    }
}
