//! Test blob stores — in-memory and failing `BlobStore` implementations.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use sketchrelay_core::blob::{BlobStore, validate_key};
use sketchrelay_core::error::DomainError;

/// A blob store that keeps everything in a map. Writes are recorded in order
/// so tests can assert on what was (and was not) persisted.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob without going through the async API.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        self.blobs.lock().unwrap().insert(key.to_owned(), bytes);
    }

    /// Returns all stored keys in sorted order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn keys(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    /// Returns a copy of the blob under `key`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, key: &str) -> Result<Vec<u8>, DomainError> {
        validate_key(key)?;
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| DomainError::not_found("blob", key))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), DomainError> {
        validate_key(key)?;
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        validate_key(key)?;
        Ok(self.blobs.lock().unwrap().contains_key(key))
    }
}

/// A blob store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn read(&self, _key: &str) -> Result<Vec<u8>, DomainError> {
        Err(DomainError::Infrastructure("disk unavailable".into()))
    }

    async fn write(&self, _key: &str, _bytes: &[u8]) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("disk unavailable".into()))
    }

    async fn exists(&self, _key: &str) -> Result<bool, DomainError> {
        Err(DomainError::Infrastructure("disk unavailable".into()))
    }
}
