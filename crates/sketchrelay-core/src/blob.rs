//! Blob store abstraction.
//!
//! Keys are relative, slash-separated paths such as
//! `drawings/<uuid>.png` or `animations/<archive>/chain-0.gif`.

use async_trait::async_trait;

use crate::error::DomainError;

/// Key prefix under which uploaded drawings are stored.
pub const DRAWING_PREFIX: &str = "drawings/";

/// Storage for uploaded drawings, placeholders and rendered animations.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Reads the full contents stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if nothing is stored under `key`, and
    /// `DomainError::Infrastructure` on any other I/O failure.
    async fn read(&self, key: &str) -> Result<Vec<u8>, DomainError>;

    /// Stores `bytes` under `key`, replacing any previous contents.
    ///
    /// Implementations must never leave a partially written blob visible.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a malformed key and
    /// `DomainError::Infrastructure` on I/O failure.
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), DomainError>;

    /// Returns whether a blob is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on I/O failure.
    async fn exists(&self, key: &str) -> Result<bool, DomainError>;
}

/// Rejects keys that are empty, absolute, or escape the store root.
///
/// # Errors
///
/// Returns `DomainError::Validation` describing the problem.
pub fn validate_key(key: &str) -> Result<(), DomainError> {
    if key.is_empty() {
        return Err(DomainError::Validation("blob key must not be empty".to_owned()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(DomainError::Validation(format!(
            "blob key must be a relative path: {key}"
        )));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(DomainError::Validation(format!(
            "blob key contains an invalid segment: {key}"
        )));
    }
    Ok(())
}
