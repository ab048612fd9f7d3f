//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A required field is missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// A session, participant, archive or blob does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// The kind of thing that was looked up.
        entity: &'static str,
        /// The key it was looked up by.
        key: String,
    },

    /// The operation is not valid in the current lifecycle state or phase.
    #[error("state error: {0}")]
    State(String),

    /// The supplied secret does not match the one bound to the identity.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// An infrastructure error (I/O, poisoned lock).
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for [`DomainError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }
}
