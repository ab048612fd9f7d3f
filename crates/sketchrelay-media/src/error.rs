//! Media error types.

use sketchrelay_core::error::DomainError;

/// Errors raised while composing or normalizing images.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The caption font could not be read or parsed.
    #[error("font unavailable: {0}")]
    Font(String),

    /// No tried font size fits the caption into the frame.
    #[error("caption does not fit at any size down to {min_size}px")]
    CaptionOverflow {
        /// Smallest size that was tried.
        min_size: u32,
    },

    /// A chain's prompt and drawing counts differ.
    #[error("chain has {prompts} prompts but {drawings} drawings")]
    MismatchedChain {
        /// Number of prompt cells.
        prompts: usize,
        /// Number of drawing cells.
        drawings: usize,
    },

    /// A chain has no rounds at all.
    #[error("chain is empty")]
    EmptyChain,

    /// Image bytes could not be decoded.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// An image or animation could not be encoded.
    #[error("image encode failed: {0}")]
    Encode(String),

    /// Reading or writing a blob failed.
    #[error("blob store error: {0}")]
    Blob(#[from] DomainError),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Task(String),
}

impl From<MediaError> for DomainError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Blob(inner) => inner,
            MediaError::Decode(msg) => {
                DomainError::Validation(format!("image could not be decoded: {msg}"))
            }
            other => DomainError::Infrastructure(other.to_string()),
        }
    }
}
