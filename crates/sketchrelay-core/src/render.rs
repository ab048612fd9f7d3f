//! Animation rendering abstraction.
//!
//! The game crate hands finished chains to an [`AnimationRenderer`] without
//! knowing how frames are composed or encoded.

use async_trait::async_trait;

/// The content of one chain, ordered by round.
///
/// `prompts[r]` and `drawings[r]` are the submissions for round `r`; `None`
/// marks a cell that was never filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainContent {
    /// Index of the chain (the join position of the participant who
    /// started it).
    pub chain: usize,
    /// Prompt text per round.
    pub prompts: Vec<Option<String>>,
    /// Drawing blob key per round.
    pub drawings: Vec<Option<String>>,
}

/// Renders each chain of a finished session into an animation.
#[async_trait]
pub trait AnimationRenderer: Send + Sync {
    /// Renders `chains` for the archive `archive_id`.
    ///
    /// Returns one entry per input chain, in input order: the blob key of
    /// the stored animation, or `None` if that chain could not be rendered.
    /// Failures are isolated per chain and never propagated.
    async fn render_chains(&self, archive_id: &str, chains: Vec<ChainContent>)
    -> Vec<Option<String>>;
}
