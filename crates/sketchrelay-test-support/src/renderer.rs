//! Test renderer — records the chains it is asked to render.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sketchrelay_core::render::{AnimationRenderer, ChainContent};

/// An `AnimationRenderer` that records every call and returns a
/// deterministic key per chain. Chains listed in `failing_chains` come back
/// as `None`, mimicking a per-chain rendering failure.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    failing_chains: Vec<usize>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, Vec<ChainContent>)>>,
}

impl RecordingRenderer {
    /// Create a renderer that succeeds for every chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer that fails for the given chain indices.
    #[must_use]
    pub fn failing_on(failing_chains: Vec<usize>) -> Self {
        Self {
            failing_chains,
            ..Self::default()
        }
    }

    /// Create a renderer that sleeps for `delay` before rendering, like a
    /// slow multi-chain render.
    #[must_use]
    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Returns a snapshot of all `(archive_id, chains)` render calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<(String, Vec<ChainContent>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnimationRenderer for RecordingRenderer {
    async fn render_chains(
        &self,
        archive_id: &str,
        chains: Vec<ChainContent>,
    ) -> Vec<Option<String>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let refs = chains
            .iter()
            .map(|content| {
                if self.failing_chains.contains(&content.chain) {
                    None
                } else {
                    Some(format!("animations/{archive_id}/chain-{}.gif", content.chain))
                }
            })
            .collect();
        self.calls
            .lock()
            .unwrap()
            .push((archive_id.to_owned(), chains));
        refs
    }
}
