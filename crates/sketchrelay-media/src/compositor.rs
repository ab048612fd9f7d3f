//! Chain-to-animation compositor.
//!
//! For each chain the compositor pairs every round's caption frame with its
//! drawing frame, reduces all frames to the shared palette and stores one
//! looping GIF. Chains fail independently: a failure is logged and the
//! chain gets no animation, while the others still render.

use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use sketchrelay_core::blob::BlobStore;
use sketchrelay_core::render::{AnimationRenderer, ChainContent};
use tracing::{info, warn};

use crate::animation::{TimedFrame, encode_looping_gif};
use crate::caption::render_caption;
use crate::config::CompositorConfig;
use crate::error::MediaError;
use crate::font::{FontFace, FontProvider};
use crate::placeholder::Placeholders;
use crate::upload::decode_square;

enum CaptionSource {
    Text(String),
    Ready(Arc<RgbaImage>),
}

enum DrawingSource {
    Encoded(Vec<u8>),
    Ready(Arc<RgbaImage>),
}

/// Blob key of the animation for `chain` of archive `archive_id`.
#[must_use]
pub fn animation_key(archive_id: &str, chain: usize) -> String {
    format!("animations/{archive_id}/chain-{chain}.gif")
}

/// Renders finished chains into looping GIFs stored in a [`BlobStore`].
pub struct MediaCompositor {
    config: Arc<CompositorConfig>,
    fonts: Arc<dyn FontProvider>,
    blobs: Arc<dyn BlobStore>,
    placeholders: Placeholders,
}

impl MediaCompositor {
    /// Create a compositor.
    #[must_use]
    pub fn new(
        config: CompositorConfig,
        fonts: Arc<dyn FontProvider>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fonts,
            blobs,
            placeholders: Placeholders::new(),
        }
    }

    /// Renders and stores one chain. Returns the animation's blob key.
    ///
    /// # Errors
    ///
    /// Returns the `MediaError` that stopped this chain: a malformed chain,
    /// an unavailable font, a caption that does not fit, an unreadable
    /// drawing, an encoding failure or a failed blob write.
    pub async fn render_chain(
        &self,
        archive_id: &str,
        content: &ChainContent,
    ) -> Result<String, MediaError> {
        if content.prompts.len() != content.drawings.len() {
            return Err(MediaError::MismatchedChain {
                prompts: content.prompts.len(),
                drawings: content.drawings.len(),
            });
        }
        if content.prompts.is_empty() {
            return Err(MediaError::EmptyChain);
        }

        let face = self.fonts.face().await?;
        let mut rounds = Vec::with_capacity(content.prompts.len());
        for (prompt, drawing) in content.prompts.iter().zip(&content.drawings) {
            let caption = match prompt {
                Some(text) => CaptionSource::Text(text.clone()),
                None => CaptionSource::Ready(
                    self.placeholders
                        .caption(&face, &self.config, self.blobs.as_ref())
                        .await?,
                ),
            };
            let drawing = match drawing {
                Some(key) => DrawingSource::Encoded(self.blobs.read(key).await?),
                None => DrawingSource::Ready(
                    self.placeholders
                        .drawing(&face, &self.config, self.blobs.as_ref())
                        .await?,
                ),
            };
            rounds.push((caption, drawing));
        }

        let config = Arc::clone(&self.config);
        let gif = tokio::task::spawn_blocking(move || compose(rounds, face.as_ref(), &config))
            .await
            .map_err(|e| MediaError::Task(e.to_string()))??;

        let key = animation_key(archive_id, content.chain);
        self.blobs.write(&key, &gif).await?;
        Ok(key)
    }
}

fn compose(
    rounds: Vec<(CaptionSource, DrawingSource)>,
    face: &dyn FontFace,
    config: &CompositorConfig,
) -> Result<Vec<u8>, MediaError> {
    let mut frames = Vec::with_capacity(rounds.len() * 2);
    for (caption, drawing) in rounds {
        let caption = match caption {
            CaptionSource::Text(text) => render_caption(&text, face, config)?,
            CaptionSource::Ready(image) => (*image).clone(),
        };
        let drawing = match drawing {
            DrawingSource::Encoded(bytes) => decode_square(&bytes, config.frame_size)?,
            DrawingSource::Ready(image) => (*image).clone(),
        };
        frames.push(TimedFrame {
            image: caption,
            delay_ms: config.caption_delay_ms,
        });
        frames.push(TimedFrame {
            image: drawing,
            delay_ms: config.drawing_delay_ms,
        });
    }
    encode_looping_gif(frames)
}

#[async_trait]
impl AnimationRenderer for MediaCompositor {
    async fn render_chains(
        &self,
        archive_id: &str,
        chains: Vec<ChainContent>,
    ) -> Vec<Option<String>> {
        let mut animations = Vec::with_capacity(chains.len());
        for content in &chains {
            match self.render_chain(archive_id, content).await {
                Ok(key) => {
                    info!(archive_id, chain = content.chain, key = %key, "chain animation stored");
                    animations.push(Some(key));
                }
                Err(e) => {
                    warn!(archive_id, chain = content.chain, error = %e, "chain animation skipped");
                    animations.push(None);
                }
            }
        }
        animations
    }
}
