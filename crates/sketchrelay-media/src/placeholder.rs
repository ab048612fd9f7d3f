//! Lazily generated stand-ins for missing captions and drawings.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use sketchrelay_core::blob::BlobStore;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::caption::render_caption_on;
use crate::config::CompositorConfig;
use crate::error::MediaError;
use crate::font::FontFace;
use crate::upload::encode_png;

/// Blob key the missing-caption frame is persisted under.
pub const MISSING_CAPTION_KEY: &str = "placeholders/missing-caption.png";
/// Blob key the missing-drawing frame is persisted under.
pub const MISSING_DRAWING_KEY: &str = "placeholders/missing-drawing.png";

const CAPTION_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const DRAWING_BACKGROUND: Rgba<u8> = Rgba([224, 224, 224, 255]);

/// Placeholder frames, generated once per process on first need.
#[derive(Debug, Default)]
pub struct Placeholders {
    caption: OnceCell<Arc<RgbaImage>>,
    drawing: OnceCell<Arc<RgbaImage>>,
}

impl Placeholders {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The frame shown for a caption that was never written.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::CaptionOverflow` if the placeholder text does
    /// not fit, or `MediaError::Task` if the render worker fails.
    pub async fn caption(
        &self,
        face: &Arc<dyn FontFace>,
        config: &Arc<CompositorConfig>,
        blobs: &dyn BlobStore,
    ) -> Result<Arc<RgbaImage>, MediaError> {
        self.caption
            .get_or_try_init(|| {
                generate(
                    MISSING_CAPTION_KEY,
                    config.missing_caption_text.clone(),
                    CAPTION_BACKGROUND,
                    Arc::clone(face),
                    Arc::clone(config),
                    blobs,
                )
            })
            .await
            .map(Arc::clone)
    }

    /// The frame shown for a drawing that was never submitted.
    ///
    /// # Errors
    ///
    /// Same as [`Placeholders::caption`].
    pub async fn drawing(
        &self,
        face: &Arc<dyn FontFace>,
        config: &Arc<CompositorConfig>,
        blobs: &dyn BlobStore,
    ) -> Result<Arc<RgbaImage>, MediaError> {
        self.drawing
            .get_or_try_init(|| {
                generate(
                    MISSING_DRAWING_KEY,
                    config.missing_drawing_text.clone(),
                    DRAWING_BACKGROUND,
                    Arc::clone(face),
                    Arc::clone(config),
                    blobs,
                )
            })
            .await
            .map(Arc::clone)
    }
}

async fn generate(
    key: &'static str,
    text: String,
    background: Rgba<u8>,
    face: Arc<dyn FontFace>,
    config: Arc<CompositorConfig>,
    blobs: &dyn BlobStore,
) -> Result<Arc<RgbaImage>, MediaError> {
    let image = tokio::task::spawn_blocking(move || {
        render_caption_on(&text, face.as_ref(), &config, background)
    })
    .await
    .map_err(|e| MediaError::Task(e.to_string()))??;

    // Persisting is best effort; the in-memory copy is what gets used.
    match encode_png(&image) {
        Ok(bytes) => match blobs.write(key, &bytes).await {
            Ok(()) => debug!(key, "placeholder stored"),
            Err(e) => warn!(key, error = %e, "could not store placeholder"),
        },
        Err(e) => warn!(key, error = %e, "could not encode placeholder"),
    }
    Ok(Arc::new(image))
}
