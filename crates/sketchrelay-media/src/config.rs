//! Compositor settings.

use std::path::PathBuf;

/// Default location of the caption font on Debian-family systems.
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

/// Frame geometry, font sizing, timing and placeholder texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositorConfig {
    /// Width and height of every animation frame, in pixels.
    pub frame_size: u32,
    /// Blank border kept around caption text, in pixels.
    pub margin: u32,
    /// Largest caption font size tried.
    pub max_font_size: u32,
    /// Smallest caption font size tried.
    pub min_font_size: u32,
    /// Decrement between tried font sizes.
    pub font_size_step: u32,
    /// How long a caption frame is shown.
    pub caption_delay_ms: u32,
    /// How long a drawing frame is shown.
    pub drawing_delay_ms: u32,
    /// TrueType/OpenType font used for captions.
    pub font_path: PathBuf,
    /// Shown in place of a caption that was never written.
    pub missing_caption_text: String,
    /// Shown in place of a drawing that was never submitted.
    pub missing_drawing_text: String,
    /// Edge length uploaded drawings are normalized to.
    pub upload_size: u32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            frame_size: 512,
            margin: 32,
            max_font_size: 72,
            min_font_size: 12,
            font_size_step: 4,
            caption_delay_ms: 3000,
            drawing_delay_ms: 5000,
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            missing_caption_text: "This caption was never written.".to_owned(),
            missing_drawing_text: "This drawing was never finished.".to_owned(),
            upload_size: 512,
        }
    }
}

impl CompositorConfig {
    /// Width and height available to caption text.
    #[must_use]
    pub fn usable_extent(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let usable = self.frame_size.saturating_sub(2 * self.margin) as f32;
        usable
    }

    /// Font sizes to try, largest first.
    #[must_use]
    pub fn font_sizes(&self) -> Vec<u32> {
        let step = self.font_size_step.max(1);
        let mut sizes = Vec::new();
        let mut size = self.max_font_size;
        while size >= self.min_font_size && size > 0 {
            sizes.push(size);
            match size.checked_sub(step) {
                Some(next) => size = next,
                None => break,
            }
        }
        sizes
    }
}
