//! Font loading and glyph metrics.

use std::path::PathBuf;
use std::sync::Arc;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use async_trait::async_trait;
use image::RgbaImage;
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::MediaError;

/// Glyph metrics and rasterization for caption text.
pub trait FontFace: Send + Sync {
    /// Horizontal advance of `ch` at `size` pixels.
    fn advance(&self, ch: char, size: f32) -> f32;

    /// Distance from the top of a line to its baseline at `size` pixels.
    fn ascent(&self, size: f32) -> f32;

    /// Vertical distance between consecutive baselines at `size` pixels.
    fn line_height(&self, size: f32) -> f32;

    /// Draws `ch` in black with its origin at (`x`, `baseline`).
    fn draw_char(&self, ch: char, size: f32, x: f32, baseline: f32, canvas: &mut RgbaImage);
}

/// Darkens one canvas pixel towards black by `coverage` (0 to 1).
/// Coordinates outside the canvas are ignored.
pub fn blend_ink(canvas: &mut RgbaImage, x: i64, y: i64, coverage: f32) {
    let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
        return;
    };
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    let keep = 1.0 - coverage.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x, y);
    for channel in &mut pixel.0[..3] {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let darkened = (f32::from(*channel) * keep).round() as u8;
        *channel = darkened;
    }
}

/// A [`FontFace`] backed by an outline font.
pub struct AbGlyphFace {
    font: FontArc,
}

impl AbGlyphFace {
    /// Parses TrueType/OpenType font bytes.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Font` if the bytes are not a usable font.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, MediaError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| MediaError::Font(e.to_string()))?;
        Ok(Self { font })
    }
}

impl FontFace for AbGlyphFace {
    fn advance(&self, ch: char, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        scaled.h_advance(self.font.glyph_id(ch))
    }

    fn ascent(&self, size: f32) -> f32 {
        self.font.as_scaled(PxScale::from(size)).ascent()
    }

    fn line_height(&self, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        scaled.height() + scaled.line_gap()
    }

    fn draw_char(&self, ch: char, size: f32, x: f32, baseline: f32, canvas: &mut RgbaImage) {
        let mut glyph = self.font.as_scaled(PxScale::from(size)).scaled_glyph(ch);
        glyph.position = point(x, baseline);
        let Some(outlined) = self.font.outline_glyph(glyph) else {
            return;
        };
        let bounds = outlined.px_bounds();
        #[allow(clippy::cast_possible_truncation)]
        let (left, top) = (bounds.min.x.floor() as i64, bounds.min.y.floor() as i64);
        outlined.draw(|gx, gy, coverage| {
            blend_ink(
                canvas,
                left + i64::from(gx),
                top + i64::from(gy),
                coverage,
            );
        });
    }
}

/// Supplies the caption font to the compositor.
#[async_trait]
pub trait FontProvider: Send + Sync {
    /// Returns the loaded font face.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Font` if the font cannot be loaded.
    async fn face(&self) -> Result<Arc<dyn FontFace>, MediaError>;
}

/// Loads a font file on first use and caches the parsed face for the life
/// of the process. A failed load is retried on the next call.
pub struct FileFontProvider {
    path: PathBuf,
    face: OnceCell<Arc<dyn FontFace>>,
}

impl FileFontProvider {
    /// Create a provider for the font at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            face: OnceCell::new(),
        }
    }
}

#[async_trait]
impl FontProvider for FileFontProvider {
    async fn face(&self) -> Result<Arc<dyn FontFace>, MediaError> {
        let face = self
            .face
            .get_or_try_init(|| async {
                let bytes = tokio::fs::read(&self.path)
                    .await
                    .map_err(|e| MediaError::Font(format!("{}: {e}", self.path.display())))?;
                let face = AbGlyphFace::from_bytes(bytes)?;
                info!(path = %self.path.display(), "caption font loaded");
                Ok::<Arc<dyn FontFace>, MediaError>(Arc::new(face))
            })
            .await?;
        Ok(Arc::clone(face))
    }
}

/// Hands out a face that is already loaded.
pub struct StaticFontProvider(pub Arc<dyn FontFace>);

#[async_trait]
impl FontProvider for StaticFontProvider {
    async fn face(&self) -> Result<Arc<dyn FontFace>, MediaError> {
        Ok(Arc::clone(&self.0))
    }
}

/// Fixed-metric face for tests: every glyph advances half the size, lines
/// are exactly `size` tall, and glyphs draw as solid boxes.
#[cfg(test)]
pub(crate) struct BoxFace;

#[cfg(test)]
impl FontFace for BoxFace {
    fn advance(&self, _ch: char, size: f32) -> f32 {
        size * 0.5
    }

    fn ascent(&self, size: f32) -> f32 {
        size * 0.8
    }

    fn line_height(&self, size: f32) -> f32 {
        size
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw_char(&self, ch: char, size: f32, x: f32, baseline: f32, canvas: &mut RgbaImage) {
        if ch.is_whitespace() {
            return;
        }
        let (left, right) = (x.round() as i64, (x + size * 0.4).round() as i64);
        let (top, bottom) = ((baseline - size * 0.7).round() as i64, baseline.round() as i64);
        for py in top..bottom {
            for px in left..right {
                blend_ink(canvas, px, py, 1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn test_blend_ink_darkens_and_ignores_out_of_bounds() {
        // Arrange
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));

        // Act
        blend_ink(&mut canvas, 0, 0, 1.0);
        blend_ink(&mut canvas, 1, 1, 0.5);
        blend_ink(&mut canvas, -1, 0, 1.0);
        blend_ink(&mut canvas, 5, 5, 1.0);

        // Assert
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([128, 128, 128, 255]));
        assert_eq!(canvas.get_pixel(1, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_invalid_font_bytes_are_rejected() {
        let result = AbGlyphFace::from_bytes(b"definitely not a font".to_vec());

        assert!(matches!(result, Err(MediaError::Font(_))));
    }

    #[tokio::test]
    async fn test_missing_font_file_is_font_error() {
        let provider = FileFontProvider::new("/nonexistent/sketchrelay/font.ttf");

        let result = provider.face().await;

        match result {
            Err(MediaError::Font(msg)) => assert!(msg.contains("font.ttf")),
            Err(other) => panic!("expected Font error, got {other:?}"),
            Ok(_) => panic!("expected Font error, got a face"),
        }
    }

    #[tokio::test]
    async fn test_static_provider_returns_same_face() {
        let face: Arc<dyn FontFace> = Arc::new(BoxFace);
        let provider = StaticFontProvider(Arc::clone(&face));

        let first = provider.face().await.unwrap();

        assert!(Arc::ptr_eq(&first, &face));
        assert!((first.advance('x', 20.0) - 10.0).abs() < f32::EPSILON);
    }
}
