//! Caption frame rendering.

use image::{Rgba, RgbaImage};

use crate::config::CompositorConfig;
use crate::error::MediaError;
use crate::font::FontFace;
use crate::layout::{CaptionLayout, fit_caption};

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Renders `text` as black, centred lines on a white square frame.
///
/// # Errors
///
/// Returns `MediaError::CaptionOverflow` if the text does not fit at any
/// configured size.
pub fn render_caption(
    text: &str,
    face: &dyn FontFace,
    config: &CompositorConfig,
) -> Result<RgbaImage, MediaError> {
    render_caption_on(text, face, config, PAPER)
}

/// Like [`render_caption`] but on a custom background.
///
/// # Errors
///
/// Returns `MediaError::CaptionOverflow` if the text does not fit at any
/// configured size.
pub fn render_caption_on(
    text: &str,
    face: &dyn FontFace,
    config: &CompositorConfig,
    background: Rgba<u8>,
) -> Result<RgbaImage, MediaError> {
    let layout = fit_caption(text, face, config)?;
    let mut canvas = RgbaImage::from_pixel(config.frame_size, config.frame_size, background);
    draw_layout(&layout, face, config, &mut canvas);
    Ok(canvas)
}

fn draw_layout(
    layout: &CaptionLayout,
    face: &dyn FontFace,
    config: &CompositorConfig,
    canvas: &mut RgbaImage,
) {
    let extent = config.usable_extent();
    #[allow(clippy::cast_precision_loss)]
    let (margin, size) = (config.margin as f32, layout.size as f32);
    let top = margin + (extent - layout.block_height()) / 2.0;

    let mut baseline = top + layout.ascent;
    for line in &layout.lines {
        let mut x = margin + (extent - line.width) / 2.0;
        for ch in line.text.chars() {
            face.draw_char(ch, size, x, baseline, canvas);
            x += face.advance(ch, size);
        }
        baseline += layout.line_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BoxFace;

    fn config() -> CompositorConfig {
        CompositorConfig {
            frame_size: 100,
            margin: 10,
            max_font_size: 20,
            min_font_size: 10,
            font_size_step: 10,
            ..CompositorConfig::default()
        }
    }

    fn inked_bounds(canvas: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if pixel.0[0] < 128 {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
                });
            }
        }
        bounds
    }

    #[test]
    fn test_caption_is_centred_on_white_frame() {
        // Act
        let canvas = render_caption("ab", &BoxFace, &config()).unwrap();

        // Assert
        assert_eq!(canvas.dimensions(), (100, 100));
        assert_eq!(canvas.get_pixel(0, 0), &PAPER);
        let (left, top, right, bottom) = inked_bounds(&canvas).unwrap();
        // Two 10px-wide advances centred in 80px: text spans x 40..60.
        assert_eq!(left, 40);
        assert!(right < 60);
        // One 20px line centred in 80px: line spans y 40..60.
        assert!(top >= 40 && bottom < 60);
    }

    #[test]
    fn test_caption_fitting_only_at_minimum_size_renders_inside_margins() {
        // Arrange: at 20px each word needs its own line and five lines
        // overflow the 80px extent; at 10px they fit.
        let text = vec!["abcdefgh"; 5].join(" ");
        assert_eq!(fit_caption(&text, &BoxFace, &config()).unwrap().size, 10);

        // Act
        let canvas = render_caption(&text, &BoxFace, &config()).unwrap();

        // Assert
        assert_eq!(canvas.dimensions(), (100, 100));
        let (left, top, right, bottom) = inked_bounds(&canvas).expect("caption has ink");
        assert!(left >= 10 && top >= 10);
        assert!(right < 90 && bottom < 90);
        // Five 10px lines centred in 80px start at y 25.
        assert_eq!(left, 30);
        assert!(top >= 25 && bottom >= 65);
    }

    #[test]
    fn test_overflowing_caption_is_an_error() {
        let text = vec!["abcdefghij"; 30].join(" ");

        let result = render_caption(&text, &BoxFace, &config());

        assert!(matches!(result, Err(MediaError::CaptionOverflow { .. })));
    }

    #[test]
    fn test_custom_background_is_used() {
        let grey = Rgba([200, 200, 200, 255]);

        let canvas = render_caption_on("", &BoxFace, &config(), grey).unwrap();

        assert!(canvas.pixels().all(|p| *p == grey));
    }
}
