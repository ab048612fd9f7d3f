//! Caption layout: greedy word wrap at the largest size that fits.

use crate::config::CompositorConfig;
use crate::error::MediaError;
use crate::font::FontFace;

/// One wrapped line of caption text.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// The words of the line joined by single spaces.
    pub text: String,
    /// Advance width of `text`.
    pub width: f32,
}

/// A caption wrapped at a size where it fits the usable area.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionLayout {
    /// Chosen font size in pixels.
    pub size: u32,
    /// Wrapped lines, top to bottom.
    pub lines: Vec<Line>,
    /// Distance between consecutive baselines.
    pub line_height: f32,
    /// Distance from the top of a line to its baseline.
    pub ascent: f32,
}

impl CaptionLayout {
    /// Total height of the wrapped block.
    #[must_use]
    pub fn block_height(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let count = self.lines.len() as f32;
        count * self.line_height
    }
}

fn text_width(text: &str, face: &dyn FontFace, size: f32) -> f32 {
    text.chars().map(|ch| face.advance(ch, size)).sum()
}

/// Greedily packs `words` into lines no wider than `max_width`. Returns
/// `None` if a single word is wider than `max_width`.
fn wrap(words: &[&str], face: &dyn FontFace, size: f32, max_width: f32) -> Option<Vec<Line>> {
    let space = face.advance(' ', size);
    let mut lines: Vec<Line> = Vec::new();
    let mut current: Option<Line> = None;

    for word in words {
        let word_width = text_width(word, face, size);
        if word_width > max_width {
            return None;
        }
        current = Some(match current.take() {
            Some(mut line) if line.width + space + word_width <= max_width => {
                line.text.push(' ');
                line.text.push_str(word);
                line.width += space + word_width;
                line
            }
            Some(line) => {
                lines.push(line);
                Line {
                    text: (*word).to_owned(),
                    width: word_width,
                }
            }
            None => Line {
                text: (*word).to_owned(),
                width: word_width,
            },
        });
    }
    lines.extend(current);
    Some(lines)
}

/// Lays out `text` at the largest configured size whose wrapped block fits
/// inside the frame minus its margins.
///
/// # Errors
///
/// Returns `MediaError::CaptionOverflow` if no size down to the configured
/// minimum fits.
pub fn fit_caption(
    text: &str,
    face: &dyn FontFace,
    config: &CompositorConfig,
) -> Result<CaptionLayout, MediaError> {
    let extent = config.usable_extent();
    let words: Vec<&str> = text.split_whitespace().collect();

    for size in config.font_sizes() {
        #[allow(clippy::cast_precision_loss)]
        let px = size as f32;
        let Some(lines) = wrap(&words, face, px, extent) else {
            continue;
        };
        let layout = CaptionLayout {
            size,
            lines,
            line_height: face.line_height(px),
            ascent: face.ascent(px),
        };
        if layout.block_height() <= extent {
            return Ok(layout);
        }
    }
    Err(MediaError::CaptionOverflow {
        min_size: config.min_font_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BoxFace;

    fn config() -> CompositorConfig {
        CompositorConfig {
            frame_size: 200,
            margin: 10,
            max_font_size: 40,
            min_font_size: 10,
            font_size_step: 10,
            ..CompositorConfig::default()
        }
    }

    fn words(count: usize) -> String {
        vec!["abcdefgh"; count].join(" ")
    }

    #[test]
    fn test_short_caption_uses_max_size() {
        let layout = fit_caption("a cat", &BoxFace, &config()).unwrap();

        assert_eq!(layout.size, 40);
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.lines[0].text, "a cat");
    }

    #[test]
    fn test_caption_fitting_only_at_minimum_size() {
        // Arrange
        let text = words(20);

        // Act
        let layout = fit_caption(&text, &BoxFace, &config()).unwrap();

        // Assert
        assert_eq!(layout.size, 10);
        assert_eq!(layout.lines.len(), 5);
        assert!(layout.lines.iter().all(|l| l.width <= 180.0));
        assert!((layout.lines[0].width - 175.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overlong_caption_overflows() {
        let result = fit_caption(&words(80), &BoxFace, &config());

        assert!(matches!(
            result,
            Err(MediaError::CaptionOverflow { min_size: 10 })
        ));
    }

    #[test]
    fn test_word_wider_than_frame_overflows() {
        let result = fit_caption(&"w".repeat(100), &BoxFace, &config());

        assert!(matches!(result, Err(MediaError::CaptionOverflow { .. })));
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let layout = fit_caption("  two \n words ", &BoxFace, &config()).unwrap();

        assert_eq!(layout.lines[0].text, "two words");
    }

    #[test]
    fn test_empty_caption_has_no_lines() {
        let layout = fit_caption("", &BoxFace, &config()).unwrap();

        assert!(layout.lines.is_empty());
        assert!(layout.block_height().abs() < f32::EPSILON);
    }
}
