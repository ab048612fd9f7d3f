//! Fixed 256-colour palette and Floyd–Steinberg reduction.
//!
//! The palette is a 6×6×6 colour cube followed by 40 greys, so every frame
//! of every animation shares one colour table.

use std::ops::RangeInclusive;

use image::imageops::{ColorMap, dither};
use image::{Rgba, RgbaImage};

const CUBE_STEP: u8 = 51;
const CUBE_LEVELS: usize = 6;
const CUBE_SIZE: usize = CUBE_LEVELS * CUBE_LEVELS * CUBE_LEVELS;
const GREY_COUNT: usize = 40;

/// Number of entries in the palette.
pub const PALETTE_SIZE: usize = CUBE_SIZE + GREY_COUNT;

/// The shared animation palette.
#[derive(Debug, Clone)]
pub struct FixedPalette {
    colors: Vec<[u8; 3]>,
}

impl Default for FixedPalette {
    fn default() -> Self {
        Self::new()
    }
}

fn grey_level(i: usize) -> u8 {
    // Evenly spaced strictly between black and white, which the cube has.
    u8::try_from((i * 255 + (GREY_COUNT + 1) / 2) / (GREY_COUNT + 1)).unwrap_or(u8::MAX)
}

fn cube_level(channel: u8) -> usize {
    (usize::from(channel) + usize::from(CUBE_STEP / 2)) / usize::from(CUBE_STEP)
}

/// Grey indices (1-based) around the mean of channels summing to `sum`.
fn grey_candidates(sum: usize) -> RangeInclusive<usize> {
    let mean = sum / 3;
    let centre = (mean * (GREY_COUNT + 1) + 127) / 255;
    centre.saturating_sub(1).max(1)..=(centre + 1).min(GREY_COUNT)
}

fn distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = u32::from(x.abs_diff(y));
            d * d
        })
        .sum()
}

impl FixedPalette {
    /// Builds the cube-plus-greys palette.
    #[must_use]
    pub fn new() -> Self {
        let mut colors = Vec::with_capacity(PALETTE_SIZE);
        for r in 0..CUBE_LEVELS {
            for g in 0..CUBE_LEVELS {
                for b in 0..CUBE_LEVELS {
                    colors.push([level(r), level(g), level(b)]);
                }
            }
        }
        for i in 1..=GREY_COUNT {
            let v = grey_level(i);
            colors.push([v, v, v]);
        }
        Self { colors }
    }

    /// All palette entries in index order.
    #[must_use]
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    /// Index of the entry closest to `rgb` in squared RGB distance.
    ///
    /// Cube distance separates per channel, so the nearest cube entry is
    /// the per-channel nearest level. Distance to a grey `v` is
    /// `3 * (v - mean)^2` plus a term independent of `v`, so only the greys
    /// around the channel mean are checked.
    #[must_use]
    pub fn nearest(&self, rgb: [u8; 3]) -> usize {
        let [r, g, b] = rgb.map(cube_level);
        let cube = (r * CUBE_LEVELS + g) * CUBE_LEVELS + b;
        let greys = grey_candidates(rgb.iter().map(|&c| usize::from(c)).sum());

        let mut best = cube;
        let mut best_distance = distance(rgb, self.colors[cube]);
        for i in greys {
            let index = CUBE_SIZE + i - 1;
            let d = distance(rgb, self.colors[index]);
            if d < best_distance {
                best = index;
                best_distance = d;
            }
        }
        best
    }
}

fn level(i: usize) -> u8 {
    u8::try_from(i).map_or(u8::MAX, |i| i * CUBE_STEP)
}

impl ColorMap for FixedPalette {
    type Color = Rgba<u8>;

    fn index_of(&self, color: &Rgba<u8>) -> usize {
        let [r, g, b, _] = color.0;
        self.nearest([r, g, b])
    }

    fn lookup(&self, index: usize) -> Option<Rgba<u8>> {
        self.colors.get(index).map(|&[r, g, b]| Rgba([r, g, b, 255]))
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Rgba<u8>) {
        let [r, g, b] = self.colors[self.index_of(color)];
        *color = Rgba([r, g, b, 255]);
    }
}

/// Reduces `frame` to the fixed palette in place with Floyd–Steinberg error
/// diffusion. The result is fully opaque.
pub fn reduce(frame: &mut RgbaImage, palette: &FixedPalette) {
    dither(frame, palette);
}
