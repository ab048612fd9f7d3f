//! Looping GIF encoding.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::error::MediaError;
use crate::palette::{FixedPalette, reduce};

/// One animation frame and how long it is shown.
#[derive(Debug, Clone)]
pub struct TimedFrame {
    /// Frame pixels.
    pub image: RgbaImage,
    /// Display time in milliseconds.
    pub delay_ms: u32,
}

/// Reduces every frame to the fixed palette and encodes them, in order, as
/// one infinitely looping GIF held in memory.
///
/// # Errors
///
/// Returns `MediaError::Encode` if the encoder rejects a frame.
pub fn encode_looping_gif(frames: Vec<TimedFrame>) -> Result<Vec<u8>, MediaError> {
    let palette = FixedPalette::new();
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| MediaError::Encode(e.to_string()))?;
        for TimedFrame {
            mut image,
            delay_ms,
        } in frames
        {
            reduce(&mut image, &palette);
            let frame = Frame::from_parts(image, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
            encoder
                .encode_frame(frame)
                .map_err(|e| MediaError::Encode(e.to_string()))?;
        }
    }
    Ok(bytes)
}
