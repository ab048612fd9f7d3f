//! Uploaded drawing normalization.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};
use sketchrelay_core::blob::{BlobStore, DRAWING_PREFIX};
use sketchrelay_core::error::DomainError;
use tracing::info;
use uuid::Uuid;

use crate::error::MediaError;

/// Decodes any supported raster, flattens transparency onto white and
/// scales it to a `size` × `size` square.
///
/// # Errors
///
/// Returns `MediaError::Decode` if the bytes are not a supported image.
pub fn decode_square(bytes: &[u8], size: u32) -> Result<RgbaImage, MediaError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| MediaError::Decode(e.to_string()))?;
    let mut rgba = decoded
        .resize_exact(size, size, FilterType::Lanczos3)
        .to_rgba8();
    flatten_onto_white(&mut rgba);
    Ok(rgba)
}

fn flatten_onto_white(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        if a == u8::MAX {
            continue;
        }
        let alpha = u16::from(a);
        let blend = |c: u8| {
            let mixed = (u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255;
            u8::try_from(mixed).unwrap_or(u8::MAX)
        };
        *pixel = Rgba([blend(r), blend(g), blend(b), u8::MAX]);
    }
}

/// Encodes an image as PNG.
///
/// # Errors
///
/// Returns `MediaError::Encode` if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, MediaError> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| MediaError::Encode(e.to_string()))?;
    Ok(bytes.into_inner())
}

/// Decodes, squares and re-encodes an uploaded drawing as PNG.
///
/// # Errors
///
/// Returns `MediaError::Decode` for unreadable input and
/// `MediaError::Encode` if the PNG cannot be produced.
pub fn normalize_drawing(bytes: &[u8], size: u32) -> Result<Vec<u8>, MediaError> {
    encode_png(&decode_square(bytes, size)?)
}

/// Normalizes an uploaded drawing off the async runtime and stores it under
/// `drawings/<uuid>.png`. Returns the blob key.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the upload is not a decodable image
/// and `DomainError::Infrastructure` if it cannot be encoded or stored.
pub async fn store_drawing(
    bytes: Vec<u8>,
    size: u32,
    blobs: &dyn BlobStore,
) -> Result<String, DomainError> {
    let png = tokio::task::spawn_blocking(move || normalize_drawing(&bytes, size))
        .await
        .map_err(|e| MediaError::Task(e.to_string()))??;

    let key = format!("{DRAWING_PREFIX}{}.png", Uuid::new_v4());
    blobs.write(&key, &png).await?;
    info!(key = %key, bytes = png.len(), "drawing stored");
    Ok(key)
}
