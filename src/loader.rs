use crate::error::{CutoutError, Result};
use image::RgbaImage;

/// Decoded source image, always RGBA8
pub type PixelBuffer = RgbaImage;

/// Decode raw image bytes into an RGBA pixel buffer
///
/// The format is guessed from the leading bytes. Any color depth (grayscale,
/// 16-bit, float, with or without alpha) is normalized to 8-bit RGBA.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer> {
    let _span = tracing::debug_span!("decode", len = bytes.len()).entered();

    let format = image::guess_format(bytes)
        .map_err(|e| CutoutError::Decode(format!("unrecognized image format: {}", e)))?;

    let image = image::load_from_memory_with_format(bytes, format)?;
    tracing::debug!(
        "Decoded {:?} image {}x{} ({:?})",
        format,
        image.width(),
        image.height(),
        image.color()
    );

    if image.width() == 0 || image.height() == 0 {
        return Err(CutoutError::Decode(format!(
            "image has empty dimensions {}x{}",
            image.width(),
            image.height()
        )));
    }

    Ok(image.into_rgba8())
}
