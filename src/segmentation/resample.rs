use crate::error::{CutoutError, Result};
use crate::loader::PixelBuffer;
use image::imageops::{self, FilterType};

/// Resize a source image to the mask resolution
///
/// The target aspect ratio may differ from the source; the image is
/// stretched to fill it exactly. Smooth filters keep the foreground edge
/// from going jagged once the mask cuts through it.
pub fn resize(
    image: &PixelBuffer,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<PixelBuffer> {
    let _span = tracing::debug_span!("resample", target_width, target_height).entered();

    if target_width == 0 || target_height == 0 {
        return Err(CutoutError::InvalidDimensions {
            width: target_width,
            height: target_height,
        });
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CutoutError::InvalidDimensions { width, height });
    }

    // If dimensions match, no resize needed
    if (width, height) == (target_width, target_height) {
        return Ok(image.clone());
    }

    tracing::debug!(
        "Resizing {}x{} -> {}x{} with {:?}",
        width,
        height,
        target_width,
        target_height,
        filter
    );

    Ok(imageops::resize(image, target_width, target_height, filter))
}
