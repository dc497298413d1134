//! Threshold compositing of a resized source image against a confidence mask.

use crate::config::CompositeConfig;
use crate::error::{CutoutError, Result};
use crate::loader::PixelBuffer;
use crate::segmentation::ConfidenceBuffer;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Images smaller than this are composited on the calling thread
pub const PARALLEL_MIN_PIXELS: u64 = 256 * 256;

/// Final image handed to a display sink
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeResult {
    image: RgbaImage,
    foreground_pixels: u64,
}

impl CompositeResult {
    pub fn new(image: RgbaImage, foreground_pixels: u64) -> Self {
        Self {
            image,
            foreground_pixels,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Number of pixels copied from the source
    pub fn foreground_pixels(&self) -> u64 {
        self.foreground_pixels
    }
}

/// Replaces low-confidence pixels with a flat fill
pub struct Compositor {
    threshold: f32,
    background: Rgba<u8>,
    parallel: bool,
}

impl Compositor {
    pub fn new(config: &CompositeConfig) -> Self {
        Self {
            threshold: config.threshold,
            background: config.background,
            parallel: config.parallel,
        }
    }

    /// Keep pixels whose confidence is strictly above the threshold
    ///
    /// `image` must already be at the mask's resolution. A confidence equal
    /// to the threshold, or NaN, is background.
    pub fn composite(&self, image: &PixelBuffer, mask: &ConfidenceBuffer<'_>) -> Result<CompositeResult> {
        let _span = tracing::debug_span!("composite").entered();

        if image.dimensions() != mask.dimensions() {
            return Err(CutoutError::DimensionMismatch {
                image: image.dimensions(),
                mask: mask.dimensions(),
            });
        }

        let (width, height) = image.dimensions();
        let row_len = width as usize * 4;
        let mut output = RgbaImage::new(width, height);
        let src = image.as_raw();

        let fill_row = |(y, out_row): (usize, &mut [u8])| -> u64 {
            let src_row = &src[y * row_len..(y + 1) * row_len];
            let confidences = mask.row(y as u32);
            let mut kept = 0;
            for ((out_px, src_px), &c) in out_row
                .chunks_exact_mut(4)
                .zip(src_row.chunks_exact(4))
                .zip(confidences)
            {
                if c > self.threshold {
                    out_px.copy_from_slice(src_px);
                    kept += 1;
                } else {
                    out_px.copy_from_slice(&self.background.0);
                }
            }
            kept
        };

        let buffer: &mut [u8] = &mut output;
        let pixels = width as u64 * height as u64;
        let foreground_pixels: u64 = if self.parallel && pixels >= PARALLEL_MIN_PIXELS {
            buffer.par_chunks_mut(row_len).enumerate().map(fill_row).sum()
        } else {
            buffer.chunks_mut(row_len).enumerate().map(fill_row).sum()
        };

        tracing::debug!(
            "Composited {}x{}: {} of {} pixels foreground",
            width,
            height,
            foreground_pixels,
            pixels
        );

        Ok(CompositeResult::new(output, foreground_pixels))
    }
}
