use crate::error::{CutoutError, Result};
use image::{GrayImage, Luma};
use std::borrow::Cow;

/// Byte order of f32 words in a raw mask transport buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Per-pixel foreground confidence produced by a segmentation model
///
/// Values are row-major, one scalar per mask pixel, nominally in [0, 1].
/// The mask resolution is independent of the source image. A buffer built
/// with [`ConfidenceBuffer::borrowed`] reads the caller's slice in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceBuffer<'a> {
    width: u32,
    height: u32,
    values: Cow<'a, [f32]>,
}

impl ConfidenceBuffer<'static> {
    /// Take ownership of a flat confidence vector
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Result<Self> {
        check_len(width, height, values.len())?;
        Ok(Self {
            width,
            height,
            values: Cow::Owned(values),
        })
    }

    /// Decode a transport buffer of 4-byte IEEE floats
    pub fn from_bytes(width: u32, height: u32, bytes: &[u8], order: ByteOrder) -> Result<Self> {
        check_dims(width, height)?;
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if expected != Some(bytes.len()) {
            return Err(CutoutError::MaskSizeMismatch {
                width,
                height,
                len: bytes.len() / 4,
                byte_len: Some(bytes.len()),
            });
        }

        let values = bytes
            .chunks_exact(4)
            .map(|word| {
                let word = [word[0], word[1], word[2], word[3]];
                match order {
                    ByteOrder::Little => f32::from_le_bytes(word),
                    ByteOrder::Big => f32::from_be_bytes(word),
                }
            })
            .collect();

        Self::new(width, height, values)
    }

    /// Read a grayscale matte, mapping 0..=255 onto 0.0..=1.0
    pub fn from_luma(matte: &GrayImage) -> Result<Self> {
        let (width, height) = matte.dimensions();
        let values = matte.pixels().map(|p| p[0] as f32 / 255.0).collect();
        Self::new(width, height, values)
    }
}

impl<'a> ConfidenceBuffer<'a> {
    /// View an existing slice without copying
    pub fn borrowed(width: u32, height: u32, values: &'a [f32]) -> Result<Self> {
        check_len(width, height, values.len())?;
        Ok(Self {
            width,
            height,
            values: Cow::Borrowed(values),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Confidence at (x, y), or `None` outside the mask
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.values.get(idx).copied()
    }

    /// Contiguous confidences for row `y`
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[f32] {
        let start = y as usize * self.width as usize;
        &self.values[start..start + self.width as usize]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Detach from the transport buffer so the mask can outlive it
    pub fn into_owned(self) -> ConfidenceBuffer<'static> {
        ConfidenceBuffer {
            width: self.width,
            height: self.height,
            values: Cow::Owned(self.values.into_owned()),
        }
    }

    /// Grayscale rendering of the confidences
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let idx = y as usize * self.width as usize + x as usize;
            let value = (self.values[idx] * 255.0).clamp(0.0, 255.0) as u8;
            Luma([value])
        })
    }
}

fn check_dims(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(CutoutError::InvalidDimensions { width, height });
    }
    Ok(())
}

fn check_len(width: u32, height: u32, len: usize) -> Result<()> {
    check_dims(width, height)?;
    if (width as usize).checked_mul(height as usize) != Some(len) {
        return Err(CutoutError::MaskSizeMismatch {
            width,
            height,
            len,
            byte_len: None,
        });
    }
    Ok(())
}
