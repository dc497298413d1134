use super::DisplaySink;
use crate::compositor::CompositeResult;
use crate::error::{CutoutError, Result};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

/// Writes the composite to disk, format chosen by file extension
pub struct FileSink {
    path: PathBuf,
    format: ImageFormat,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path).map_err(|e| {
            CutoutError::InvalidConfig(format!("unsupported output {}: {}", path.display(), e))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplaySink for FileSink {
    fn present(&mut self, result: CompositeResult) -> Result<()> {
        let _span = tracing::debug_span!("present").entered();
        let (width, height) = result.dimensions();

        // Formats without an alpha channel get the fill flattened to RGB
        let image = DynamicImage::ImageRgba8(result.into_image());
        let image = match self.format {
            ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Pnm => {
                DynamicImage::ImageRgb8(image.into_rgb8())
            }
            _ => image,
        };

        image
            .save_with_format(&self.path, self.format)
            .map_err(|e| CutoutError::sink(format!("{}: {}", self.path.display(), e)))?;

        tracing::info!("Wrote {}x{} result to {}", width, height, self.path.display());
        Ok(())
    }
}
