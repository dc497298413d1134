use super::mask::ConfidenceBuffer;
use crate::error::Result;
use crate::loader::PixelBuffer;
use futures::future::BoxFuture;

/// Trait for segmentation backends
///
/// Allows swapping between ONNX models, precomputed mattes and test doubles.
pub trait SegmentationModel: Send + Sync {
    /// Estimate per-pixel foreground confidence for an image
    ///
    /// The future resolves exactly once, either to a confidence buffer or to
    /// `SegmentationUnavailable`. The mask may have any resolution; callers
    /// resample the image to match it.
    fn segment<'a>(
        &'a self,
        image: &'a PixelBuffer,
    ) -> BoxFuture<'a, Result<ConfidenceBuffer<'static>>>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

impl<T: SegmentationModel + ?Sized> SegmentationModel for Box<T> {
    fn segment<'a>(
        &'a self,
        image: &'a PixelBuffer,
    ) -> BoxFuture<'a, Result<ConfidenceBuffer<'static>>> {
        (**self).segment(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
