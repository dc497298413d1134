use super::mask::ConfidenceBuffer;
use super::types::SegmentationModel;
use crate::error::{CutoutError, Result};
use crate::loader::PixelBuffer;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};

/// Segmentation "model" that replays a matte computed elsewhere
///
/// The matte is a grayscale image where white is foreground. It is read when
/// `segment` is called, so a missing or corrupt file surfaces as
/// `SegmentationUnavailable` for that run.
pub struct PrecomputedMatte {
    path: PathBuf,
}

impl PrecomputedMatte {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load(path: &Path) -> Result<ConfidenceBuffer<'static>> {
    let matte = image::open(path).map_err(|e| {
        CutoutError::segmentation(format!("failed to read matte {}: {}", path.display(), e))
    })?;
    ConfidenceBuffer::from_luma(&matte.into_luma8())
}

impl SegmentationModel for PrecomputedMatte {
    fn segment<'a>(
        &'a self,
        _image: &'a PixelBuffer,
    ) -> BoxFuture<'a, Result<ConfidenceBuffer<'static>>> {
        let path = self.path.clone();
        async move {
            tracing::debug!("Loading precomputed matte from {}", path.display());
            tokio::task::spawn_blocking(move || load(&path))
                .await
                .map_err(|e| CutoutError::segmentation(format!("matte loader panicked: {}", e)))?
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "precomputed-matte"
    }
}
