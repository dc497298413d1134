use super::mask::ConfidenceBuffer;
use super::types::SegmentationModel;
use crate::error::{CutoutError, Result};
use crate::loader::PixelBuffer;
use futures::future::BoxFuture;
use futures::FutureExt;
use image::imageops::{self, FilterType};
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Portrait segmentation model run through ONNX Runtime
///
/// Expects a single `[1, 3, H, W]` float input in [0, 1] and reads the first
/// output as a `[1, 1, H', W']` foreground confidence map. The returned
/// mask keeps the model's output resolution.
pub struct OnnxSegmenter {
    session: Arc<Mutex<Session>>,
    width: u32,
    height: u32,
}

fn ort_err<E: std::fmt::Display>(err: E) -> CutoutError {
    CutoutError::segmentation(err.to_string())
}

impl OnnxSegmenter {
    /// Load a model from an ONNX file
    ///
    /// `width` x `height` is the model's input resolution; frames are
    /// resized to it before inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let path = model_path.as_ref();
        if width == 0 || height == 0 {
            return Err(CutoutError::InvalidDimensions { width, height });
        }

        tracing::info!("Loading segmentation model from {}", path.display());

        let session = Session::builder()
            .map_err(ort_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_err)?
            .with_intra_threads(4)
            .map_err(ort_err)?
            .commit_from_file(path)
            .map_err(|e| {
                CutoutError::segmentation(format!(
                    "failed to load model from {}: {}",
                    path.display(),
                    e
                ))
            })?;

        tracing::info!("Segmentation model loaded ({}x{} input)", width, height);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            width,
            height,
        })
    }

    pub fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn infer(session: &Mutex<Session>, input: Array4<f32>) -> Result<ConfidenceBuffer<'static>> {
        let _span = tracing::debug_span!("inference").entered();

        let mut session = session
            .lock()
            .map_err(|_| CutoutError::segmentation("model session poisoned"))?;
        let outputs = session
            .run(ort::inputs![TensorRef::from_array_view(input.view()).map_err(ort_err)?])
            .map_err(ort_err)?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(ort_err)?;
        let dims: &[i64] = shape;
        if dims.len() < 2 {
            return Err(CutoutError::segmentation(format!(
                "unexpected output shape {:?}",
                dims
            )));
        }

        let height = u32::try_from(dims[dims.len() - 2]).map_err(ort_err)?;
        let width = u32::try_from(dims[dims.len() - 1]).map_err(ort_err)?;
        tracing::debug!("Model produced {}x{} mask", width, height);

        ConfidenceBuffer::new(width, height, data.to_vec())
    }
}

/// Resize to the model input and lay out as a normalized NCHW tensor
///
/// Returns: Array4<f32> with shape [1, 3, height, width]
pub fn to_input_tensor(image: &PixelBuffer, width: u32, height: u32) -> Array4<f32> {
    let _span = tracing::debug_span!("preprocess").entered();

    let resized = if image.dimensions() != (width, height) {
        imageops::resize(image, width, height, FilterType::Triangle)
    } else {
        image.clone()
    };

    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        tensor[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        tensor[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }

    tensor
}

impl SegmentationModel for OnnxSegmenter {
    fn segment<'a>(
        &'a self,
        image: &'a PixelBuffer,
    ) -> BoxFuture<'a, Result<ConfidenceBuffer<'static>>> {
        async move {
            let input = to_input_tensor(image, self.width, self.height);
            let session = Arc::clone(&self.session);
            tokio::task::spawn_blocking(move || Self::infer(&session, input))
                .await
                .map_err(|e| CutoutError::segmentation(format!("inference task failed: {}", e)))?
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
