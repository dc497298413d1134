use crate::capture::ImageSource;
use crate::compositor::{CompositeResult, Compositor};
use crate::config::{CompositeConfig, OutputMode};
use crate::error::{CutoutError, Result};
use crate::loader::{self, PixelBuffer};
use crate::output::DisplaySink;
use crate::segmentation::{resample, ConfidenceBuffer, SegmentationModel};
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// How a run ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The sink received the result
    Presented {
        width: u32,
        height: u32,
        foreground_pixels: u64,
    },
    /// The request was withdrawn; nothing reached the sink
    Cancelled,
}

/// Load, segment, resample and composite one photo
///
/// Holds no per-run state, so one pipeline can serve concurrent runs. Every
/// CPU or I/O bound stage runs on the blocking pool; only the model call is
/// awaited on the async worker.
pub struct Pipeline<M> {
    model: M,
    config: CompositeConfig,
}

impl<M: SegmentationModel> Pipeline<M> {
    pub fn new(model: M, config: CompositeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Produce the composite for already-read image bytes
    pub async fn process(&self, bytes: Vec<u8>) -> Result<CompositeResult> {
        let image = tokio::task::spawn_blocking(move || loader::decode(&bytes))
            .await
            .map_err(CutoutError::aborted)??;
        let mask = self.segment(&image).await?;

        let config = self.config;
        tokio::task::spawn_blocking(move || finish(&config, &image, &mask))
            .await
            .map_err(CutoutError::aborted)?
    }

    /// Read `source`, build the composite and hand it to `sink`
    ///
    /// The first failing stage aborts the run and its error is returned; the
    /// sink only ever sees a complete result. When `cancel` fires while the
    /// model is working, its eventual result is dropped.
    pub async fn run<S, D>(
        &self,
        mut source: S,
        mut sink: D,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome>
    where
        S: ImageSource + 'static,
        D: DisplaySink + 'static,
    {
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        tracing::info!("Processing image from {}", source.describe());

        let start = Instant::now();
        let image = tokio::task::spawn_blocking(move || {
            let bytes = source.read_bytes()?;
            loader::decode(&bytes)
        })
        .await
        .map_err(CutoutError::aborted)??;
        let decode_time = start.elapsed();

        let segment_start = Instant::now();
        let mask = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Run cancelled during segmentation, dropping result");
                return Ok(RunOutcome::Cancelled);
            }
            mask = self.segment(&image) => mask?,
        };
        let segment_time = segment_start.elapsed();

        let config = self.config;
        let token = cancel.clone();
        let composite_start = Instant::now();
        let presented = tokio::task::spawn_blocking(move || {
            let result = finish(&config, &image, &mask)?;

            // The requester may have gone away while we were compositing
            if token.is_cancelled() {
                return Ok(None);
            }

            let (width, height) = result.dimensions();
            let foreground_pixels = result.foreground_pixels();
            sink.present(result)?;
            Ok::<_, CutoutError>(Some((width, height, foreground_pixels)))
        })
        .await
        .map_err(CutoutError::aborted)??;
        let composite_time = composite_start.elapsed();

        let Some((width, height, foreground_pixels)) = presented else {
            tracing::info!("Run cancelled before presenting, dropping result");
            return Ok(RunOutcome::Cancelled);
        };

        tracing::info!(
            "Presented {}x{}: decode={:.1}ms, segment={:.1}ms, composite={:.1}ms",
            width,
            height,
            decode_time.as_secs_f64() * 1000.0,
            segment_time.as_secs_f64() * 1000.0,
            composite_time.as_secs_f64() * 1000.0
        );

        Ok(RunOutcome::Presented {
            width,
            height,
            foreground_pixels,
        })
    }

    /// Start a run on the tokio runtime
    pub fn spawn(
        self: Arc<Self>,
        source: Box<dyn ImageSource>,
        sink: Box<dyn DisplaySink>,
    ) -> RunHandle
    where
        M: 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(source, sink, &token).await });

        RunHandle { cancel, task }
    }

    async fn segment(&self, image: &PixelBuffer) -> Result<ConfidenceBuffer<'static>> {
        self.model
            .segment(image)
            .instrument(tracing::debug_span!("segment", model = self.model.name()))
            .await
    }
}

/// Resample to the mask and composite, or render the matte
fn finish(
    config: &CompositeConfig,
    image: &PixelBuffer,
    mask: &ConfidenceBuffer<'_>,
) -> Result<CompositeResult> {
    match config.mode {
        OutputMode::Composite => {
            let resized = resample::resize(image, mask.width(), mask.height(), config.filter)?;
            debug_assert_eq!(
                resized.dimensions(),
                mask.dimensions(),
                "resampled image must match the mask"
            );
            Compositor::new(config).composite(&resized, mask)
        }
        OutputMode::MatteOnly => {
            let matte = DynamicImage::ImageLuma8(mask.to_luma()).into_rgba8();
            let foreground = mask
                .as_slice()
                .iter()
                .filter(|&&c| c > config.threshold)
                .count();
            Ok(CompositeResult::new(matte, foreground as u64))
        }
    }
}

/// Handle to a spawned run
pub struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<RunOutcome>>,
}

impl RunHandle {
    /// Withdraw the request; a pending model result will be discarded
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end
    pub async fn join(self) -> Result<RunOutcome> {
        self.task.await.map_err(CutoutError::aborted)?
    }
}
