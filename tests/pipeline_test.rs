use cutout::{
    CompositeConfig, CompositeResult, ConfidenceBuffer, CutoutError, DisplaySink, FileSource,
    ImageSource, MemorySource, Pipeline, PixelBuffer, RunOutcome, SegmentationModel,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

const RED: [u8; 4] = [255, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Returns a fixed mask, optionally after being released
struct FixedMask {
    mask: ConfidenceBuffer<'static>,
    gate: Option<Arc<Notify>>,
}

impl FixedMask {
    fn new(mask: ConfidenceBuffer<'static>) -> Self {
        Self { mask, gate: None }
    }

    fn gated(mask: ConfidenceBuffer<'static>, gate: Arc<Notify>) -> Self {
        Self {
            mask,
            gate: Some(gate),
        }
    }
}

impl SegmentationModel for FixedMask {
    fn segment<'a>(
        &'a self,
        _image: &'a PixelBuffer,
    ) -> BoxFuture<'a, cutout::Result<ConfidenceBuffer<'static>>> {
        async move {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(self.mask.clone())
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct Exploding;

impl SegmentationModel for Exploding {
    fn segment<'a>(
        &'a self,
        _image: &'a PixelBuffer,
    ) -> BoxFuture<'a, cutout::Result<ConfidenceBuffer<'static>>> {
        async { panic!("model crashed") }.boxed()
    }

    fn name(&self) -> &str {
        "exploding"
    }
}

struct Unavailable;

impl SegmentationModel for Unavailable {
    fn segment<'a>(
        &'a self,
        _image: &'a PixelBuffer,
    ) -> BoxFuture<'a, cutout::Result<ConfidenceBuffer<'static>>> {
        async { Err(CutoutError::segmentation("model not ready")) }.boxed()
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    presented: Arc<Mutex<Vec<CompositeResult>>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.presented.lock().unwrap().len()
    }

    fn take(&self) -> Vec<CompositeResult> {
        std::mem::take(&mut *self.presented.lock().unwrap())
    }
}

impl DisplaySink for RecordingSink {
    fn present(&mut self, result: CompositeResult) -> cutout::Result<()> {
        self.presented.lock().unwrap().push(result);
        Ok(())
    }
}

struct BrokenSource;

impl ImageSource for BrokenSource {
    fn read_bytes(&mut self) -> cutout::Result<Vec<u8>> {
        Err(CutoutError::source_unreadable("permission denied"))
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}

fn quadrant_mask() -> ConfidenceBuffer<'static> {
    let values = (0..4u32)
        .flat_map(|y| (0..4u32).map(move |x| if x < 2 && y < 2 { 1.0 } else { 0.0 }))
        .collect();
    ConfidenceBuffer::new(4, 4, values).unwrap()
}

#[tokio::test]
async fn red_quadrant_survives_on_white() {
    let pipeline = Pipeline::new(FixedMask::new(quadrant_mask()), CompositeConfig::default()).unwrap();
    let source = MemorySource::new(png(&RgbaImage::from_pixel(4, 4, Rgba(RED))));
    let sink = RecordingSink::default();

    let outcome = pipeline
        .run(source, sink.clone(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Presented {
            width: 4,
            height: 4,
            foreground_pixels: 4
        }
    );

    let results = sink.take();
    assert_eq!(results.len(), 1);
    for (x, y, pixel) in results[0].image().enumerate_pixels() {
        let expected = if x < 2 && y < 2 { RED } else { WHITE };
        assert_eq!(pixel.0, expected, "pixel ({}, {})", x, y);
    }
}

#[tokio::test]
async fn source_resized_to_smaller_mask() {
    let pipeline = Pipeline::new(FixedMask::new(quadrant_mask()), CompositeConfig::default()).unwrap();
    let bytes = png(&RgbaImage::from_pixel(64, 48, Rgba(RED)));

    let result = pipeline.process(bytes).await.unwrap();
    assert_eq!(result.dimensions(), (4, 4));
    assert_eq!(result.image().get_pixel(0, 0).0, RED);
    assert_eq!(result.image().get_pixel(3, 3).0, WHITE);
}

#[tokio::test]
async fn undecodable_bytes_never_reach_sink() {
    let pipeline = Pipeline::new(FixedMask::new(quadrant_mask()), CompositeConfig::default()).unwrap();
    let source = MemorySource::new(b"GIF89a but not really".to_vec());
    let sink = RecordingSink::default();

    let err = pipeline
        .run(source, sink.clone(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CutoutError::Decode(_)));
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn unreadable_source_is_reported() {
    let pipeline = Pipeline::new(FixedMask::new(quadrant_mask()), CompositeConfig::default()).unwrap();
    let sink = RecordingSink::default();

    let err = pipeline
        .run(BrokenSource, sink.clone(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CutoutError::SourceUnreadable(_)));

    let missing = FileSource::new("/nonexistent/cutout/input.png");
    let err = pipeline
        .run(missing, sink.clone(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CutoutError::SourceUnreadable(_)));
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn segmentation_failure_is_propagated() {
    let pipeline = Pipeline::new(Unavailable, CompositeConfig::default()).unwrap();
    let source = MemorySource::new(png(&RgbaImage::from_pixel(4, 4, Rgba(RED))));
    let sink = RecordingSink::default();

    let err = pipeline
        .run(source, sink.clone(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CutoutError::SegmentationUnavailable(_)));
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn cancelled_run_drops_pending_result() {
    let gate = Arc::new(Notify::new());
    let pipeline = Arc::new(
        Pipeline::new(
            FixedMask::gated(quadrant_mask(), Arc::clone(&gate)),
            CompositeConfig::default(),
        )
        .unwrap(),
    );
    let source = MemorySource::new(png(&RgbaImage::from_pixel(4, 4, Rgba(RED))));
    let sink = RecordingSink::default();

    let handle = Arc::clone(&pipeline).spawn(Box::new(source), Box::new(sink.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.cancel();
    gate.notify_one();

    assert_eq!(handle.join().await.unwrap(), RunOutcome::Cancelled);
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn released_run_presents_once() {
    let gate = Arc::new(Notify::new());
    let pipeline = Arc::new(
        Pipeline::new(
            FixedMask::gated(quadrant_mask(), Arc::clone(&gate)),
            CompositeConfig::default(),
        )
        .unwrap(),
    );
    let source = MemorySource::new(png(&RgbaImage::from_pixel(4, 4, Rgba(RED))));
    let sink = RecordingSink::default();

    let handle = pipeline.spawn(Box::new(source), Box::new(sink.clone()));
    // notify_one stores a permit if the model is not waiting yet
    gate.notify_one();

    assert!(matches!(
        handle.join().await.unwrap(),
        RunOutcome::Presented { width: 4, height: 4, .. }
    ));
    assert_eq!(sink.count(), 1);
}

#[tokio::test]
async fn pre_cancelled_token_skips_everything() {
    let pipeline = Pipeline::new(FixedMask::new(quadrant_mask()), CompositeConfig::default()).unwrap();
    let sink = RecordingSink::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = pipeline.run(BrokenSource, sink.clone(), &cancel).await.unwrap();
    assert_eq!(outcome, RunOutcome::Cancelled);
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn panicking_run_reports_aborted() {
    let pipeline = Arc::new(Pipeline::new(Exploding, CompositeConfig::default()).unwrap());
    let source = MemorySource::new(png(&RgbaImage::from_pixel(4, 4, Rgba(RED))));
    let sink = RecordingSink::default();

    let handle = pipeline.spawn(Box::new(source), Box::new(sink.clone()));
    let err = handle.join().await.unwrap_err();
    assert!(matches!(err, CutoutError::Aborted(_)));
    assert_eq!(sink.count(), 0);
}
