//! Background flattening for segmented photos.
//!
//! A segmentation model scores every pixel of a photo with a foreground
//! confidence. This crate takes that confidence buffer and the original
//! image, resamples the image to the mask resolution, and flattens every
//! pixel the model is not confident about to a solid fill.
//!
//! ```no_run
//! use cutout::{CompositeConfig, FileSink, FileSource, Pipeline, PrecomputedMatte};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pipeline = Pipeline::new(PrecomputedMatte::new("matte.png"), CompositeConfig::default())?;
//! let source = FileSource::new("photo.jpg");
//! let sink = FileSink::new("cutout.png")?;
//! pipeline.run(source, sink, &CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod compositor;
pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod segmentation;

pub use capture::{FileSource, ImageSource, MemorySource};
pub use compositor::{CompositeResult, Compositor};
pub use config::{parse_color, CompositeConfig, OutputMode};
pub use error::{CutoutError, Result};
pub use loader::{decode, PixelBuffer};
pub use output::{DisplaySink, FileSink};
pub use pipeline::{Pipeline, RunHandle, RunOutcome};
#[cfg(feature = "onnx")]
pub use segmentation::OnnxSegmenter;
pub use segmentation::{ByteOrder, ConfidenceBuffer, PrecomputedMatte, SegmentationModel};
