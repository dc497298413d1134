pub mod mask;
mod matte;
#[cfg(feature = "onnx")]
mod onnx;
pub mod resample;
pub mod types;

pub use mask::{ByteOrder, ConfidenceBuffer};
pub use matte::PrecomputedMatte;
#[cfg(feature = "onnx")]
pub use onnx::{to_input_tensor, OnnxSegmenter};
pub use types::SegmentationModel;
