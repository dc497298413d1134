use thiserror::Error;

/// Result type alias for the compositing pipeline
pub type Result<T> = std::result::Result<T, CutoutError>;

/// Errors that can occur while producing a composite
///
/// Every stage fails fast with one of these; the orchestrator hands the first
/// one back to its caller and nothing reaches the display sink.
#[derive(Error, Debug)]
pub enum CutoutError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// `byte_len` is set when the mask came from a raw transport buffer
    #[error(
        "Confidence buffer has {}, expected {width}x{height} values",
        describe_mask_len(.len, .byte_len)
    )]
    MaskSizeMismatch {
        width: u32,
        height: u32,
        len: usize,
        byte_len: Option<usize>,
    },

    #[error("Invalid dimensions {width}x{height}: both must be at least 1")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Image is {image:?} but mask is {mask:?}")]
    DimensionMismatch { image: (u32, u32), mask: (u32, u32) },

    #[error("Segmentation unavailable: {0}")]
    SegmentationUnavailable(String),

    #[error("Image source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Display sink rejected result: {0}")]
    Sink(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A spawned run or one of its blocking stages panicked or was aborted
    #[error("Pipeline task aborted: {0}")]
    Aborted(String),
}

impl CutoutError {
    pub fn segmentation<S: Into<String>>(msg: S) -> Self {
        Self::SegmentationUnavailable(msg.into())
    }

    pub fn source_unreadable<S: Into<String>>(msg: S) -> Self {
        Self::SourceUnreadable(msg.into())
    }

    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Self::Sink(msg.into())
    }

    pub fn aborted(err: tokio::task::JoinError) -> Self {
        Self::Aborted(err.to_string())
    }
}

fn describe_mask_len(len: &usize, byte_len: &Option<usize>) -> String {
    match byte_len {
        Some(bytes) => format!("{} bytes", bytes),
        None => format!("{} values", len),
    }
}

impl From<image::ImageError> for CutoutError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}
