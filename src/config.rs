use crate::error::{CutoutError, Result};
use image::imageops::FilterType;
use image::Rgba;

/// Confidence above which a pixel counts as foreground
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Fill written to background pixels
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// What the pipeline hands to the display sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Foreground kept, background flattened
    #[default]
    Composite,
    /// Grayscale rendering of the confidence buffer
    MatteOnly,
}

/// Compositing parameters
///
/// The threshold and fill color are presentation choices rather than
/// properties of the model, so both are configurable.
#[derive(Debug, Clone, Copy)]
pub struct CompositeConfig {
    /// Strict lower bound on confidence for a pixel to be kept
    pub threshold: f32,
    /// Color written to background pixels
    pub background: Rgba<u8>,
    /// Filter used when resizing the source to the mask resolution
    pub filter: FilterType,
    /// Split rows across the rayon pool for large images
    pub parallel: bool,
    pub mode: OutputMode,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            background: DEFAULT_BACKGROUND,
            filter: FilterType::Triangle,
            parallel: true,
            mode: OutputMode::Composite,
        }
    }
}

impl CompositeConfig {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_background(mut self, background: Rgba<u8>) -> Self {
        self.background = background;
        self
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject thresholds outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(CutoutError::InvalidConfig(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Parse a background color
///
/// Accepts `white`, `black`, `transparent`, `#RRGGBB` and `#RRGGBBAA`.
pub fn parse_color(input: &str) -> Result<Rgba<u8>> {
    let value = input.trim().to_ascii_lowercase();
    match value.as_str() {
        "white" => return Ok(Rgba([255, 255, 255, 255])),
        "black" => return Ok(Rgba([0, 0, 0, 255])),
        "transparent" => return Ok(Rgba([0, 0, 0, 0])),
        _ => {}
    }

    let hex = value
        .strip_prefix('#')
        .ok_or_else(|| CutoutError::InvalidConfig(format!("unknown color '{}'", input)))?;

    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(CutoutError::InvalidConfig(format!(
            "expected #RRGGBB or #RRGGBBAA, got '{}'",
            input
        )));
    }

    let mut channels = [255u8; 4];
    for (i, channel) in channels.iter_mut().enumerate().take(hex.len() / 2) {
        *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| CutoutError::InvalidConfig(format!("invalid hex color '{}'", input)))?;
    }

    Ok(Rgba(channels))
}
