use anyhow::{bail, Context, Result};
use clap::Parser;
use cutout::{
    parse_color, CompositeConfig, FileSink, FileSource, OutputMode, Pipeline, PrecomputedMatte,
    RunOutcome, SegmentationModel,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photo to process
    input: PathBuf,

    /// Where to write the result (format from extension)
    #[arg(short, long, default_value = "cutout.png")]
    output: PathBuf,

    /// Grayscale matte to use as the segmentation result (white = foreground)
    #[arg(long, conflicts_with = "model")]
    mask: Option<PathBuf>,

    /// Path to segmentation model (ONNX file, needs the `onnx` feature)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Model input width
    #[arg(long, default_value_t = 256)]
    model_width: u32,

    /// Model input height
    #[arg(long, default_value_t = 256)]
    model_height: u32,

    /// Confidence a pixel must exceed to be kept
    #[arg(long, default_value_t = cutout::config::DEFAULT_THRESHOLD)]
    threshold: f32,

    /// Background fill: white, black, transparent, #RRGGBB or #RRGGBBAA
    #[arg(long, default_value = "white")]
    background: String,

    /// Write the matte (grayscale confidence) instead of the composite
    #[arg(long)]
    show_matte: bool,

    /// Composite on a single thread
    #[arg(long)]
    sequential: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Cutout starting");

    let config = CompositeConfig::default()
        .with_threshold(args.threshold)
        .with_background(parse_color(&args.background).context("Invalid --background")?)
        .with_parallel(!args.sequential)
        .with_mode(if args.show_matte {
            OutputMode::MatteOnly
        } else {
            OutputMode::Composite
        });
    tracing::info!(
        "Threshold: {}, background: {:?}",
        config.threshold,
        config.background.0
    );

    let model = create_model(&args)?;
    tracing::info!("Segmentation source: {}", model.name());

    let pipeline = Arc::new(Pipeline::new(model, config).context("Invalid configuration")?);
    let source = FileSource::new(&args.input);
    let sink = FileSink::new(&args.output).context("Failed to prepare output")?;

    let handle = pipeline.spawn(Box::new(source), Box::new(sink));

    // Ctrl+C withdraws the request; a late model result is discarded
    let token = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling run");
            token.cancel();
        }
    });

    let outcome = handle
        .join()
        .await
        .with_context(|| format!("Failed to process {}", args.input.display()))?;

    match outcome {
        RunOutcome::Presented {
            width,
            height,
            foreground_pixels,
        } => {
            let total = width as u64 * height as u64;
            tracing::info!(
                "Done: {}x{}, {:.1}% foreground",
                width,
                height,
                foreground_pixels as f64 * 100.0 / total as f64
            );
        }
        RunOutcome::Cancelled => {
            tracing::info!("Cancelled, nothing written");
        }
    }

    Ok(())
}

fn create_model(args: &Args) -> Result<Box<dyn SegmentationModel>> {
    if let Some(mask) = &args.mask {
        return Ok(Box::new(PrecomputedMatte::new(mask)));
    }

    match &args.model {
        Some(path) => load_onnx(path, args.model_width, args.model_height),
        None => bail!("No segmentation source: pass --mask or --model"),
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path, width: u32, height: u32) -> Result<Box<dyn SegmentationModel>> {
    let model = cutout::OnnxSegmenter::new(path, width, height)
        .context("Failed to load segmentation model")?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path, _width: u32, _height: u32) -> Result<Box<dyn SegmentationModel>> {
    bail!(
        "Cannot load {}: built without the `onnx` feature",
        path.display()
    )
}
