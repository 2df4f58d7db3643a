use anyhow::{Context, Result};
use clap::Parser;
use region_color::core_modules::color_format::{
    ChannelFormat, RgbFormat, format_channel, format_rgb,
};
use region_color::{ColorEngine, ComputeOutcome, ComputeRequest, EngineConfig, PixelBuffer, Polygon};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "color_sampler")]
#[command(about = "Compute the RMS average color of an image or of polygons drawn over it")]
struct Cli {
    /// Image to sample.
    image: PathBuf,

    /// JSON file with an array of polygons: `[{"id": "a", "points": [{"x": 0, "y": 0}, ...]}]`.
    /// Without it the whole image is sampled.
    #[arg(long)]
    polygons: Option<PathBuf>,

    /// Number of worker threads. Defaults to the number of logical CPUs.
    #[arg(long)]
    workers: Option<usize>,

    /// Output format for the color: hex, css or blender.
    #[arg(long, default_value_t = RgbFormat::Hex)]
    format: RgbFormat,

    /// Also print each channel, as int (0-255) or float (0-1).
    #[arg(long)]
    channels: Option<ChannelFormat>,

    /// Convert from sRGB to linear light before formatting.
    #[arg(long)]
    linear: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn setup_logging(base_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(base_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logger initialization failed: {e}"))
}

fn load_pixels(path: &Path) -> Result<PixelBuffer> {
    let image = image::open(path)
        .with_context(|| format!("failed to open image '{}'", path.display()))?;
    Ok(PixelBuffer::from_rgba_image(&image.to_rgba8()))
}

fn load_polygons(path: &Path) -> Result<Vec<Polygon>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read polygons '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse polygons '{}'", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    let pixels = Arc::new(load_pixels(&cli.image)?);
    let polygons = match &cli.polygons {
        Some(path) => load_polygons(path)?,
        None => Vec::new(),
    };
    let name = cli
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let engine = ColorEngine::new(EngineConfig {
        worker_count: cli.workers,
    })?;
    info!(
        image = %cli.image.display(),
        width = pixels.width(),
        height = pixels.height(),
        polygons = polygons.len(),
        workers = engine.worker_count(),
        "sampling"
    );

    let color = match engine.compute(ComputeRequest::new(name, pixels, polygons)).await? {
        ComputeOutcome::Color(color) => color,
        ComputeOutcome::NoResult => {
            println!("no pixels selected");
            return Ok(());
        }
    };

    println!("{}: {}", color.name, format_rgb(&color, cli.format, cli.linear));
    if let Some(channel_format) = cli.channels {
        let [r, g, b] = color.channels().map(|c| format_channel(c, channel_format, cli.linear));
        println!("r {r}\ng {g}\nb {b}");
    }
    Ok(())
}
