mod colormap;
mod render;

use anyhow::{Context, Result};
use bioheat_common::SimulationResult;
use clap::Parser;
use env_logger::Builder;
use image::RgbaImage;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use rayon::prelude::*;
use render::{encode_gif, temperature_range, FrameRenderer};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input run record (.json, .bin or .msgpack)
    #[arg(short, long)]
    input: PathBuf,

    /// Output animation path (.gif)
    #[arg(short, long, default_value = "thermal_sim.gif")]
    output: PathBuf,

    /// Optional PNG of the final temperature and damage maps
    #[arg(long)]
    final_png: Option<PathBuf>,

    /// Pixels per grid cell
    #[arg(long, default_value_t = 4)]
    scale: u32,

    /// Delay between animation frames, milliseconds
    #[arg(long, default_value_t = 200)]
    frame_delay_ms: u32,
}

/// Reads a run record, picking the decoder from the file extension.
fn load_result(path: &Path) -> Result<SimulationResult> {
    let file = File::open(path).with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let reader = BufReader::new(file);
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let result = match extension.as_str() {
        "json" => serde_json::from_reader(reader).context("Failed to parse JSON run record")?,
        "msgpack" => rmp_serde::from_read(reader).context("Failed to parse MessagePack run record")?,
        _ => bincode::deserialize_from(reader).context("Failed to parse bincode run record")?,
    };
    Ok(result)
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger; ignore a second init when called from tests
    let _ = Builder::from_default_env().filter(None, LevelFilter::Info).try_init();

    info!("Starting Bioheat Visualizer...");
    info!("Input file: {}", args.input.display());
    info!("Output animation: {}", args.output.display());

    let result = load_result(&args.input)?;
    let meta = &result.metadata;
    info!(
        "Loaded {} run: {}x{} cells, {} steps, {} snapshots",
        meta.tissue_type,
        meta.grid_size,
        meta.grid_size,
        meta.steps,
        result.snapshots.len()
    );
    if let Some(instability) = &result.instability {
        warn!(
            "Run diverged from step {}; colors are scaled to [{:.3e}, {:.3e}] °C.",
            instability.step, instability.min_temperature, instability.max_temperature
        );
    }

    let range = temperature_range(&result);
    info!("Temperature color range: {:.3} to {:.3} °C", range.min, range.max);
    let renderer = FrameRenderer::new(args.scale, range);

    if result.snapshots.is_empty() {
        warn!("Input file contains no snapshots. Skipping animation.");
    } else {
        // Set up progress bar
        let progress_bar = ProgressBar::new(result.snapshots.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );

        let start_time = Instant::now();
        let frames: Vec<RgbaImage> = result
            .snapshots
            .par_iter()
            .progress_with(progress_bar.clone())
            .map(|snapshot| renderer.render(&snapshot.temperature, &snapshot.damage_fraction))
            .collect();
        progress_bar.finish_and_clear();
        info!("Rendered {} frames in {:.2} s", frames.len(), start_time.elapsed().as_secs_f64());

        let file = File::create(&args.output)
            .with_context(|| format!("Failed to create output file: {}", args.output.display()))?;
        encode_gif(BufWriter::new(file), frames, args.frame_delay_ms)
            .with_context(|| format!("Failed to encode GIF: {}", args.output.display()))?;
        info!("Animation saved to: {}", args.output.display());
    }

    if let Some(png_path) = &args.final_png {
        let image = renderer.render(&result.final_temperature, &result.final_damage_fraction);
        image
            .save(png_path)
            .with_context(|| format!("Failed to save final PNG: {}", png_path.display()))?;
        info!("Final maps saved to: {}", png_path.display());
    }

    Ok(())
}
