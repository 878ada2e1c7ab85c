use anyhow::{Context, Result};
use bioheat_common::{SimulationConfig, StabilityPolicy};
use bioheat_engine::export::export_run;
use bioheat_engine::{run_with, TickProgress};
use clap::Parser;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

/// Bioheat conduction and thermal damage simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML run configuration
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Tissue type override (muscle, fat, skin)
    #[arg(long)]
    tissue: Option<String>,

    /// Total simulated time override, seconds
    #[arg(long)]
    total_time: Option<f64>,

    /// Time step override, seconds
    #[arg(long)]
    time_step: Option<f64>,

    /// Heat source edge length override, cells
    #[arg(long)]
    heat_size: Option<usize>,

    /// Heat source power override, W/m³
    #[arg(long)]
    heat_power: Option<f64>,

    /// Stability policy override (warn, ignore, reject, substep)
    #[arg(long, value_parser = StabilityPolicy::from_str)]
    stability: Option<StabilityPolicy>,

    /// Output directory override
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = if args.config.exists() {
        SimulationConfig::load(&args.config)
            .with_context(|| format!("Failed to load configuration from '{}'", args.config.display()))?
    } else {
        warn!("Config file '{}' not found; using the reference configuration.", args.config.display());
        SimulationConfig::default()
    };

    if let Some(tissue) = &args.tissue {
        config.tissue.tissue_type = tissue.clone();
    }
    if let Some(total_time) = args.total_time {
        config.timing.total_time_s = total_time;
    }
    if let Some(time_step) = args.time_step {
        config.timing.time_step_s = time_step;
    }
    if let Some(heat_size) = args.heat_size {
        config.heat_source.size_cells = heat_size;
    }
    if let Some(heat_power) = args.heat_power {
        config.heat_source.power_w_per_m3 = heat_power;
    }
    if let Some(stability) = args.stability {
        config.timing.stability = stability;
    }
    if let Some(dir) = &args.output_dir {
        config.output.directory = dir.display().to_string();
    }
    Ok(config)
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    let args = Args::parse();
    info!("Starting Bioheat Simulation Engine...");

    // --- Load Configuration ---
    let config = load_config(&args)?;
    let params = config.get_sim_params().context("Invalid simulation configuration")?;
    info!("Using {} Rayon threads.", rayon::current_num_threads());
    debug!("Simulation Parameters: {:#?}", params);

    // --- Simulation Loop ---
    let start_time = Instant::now();
    let mut previous_print_time = start_time;
    let print_interval_secs = 5.0;
    let on_tick = |progress: &TickProgress| {
        let now = Instant::now();
        if now.duration_since(previous_print_time).as_secs_f64() >= print_interval_secs {
            info!(
                "Step [{}/{}] ({:.1} s) | Elapsed: {:.2} s",
                progress.step + 1,
                progress.total_steps,
                progress.time_s,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = now;
        }
    };
    let result = run_with(config.clone(), on_tick, None).context("Simulation failed")?;

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds ({} steps, {} snapshots).",
        total_duration.as_secs_f64(),
        result.metadata.steps,
        result.snapshots.len()
    );
    if let Some(instability) = &result.instability {
        warn!(
            "Temperature field diverged from step {} on (T in [{:.3e}, {:.3e}] °C). Consider a smaller time step or --stability substep.",
            instability.step, instability.min_temperature, instability.max_temperature
        );
    }
    let final_stats = result.final_temperature.stats();
    let damage_stats = result.final_damage_fraction.stats();
    info!(
        "Final state: T in [{:.3}, {:.3}] °C, max damage fraction {:.4}",
        final_stats.min, final_stats.max, damage_stats.max
    );

    // --- Save Recorded Data ---
    info!("Saving recorded data...");
    let written = export_run(&result, &config.output)?;
    for path in &written {
        debug!("Wrote {}", path.display());
    }

    info!("Simulation Complete.");
    Ok(())
}
