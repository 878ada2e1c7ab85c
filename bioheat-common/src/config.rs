use crate::constants::{
    DEFAULT_DOMAIN_LENGTH_M, DEFAULT_GRID_SIZE, DEFAULT_SNAPSHOT_INTERVAL, SUBSTEP_SAFETY_FACTOR,
};
use crate::error::ConfigError;
use crate::sim_params::SimParams;
use crate::tissue::TissueType;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Edge treatment for the diffusion stencil.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryCondition {
    /// Indices wrap around, so heat leaving one edge enters the opposite one.
    /// Physically approximate but matches the reference model.
    #[default]
    Periodic,
    /// Zero-flux edges: a missing neighbour takes the value of the cell itself.
    Insulated,
}

/// What to do when `time_step_s` exceeds the explicit stability limit.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StabilityPolicy {
    /// Run as configured and log a warning.
    #[default]
    Warn,
    /// Run as configured, silently.
    Ignore,
    /// Fail validation.
    Reject,
    /// Split every tick into equal sub-steps below the limit.
    Substep,
}

impl FromStr for StabilityPolicy {
    type Err = serde::de::value::Error;

    /// Parses the same lowercase names the TOML `stability` key accepts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        StabilityPolicy::deserialize(name.as_str().into_deserializer())
    }
}

// Spatial domain
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct GridConfig {
    /// Cells per side (N).
    pub size: usize,
    /// Side length of the square domain, metres (L).
    pub length_m: f64,
    pub boundary: BoundaryCondition,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct TimingConfig {
    pub total_time_s: f64,
    pub time_step_s: f64,
    /// A snapshot is recorded on every tick whose index is a multiple of this.
    pub snapshot_interval_steps: u32,
    pub stability: StabilityPolicy,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct TissueConfig {
    /// Tissue selector, matched case-insensitively (muscle, fat, skin).
    pub tissue_type: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct HeatSourceConfig {
    /// Edge length of the centered square source, in cells.
    pub size_cells: usize,
    /// Volumetric power density inside the source, W/m³.
    pub power_w_per_m3: f64,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub base_filename: String,
    /// Save the full run record (snapshots included).
    pub save_result: bool,
    /// Save final temperature and damage maps as CSV.
    pub save_final_csv: bool,
    /// Write a column-index header row in the CSV maps.
    pub csv_header: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

/// Top-level run configuration, loadable from `config.toml`.
///
/// Every section is optional; missing values fall back to the reference
/// configuration (100×100 cells over 5 cm of muscle, 60 s in 5 s steps,
/// 10-cell source at 10 kW/m³).
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub timing: TimingConfig,
    pub tissue: TissueConfig,
    pub heat_source: HeatSourceConfig,
    pub output: OutputConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            size: DEFAULT_GRID_SIZE,
            length_m: DEFAULT_DOMAIN_LENGTH_M,
            boundary: BoundaryCondition::Periodic,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            total_time_s: 60.0,
            time_step_s: 5.0,
            snapshot_interval_steps: DEFAULT_SNAPSHOT_INTERVAL,
            stability: StabilityPolicy::Warn,
        }
    }
}

impl Default for TissueConfig {
    fn default() -> Self {
        TissueConfig { tissue_type: TissueType::Muscle.as_str().to_string() }
    }
}

impl Default for HeatSourceConfig {
    fn default() -> Self {
        HeatSourceConfig { size_cells: 10, power_w_per_m3: 10_000.0 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: ".".to_string(),
            base_filename: "thermal_sim".to_string(),
            save_result: true,
            save_final_csv: true,
            csv_header: false,
            format: None,
        }
    }
}

impl SimulationConfig {
    /// Builds a configuration from the five core run parameters, keeping the
    /// reference grid and default output settings.
    pub fn new(
        tissue_type: &str,
        total_time_s: f64,
        time_step_s: f64,
        heat_size_cells: usize,
        heat_power_w_per_m3: f64,
    ) -> Self {
        SimulationConfig {
            timing: TimingConfig { total_time_s, time_step_s, ..TimingConfig::default() },
            tissue: TissueConfig { tissue_type: tissue_type.to_string() },
            heat_source: HeatSourceConfig {
                size_cells: heat_size_cells,
                power_w_per_m3: heat_power_w_per_m3,
            },
            ..SimulationConfig::default()
        }
    }

    pub fn with_grid(mut self, size: usize, length_m: f64) -> Self {
        self.grid.size = size;
        self.grid.length_m = length_m;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryCondition) -> Self {
        self.grid.boundary = boundary;
        self
    }

    pub fn with_stability(mut self, stability: StabilityPolicy) -> Self {
        self.timing.stability = stability;
        self
    }

    pub fn with_snapshot_interval(mut self, steps: u32) -> Self {
        self.timing.snapshot_interval_steps = steps;
        self
    }

    /// Loads and validates the configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let config_str = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&config_str)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(s)?;
        config.get_sim_params()?;
        Ok(config)
    }

    /// Validates the configuration and derives the runtime parameters.
    pub fn get_sim_params(&self) -> Result<SimParams, ConfigError> {
        let n = self.grid.size;
        if n == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        let length_m = require_positive("grid.length_m", self.grid.length_m)?;
        let total_time_s = require_positive("timing.total_time_s", self.timing.total_time_s)?;
        let time_step_s = require_positive("timing.time_step_s", self.timing.time_step_s)?;
        if time_step_s > total_time_s {
            return Err(ConfigError::TimeStepExceedsTotal {
                time_step: time_step_s,
                total_time: total_time_s,
            });
        }
        if self.timing.snapshot_interval_steps == 0 {
            return Err(ConfigError::ZeroSnapshotInterval);
        }
        let heat_power = self.heat_source.power_w_per_m3;
        if !heat_power.is_finite() {
            return Err(ConfigError::NonFinite { field: "heat_source.power_w_per_m3" });
        }

        let tissue_type: TissueType = self.tissue.tissue_type.parse()?;
        let tissue = tissue_type.properties();

        let raw_steps = (total_time_s / time_step_s).floor();
        if raw_steps > u32::MAX as f64 {
            return Err(ConfigError::TooManySteps(raw_steps));
        }
        let steps = raw_steps as u32;

        let dx = length_m / n as f64;
        let stable_time_step = tissue.stable_time_step(dx);
        let exceeds_stability_limit = time_step_s > stable_time_step;

        let substeps = match self.timing.stability {
            StabilityPolicy::Reject if exceeds_stability_limit => {
                return Err(ConfigError::UnstableTimeStep {
                    time_step: time_step_s,
                    limit: stable_time_step,
                });
            }
            StabilityPolicy::Substep if exceeds_stability_limit => {
                let count = (time_step_s / (SUBSTEP_SAFETY_FACTOR * stable_time_step)).ceil();
                if count > u32::MAX as f64 {
                    return Err(ConfigError::TooManySteps(count));
                }
                (count as u32).max(1)
            }
            _ => 1,
        };

        Ok(SimParams {
            grid_size: n,
            length_m,
            dx,
            boundary: self.grid.boundary,
            total_time_s,
            time_step_s,
            steps,
            substeps,
            substep_dt: time_step_s / substeps as f64,
            snapshot_interval: self.timing.snapshot_interval_steps,
            stability: self.timing.stability,
            stable_time_step,
            exceeds_stability_limit,
            tissue_type,
            tissue,
            heat_size: self.heat_source.size_cells,
            heat_power,
        })
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(value)
}
