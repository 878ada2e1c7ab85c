use crate::config::BoundaryCondition;
use crate::constants::DAMAGE_THRESHOLD_OMEGA;
use crate::field::ScalarField;
use crate::sim_params::SimParams;
use crate::tissue::TissueType;
use serde::{Deserialize, Serialize};

/// Field state captured after a tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Zero-based tick index after which the snapshot was taken.
    pub step: u32,
    /// Simulated time at the end of that tick, seconds.
    pub time_s: f64,
    /// Temperature, °C.
    pub temperature: ScalarField,
    /// Damage fraction `1 - exp(-Ω)` in `[0, 1)`.
    pub damage_fraction: ScalarField,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub mean_temperature: f64,
    pub max_damage_fraction: f64,
    /// Cells whose damage integral reached Ω = 1.
    pub damaged_cells: usize,
}

impl Snapshot {
    pub fn new(step: u32, time_s: f64, temperature: ScalarField, damage_fraction: ScalarField) -> Self {
        let t_stats = temperature.stats();
        let d_stats = damage_fraction.stats();
        let threshold = -(-DAMAGE_THRESHOLD_OMEGA).exp_m1();
        let damaged_cells = damage_fraction.values().iter().filter(|&&f| f >= threshold).count();
        Snapshot {
            step,
            time_s,
            temperature,
            damage_fraction,
            min_temperature: t_stats.min,
            max_temperature: t_stats.max,
            mean_temperature: t_stats.mean,
            max_damage_fraction: d_stats.max,
            damaged_cells,
        }
    }
}

/// Descriptive metadata stored alongside the fields of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub tissue_type: TissueType,
    pub grid_size: usize,
    pub length_m: f64,
    pub dx: f64,
    pub boundary: BoundaryCondition,
    pub time_step_s: f64,
    pub substeps: u32,
    pub steps: u32,
    pub snapshot_interval: u32,
    pub heat_size: usize,
    pub heat_power: f64,
}

impl From<&SimParams> for RunMetadata {
    fn from(params: &SimParams) -> Self {
        RunMetadata {
            tissue_type: params.tissue_type,
            grid_size: params.grid_size,
            length_m: params.length_m,
            dx: params.dx,
            boundary: params.boundary,
            time_step_s: params.time_step_s,
            substeps: params.substeps,
            steps: params.steps,
            snapshot_interval: params.snapshot_interval,
            heat_size: params.heat_size,
            heat_power: params.heat_power,
        }
    }
}

/// First tick at which the temperature field left the plausible band or
/// stopped being finite. Typical cause: a time step above the stability limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericInstability {
    pub step: u32,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub non_finite_cells: usize,
}

/// Complete output of a finished run. Immutable once produced; exporters and
/// renderers only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub metadata: RunMetadata,
    pub snapshots: Vec<Snapshot>,
    pub final_temperature: ScalarField,
    pub final_damage_fraction: ScalarField,
    #[serde(default)]
    pub instability: Option<NumericInstability>,
}

impl SimulationResult {
    pub fn temperature_snapshots(&self) -> impl Iterator<Item = &ScalarField> {
        self.snapshots.iter().map(|s| &s.temperature)
    }

    pub fn damage_snapshots(&self) -> impl Iterator<Item = &ScalarField> {
        self.snapshots.iter().map(|s| &s.damage_fraction)
    }

    /// Splits the result into `(temperature snapshots, damage snapshots,
    /// final temperature, final damage fraction)`.
    pub fn into_parts(self) -> (Vec<ScalarField>, Vec<ScalarField>, ScalarField, ScalarField) {
        let (temperatures, damages) = self
            .snapshots
            .into_iter()
            .map(|s| (s.temperature, s.damage_fraction))
            .unzip();
        (temperatures, damages, self.final_temperature, self.final_damage_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_summaries() {
        let temperature = ScalarField::from_vec(2, vec![37.0, 40.0, 38.0, 41.0]).unwrap();
        let damage = ScalarField::from_vec(2, vec![0.0, 0.2, 0.7, 0.99]).unwrap();
        let snapshot = Snapshot::new(5, 30.0, temperature, damage);
        assert_eq!(snapshot.min_temperature, 37.0);
        assert_eq!(snapshot.max_temperature, 41.0);
        assert_eq!(snapshot.mean_temperature, 39.0);
        assert_eq!(snapshot.max_damage_fraction, 0.99);
        assert_eq!(snapshot.damaged_cells, 2);
    }
}
