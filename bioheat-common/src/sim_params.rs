use crate::config::{BoundaryCondition, StabilityPolicy};
use crate::tissue::{TissueProperties, TissueType};
use serde::{Deserialize, Serialize};

/// Validated runtime parameters derived from a [`SimulationConfig`](crate::SimulationConfig).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Grid
    pub grid_size: usize,
    pub length_m: f64,
    pub dx: f64,
    pub boundary: BoundaryCondition,

    // Time
    pub total_time_s: f64,
    pub time_step_s: f64,
    pub steps: u32,
    /// Explicit sub-steps per tick; 1 unless the substep policy kicked in.
    pub substeps: u32,
    pub substep_dt: f64,
    pub snapshot_interval: u32,
    pub stability: StabilityPolicy,
    /// `dx² · ρc / (4k)` for the selected tissue.
    pub stable_time_step: f64,
    pub exceeds_stability_limit: bool,

    // Material
    pub tissue_type: TissueType,
    pub tissue: TissueProperties,

    // Heat source
    pub heat_size: usize,
    pub heat_power: f64,
}

impl SimParams {
    /// Number of snapshots a complete run records: ticks `0, k, 2k, ...` below `steps`.
    pub fn expected_snapshots(&self) -> usize {
        self.steps.div_ceil(self.snapshot_interval) as usize
    }
}
