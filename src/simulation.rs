use crate::damage::accumulate_damage;
use crate::diffusion::pennes_step;
use crate::grid::Grid;
use crate::state::ThermalState;
use bioheat_common::constants::{MAX_PLAUSIBLE_TEMPERATURE_C, MIN_PLAUSIBLE_TEMPERATURE_C};
use bioheat_common::{
    NumericInstability, RunMetadata, SimParams, SimulationConfig, SimulationError, SimulationResult,
    Snapshot, StabilityPolicy,
};
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle of a single run. Runs are single-shot: once completed or
/// cancelled a simulation cannot be stepped again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Per-tick progress report handed to the run callback.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickProgress {
    /// Zero-based index of the tick that just finished.
    pub step: u32,
    pub total_steps: u32,
    pub time_s: f64,
    pub max_temperature: f64,
    pub snapshot_recorded: bool,
}

/// Drives the coupled diffusion/damage solver over the configured number of ticks.
pub struct ThermalSimulation {
    /// The simulation configuration the run was built from.
    pub config: SimulationConfig,
    params: SimParams,
    state: ThermalState,
    status: SimStatus,
    /// Number of completed ticks.
    current_time_step: u32,
    /// Snapshots taken so far, in tick order.
    recorded_snapshots: Vec<Snapshot>,
    instability: Option<NumericInstability>,
}

impl ThermalSimulation {
    /// Validates `config` and allocates baseline fields. No ticks are run.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        let params = config.get_sim_params()?;
        let grid = Grid::new(params.grid_size, params.length_m)?;

        if params.exceeds_stability_limit && params.stability == StabilityPolicy::Warn {
            warn!(
                "Time step {} s exceeds the explicit stability limit {:.4e} s for {}; the temperature field may diverge.",
                params.time_step_s, params.stable_time_step, params.tissue_type
            );
        }
        if params.substeps > 1 {
            info!(
                "Splitting each {} s tick into {} sub-steps of {:.4e} s.",
                params.time_step_s, params.substeps, params.substep_dt
            );
        }

        let state = ThermalState::new(grid, &params);
        Ok(Self {
            config,
            params,
            state,
            status: SimStatus::Idle,
            current_time_step: 0,
            recorded_snapshots: Vec::new(),
            instability: None,
        })
    }

    /// Advances the simulation by one tick: diffusion, then damage from the
    /// updated temperature, then the divergence check and snapshot cadence.
    pub fn step(&mut self) -> Result<(), SimulationError> {
        match self.status {
            SimStatus::Completed | SimStatus::Cancelled => return Err(SimulationError::AlreadyCompleted),
            SimStatus::Idle => {
                self.status = SimStatus::Running;
                self.recorded_snapshots.reserve(self.params.expected_snapshots());
            }
            SimStatus::Running => {}
        }

        let dt = self.params.substep_dt;
        for _ in 0..self.params.substeps {
            // --- 1. Diffusion (parallel rows, read current / write next) ---
            pennes_step(
                &self.state.grid,
                self.params.boundary,
                &self.params.tissue,
                &self.state.source,
                self.state.temperature.values(),
                self.state.temperature_next.values_mut(),
                dt,
            );
            // --- Swap Buffers: Output becomes Input for damage and the next step ---
            self.state.swap_buffers();

            // --- 2. Damage from the post-step temperature ---
            accumulate_damage(self.state.damage.values_mut(), self.state.temperature.values(), dt);
        }

        let step = self.current_time_step;
        self.check_stability(step);

        if step % self.params.snapshot_interval == 0 {
            self.record_snapshot();
        }

        self.current_time_step += 1;
        if self.current_time_step >= self.params.steps {
            self.status = SimStatus::Completed;
        }
        Ok(())
    }

    /// Runs every remaining tick, invoking `on_tick` after each one and
    /// checking `cancel` between ticks.
    pub fn run<F>(&mut self, mut on_tick: F, cancel: Option<&AtomicBool>) -> Result<(), SimulationError>
    where
        F: FnMut(&TickProgress),
    {
        let total_steps = self.params.steps;
        info!(
            "Starting {} run: {} steps of {} s on a {}x{} grid.",
            self.params.tissue_type, total_steps, self.params.time_step_s, self.params.grid_size,
            self.params.grid_size
        );

        while self.status != SimStatus::Completed {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                self.status = SimStatus::Cancelled;
                info!("Simulation cancelled after {} of {} steps.", self.current_time_step, total_steps);
                return Err(SimulationError::Cancelled { completed_steps: self.current_time_step });
            }

            let snapshots_before = self.recorded_snapshots.len();
            self.step()?;
            let step = self.current_time_step - 1;

            let progress = TickProgress {
                step,
                total_steps,
                time_s: self.current_time_step as f64 * self.params.time_step_s,
                max_temperature: self.state.temperature.stats().max,
                snapshot_recorded: self.recorded_snapshots.len() > snapshots_before,
            };
            if progress.snapshot_recorded {
                info!(
                    "Step [{}/{}] ({:.1} s) | Max T: {:.3} °C | Snapshots: {}",
                    step + 1,
                    total_steps,
                    progress.time_s,
                    progress.max_temperature,
                    self.recorded_snapshots.len()
                );
            } else {
                trace!("Step [{}/{}] completed", step + 1, total_steps);
            }
            on_tick(&progress);
        }
        Ok(())
    }

    /// Copies the current fields into a new snapshot.
    fn record_snapshot(&mut self) {
        let step = self.current_time_step;
        let snapshot = Snapshot::new(
            step,
            (step + 1) as f64 * self.params.time_step_s,
            self.state.temperature.clone(),
            self.state.damage_fraction_field(),
        );
        debug!(
            "Snapshot at step {}: T in [{:.3}, {:.3}] °C, max damage {:.3e}, damaged cells {}",
            step, snapshot.min_temperature, snapshot.max_temperature, snapshot.max_damage_fraction,
            snapshot.damaged_cells
        );
        self.recorded_snapshots.push(snapshot);
    }

    /// Flags the first tick whose temperature field is non-finite or leaves
    /// the plausible band. The run continues either way.
    fn check_stability(&mut self, step: u32) {
        if self.instability.is_some() {
            return;
        }
        let stats = self.state.temperature.stats();
        let out_of_band = stats.min < MIN_PLAUSIBLE_TEMPERATURE_C || stats.max > MAX_PLAUSIBLE_TEMPERATURE_C;
        if stats.non_finite > 0 || out_of_band {
            warn!(
                "Numeric instability at step {}: T in [{:.3e}, {:.3e}] °C, {} non-finite cells.",
                step, stats.min, stats.max, stats.non_finite
            );
            self.instability = Some(NumericInstability {
                step,
                min_temperature: stats.min,
                max_temperature: stats.max,
                non_finite_cells: stats.non_finite,
            });
        }
    }

    /// Consumes a completed simulation and returns its result.
    ///
    /// The final fields are the state after the last tick. When the last tick
    /// is not on the snapshot cadence they are newer than the last snapshot
    /// (tick 11 of a 12-tick run with interval 5 only appears here).
    pub fn into_result(self) -> Result<SimulationResult, SimulationError> {
        if self.status != SimStatus::Completed {
            return Err(SimulationError::NotCompleted {
                completed_steps: self.current_time_step,
                total_steps: self.params.steps,
            });
        }
        let final_damage_fraction = self.state.damage_fraction_field();
        Ok(SimulationResult {
            metadata: RunMetadata::from(&self.params),
            snapshots: self.recorded_snapshots,
            final_temperature: self.state.temperature,
            final_damage_fraction,
            instability: self.instability,
        })
    }

    pub fn status(&self) -> SimStatus {
        self.status
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn state(&self) -> &ThermalState {
        &self.state
    }

    pub fn current_step(&self) -> u32 {
        self.current_time_step
    }

    pub fn get_recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    pub fn instability(&self) -> Option<&NumericInstability> {
        self.instability.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{run, run_with};
    use approx::assert_relative_eq;
    use bioheat_common::constants::{BODY_TEMPERATURE_C, MAX_DAMAGE_FRACTION};
    use bioheat_common::{BoundaryCondition, ScalarField};

    fn reference_config(tissue: &str) -> SimulationConfig {
        SimulationConfig::new(tissue, 60.0, 5.0, 10, 10_000.0)
    }

    /// Small grid with a time step well inside the stability limit.
    fn stable_config(steps: u32) -> SimulationConfig {
        // dx = 1 mm, muscle limit 1.89 s
        SimulationConfig::new("muscle", steps as f64, 1.0, 6, 5.0e5).with_grid(24, 0.024)
    }

    #[test]
    fn snapshot_count_matches_cadence() {
        for (total, interval) in [(12.0, 5), (10.0, 5), (1.0, 5), (7.0, 1), (9.0, 4)] {
            let config = SimulationConfig::new("muscle", total, 1.0, 4, 1.0e4)
                .with_grid(10, 0.01)
                .with_snapshot_interval(interval);
            let result = run(config).unwrap();
            let steps = total as u32;
            let expected = steps.div_ceil(interval) as usize;
            assert_eq!(result.snapshots.len(), expected);
            assert_eq!(result.temperature_snapshots().count(), result.damage_snapshots().count());
            for (k, snapshot) in result.snapshots.iter().enumerate() {
                assert_eq!(snapshot.step, k as u32 * interval);
            }
        }
    }

    #[test]
    fn reference_run_records_three_snapshots() {
        let result = run(reference_config("muscle")).unwrap();
        assert_eq!(result.metadata.steps, 12);
        assert_eq!(result.snapshots.len(), 3);
        let steps: Vec<u32> = result.snapshots.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![0, 5, 10]);
        assert_eq!(result.snapshots[1].time_s, 30.0);
    }

    #[test]
    fn damage_never_decreases() {
        let mut sim = ThermalSimulation::new(stable_config(30)).unwrap();
        let mut previous = sim.state().damage.clone();
        while sim.status() != SimStatus::Completed {
            sim.step().unwrap();
            let current = &sim.state().damage;
            for (now, before) in current.values().iter().zip(previous.values()) {
                assert!(now >= before);
            }
            previous = current.clone();
        }
        let result = sim.into_result().unwrap();
        for pair in result.snapshots.windows(2) {
            for (later, earlier) in pair[1].damage_fraction.values().iter().zip(pair[0].damage_fraction.values()) {
                assert!(later >= earlier);
            }
        }
    }

    #[test]
    fn no_source_keeps_baseline() {
        let config = SimulationConfig::new("skin", 100.0, 1.0, 10, 0.0).with_grid(20, 0.02);
        let result = run(config).unwrap();
        assert!(result.final_temperature.values().iter().all(|&t| t == BODY_TEMPERATURE_C));
        for snapshot in &result.snapshots {
            assert_eq!(snapshot.max_temperature, BODY_TEMPERATURE_C);
            assert_eq!(snapshot.min_temperature, BODY_TEMPERATURE_C);
        }
    }

    #[test]
    fn temperature_field_is_point_symmetric() {
        let mut sim = ThermalSimulation::new(stable_config(20)).unwrap();
        let grid = sim.state().grid;
        let n = grid.size();
        while sim.status() != SimStatus::Completed {
            sim.step().unwrap();
            let field = &sim.state().temperature;
            for i in 0..n {
                for j in 0..n {
                    let (ri, rj) = grid.point_reflection(i, j);
                    assert_relative_eq!(field.get(i, j), field.get(ri, rj), max_relative = 1e-14);
                }
            }
        }
    }

    #[test]
    fn damage_fraction_is_bounded() {
        // Hot enough to saturate the center within the run
        let config = SimulationConfig::new("muscle", 30.0, 1.0, 6, 5.0e7).with_grid(24, 0.024);
        let result = run(config).unwrap();
        let check = |field: &ScalarField| {
            assert!(field.values().iter().all(|&f| (0.0..1.0).contains(&f)));
        };
        check(&result.final_damage_fraction);
        result.damage_snapshots().for_each(check);
        assert!(result.final_damage_fraction.get(12, 12) > 0.99);
    }

    #[test]
    fn reference_scenario_first_step() {
        let mut sim = ThermalSimulation::new(reference_config("muscle")).unwrap();
        sim.step().unwrap();
        let t = &sim.state().temperature;
        assert!(t.get(50, 50) > BODY_TEMPERATURE_C);
        assert!((t.get(0, 0) - BODY_TEMPERATURE_C).abs() < 1e-9);
        assert_relative_eq!(
            t.get(50, 50),
            BODY_TEMPERATURE_C + 1.0e4 * 5.0 / (1050.0 * 3600.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn reference_scenario_is_flagged_unstable() {
        // 5 s steps are ~10x above the 0.47 s limit on a 0.5 mm grid
        let result = run(reference_config("muscle")).unwrap();
        let instability = result.instability.expect("divergence should be flagged");
        assert!(instability.step < 12);
        assert!(instability.min_temperature < -273.15 || instability.max_temperature > 1000.0);
        // The far corner has not been reached by the oscillation yet
        assert_eq!(result.final_temperature.get(0, 0), BODY_TEMPERATURE_C);
    }

    #[test]
    fn reference_scenario_heats_center_with_substeps() {
        let config = reference_config("muscle").with_stability(StabilityPolicy::Substep);
        let result = run(config).unwrap();
        assert!(result.instability.is_none());
        let t = &result.final_temperature;
        assert!(t.get(50, 50) > BODY_TEMPERATURE_C);
        assert!(t.get(50, 50) < BODY_TEMPERATURE_C + 1.0);
        assert!((t.get(0, 0) - BODY_TEMPERATURE_C).abs() < 1e-9);
    }

    #[test]
    fn fat_retains_more_heat_than_muscle() {
        let peak = |tissue: &str| {
            let config = reference_config(tissue).with_stability(StabilityPolicy::Substep);
            run(config).unwrap().final_temperature.get(50, 50)
        };
        assert!(peak("fat") > peak("muscle"));
    }

    #[test]
    fn runs_are_bit_identical() {
        let config = stable_config(15).with_boundary(BoundaryCondition::Insulated);
        let a = run(config.clone()).unwrap();
        let b = run(config).unwrap();
        assert_eq!(a.final_temperature, b.final_temperature);
        assert_eq!(a.final_damage_fraction, b.final_damage_fraction);
        assert_eq!(a.snapshots.len(), b.snapshots.len());
        for (sa, sb) in a.snapshots.iter().zip(&b.snapshots) {
            assert_eq!(sa.temperature, sb.temperature);
            assert_eq!(sa.damage_fraction, sb.damage_fraction);
        }
    }

    #[test]
    fn snapshots_are_not_aliased() {
        let result = run(stable_config(12)).unwrap();
        let first = &result.snapshots[0].temperature;
        let last = &result.snapshots[2].temperature;
        assert!(last.get(12, 12) > first.get(12, 12));
        assert!(result.final_temperature.get(12, 12) > last.get(12, 12));
    }

    #[test]
    fn progress_callback_runs_once_per_tick() {
        let mut ticks = Vec::new();
        let result = run_with(stable_config(11), |p| ticks.push((p.step, p.snapshot_recorded)), None).unwrap();
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks[0], (0, true));
        assert_eq!(ticks[4], (4, false));
        assert_eq!(ticks[10], (10, true));
        assert_eq!(result.snapshots.len(), 3);
    }

    #[test]
    fn cancellation_stops_between_ticks() {
        let cancel = AtomicBool::new(false);
        let mut sim = ThermalSimulation::new(stable_config(50)).unwrap();
        let err = sim
            .run(
                |p| {
                    if p.step == 6 {
                        cancel.store(true, Ordering::Relaxed);
                    }
                },
                Some(&cancel),
            )
            .unwrap_err();
        assert!(matches!(err, SimulationError::Cancelled { completed_steps: 7 }));
        assert_eq!(sim.status(), SimStatus::Cancelled);
        assert!(matches!(sim.step(), Err(SimulationError::AlreadyCompleted)));
        assert!(matches!(sim.into_result(), Err(SimulationError::NotCompleted { .. })));
    }

    #[test]
    fn completed_simulation_cannot_step() {
        let mut sim = ThermalSimulation::new(stable_config(2)).unwrap();
        assert_eq!(sim.status(), SimStatus::Idle);
        sim.step().unwrap();
        assert_eq!(sim.status(), SimStatus::Running);
        sim.step().unwrap();
        assert_eq!(sim.status(), SimStatus::Completed);
        assert!(matches!(sim.step(), Err(SimulationError::AlreadyCompleted)));
    }

    #[test]
    fn result_splits_into_snapshot_sequences() {
        let result = run(stable_config(12)).unwrap();
        let snapshots = result.snapshots.clone();
        let final_temperature = result.final_temperature.clone();
        let final_damage = result.final_damage_fraction.clone();

        let (temperatures, damages, last_temperature, last_damage) = result.into_parts();
        assert_eq!(temperatures.len(), 12u32.div_ceil(5) as usize);
        assert_eq!(damages.len(), temperatures.len());
        for (k, snapshot) in snapshots.iter().enumerate() {
            assert_eq!(temperatures[k], snapshot.temperature);
            assert_eq!(damages[k], snapshot.damage_fraction);
        }
        assert_eq!(last_temperature, final_temperature);
        assert_eq!(last_damage, final_damage);
        // tick 11 is past the last snapshot (tick 10)
        assert_ne!(last_temperature, temperatures[2]);
    }

    #[test]
    fn heat_sink_below_absolute_zero_saturates_damage() {
        // dx = 1 cm keeps dt = 5 s far inside the stability limit
        let config = SimulationConfig::new("muscle", 5.0, 5.0, 2, -1.0e9).with_grid(4, 0.04);
        let mut sim = ThermalSimulation::new(config).unwrap();
        assert!(!sim.params().exceeds_stability_limit);
        sim.step().unwrap();

        let instability = sim.instability().expect("sink cells leave the plausible band");
        assert_eq!(instability.step, 0);
        assert!(instability.min_temperature < MIN_PLAUSIBLE_TEMPERATURE_C);
        assert_eq!(instability.non_finite_cells, 0);

        let snapshots = sim.get_recorded_snapshots();
        assert_eq!(snapshots.len(), 1);
        let damage = &snapshots[0].damage_fraction;
        assert_eq!(damage.get(1, 1), MAX_DAMAGE_FRACTION);
        assert!(damage.get(0, 0) < 1e-6);
        assert_eq!(sim.status(), SimStatus::Completed);
    }

    #[test]
    fn invalid_config_fails_before_stepping() {
        let err = ThermalSimulation::new(SimulationConfig::new("bone", 60.0, 5.0, 10, 1.0)).err();
        assert!(matches!(err, Some(SimulationError::InvalidConfig(_))));
    }
}
