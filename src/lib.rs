//! Transient bioheat conduction with Arrhenius thermal damage on a 2D grid.
//!
//! [`run`] is the entry point: it validates a [`SimulationConfig`], steps the
//! explicit Pennes solver and returns every recorded [`Snapshot`] together
//! with the final temperature and damage-fraction fields.

pub mod damage;
pub mod diffusion;
pub mod export;
pub mod grid;
pub mod heat_source;
pub mod simulation;
pub mod state;

pub use bioheat_common::{
    ScalarField, SimulationConfig, SimulationError, SimulationResult, Snapshot,
};
pub use simulation::{SimStatus, ThermalSimulation, TickProgress};

use std::sync::atomic::AtomicBool;

/// Runs a complete simulation for `config`.
pub fn run(config: SimulationConfig) -> Result<SimulationResult, SimulationError> {
    run_with(config, |_| {}, None)
}

/// Runs a complete simulation, reporting each tick to `on_tick` and stopping
/// early with [`SimulationError::Cancelled`] once `cancel` is set.
pub fn run_with<F>(
    config: SimulationConfig,
    on_tick: F,
    cancel: Option<&AtomicBool>,
) -> Result<SimulationResult, SimulationError>
where
    F: FnMut(&TickProgress),
{
    let mut sim = ThermalSimulation::new(config)?;
    sim.run(on_tick, cancel)?;
    sim.into_result()
}
