use crate::damage::damage_fraction;
use crate::grid::Grid;
use crate::heat_source::build_heat_source;
use bioheat_common::constants::BODY_TEMPERATURE_C;
use bioheat_common::{ScalarField, SimParams};

/// Mutable field storage owned by the simulation driver.
#[derive(Debug)] // No Clone: snapshots copy individual fields instead
pub struct ThermalState {
    pub grid: Grid,

    // --- Ping-Pong Buffers ---
    // Temperature (current tick's input), °C
    pub temperature: ScalarField,
    // Temperature (current tick's output); swapped in after each step
    pub temperature_next: ScalarField,

    /// Cumulative Arrhenius integral Ω per cell. Never decreases.
    pub damage: ScalarField,

    /// Volumetric heat source, W/m³. Constant for the run.
    pub source: Vec<f64>,
}

impl ThermalState {
    /// Allocates fields at baseline: temperature `Tb`, zero damage, and the
    /// configured heat source.
    pub fn new(grid: Grid, params: &SimParams) -> Self {
        let n = grid.size();
        Self {
            grid,
            temperature: ScalarField::filled(n, BODY_TEMPERATURE_C),
            temperature_next: ScalarField::filled(n, BODY_TEMPERATURE_C),
            damage: ScalarField::filled(n, 0.0),
            source: build_heat_source(&grid, params.heat_size, params.heat_power),
        }
    }

    /// Makes the freshly written buffer the current temperature.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.temperature, &mut self.temperature_next);
    }

    /// Damage fraction view `1 - exp(-Ω)`, computed fresh from the integral.
    pub fn damage_fraction_field(&self) -> ScalarField {
        let mut fraction = self.damage.clone();
        fraction.values_mut().iter_mut().for_each(|v| *v = damage_fraction(*v));
        fraction
    }
}
