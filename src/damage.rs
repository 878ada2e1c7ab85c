//! Arrhenius thermal-damage accumulation.
//!
//! The damage integral grows as `dΩ/dt = A · exp(-Ea / (R · T_K))`. The rate
//! is never negative, so Ω is monotonic. At body temperature the exponent is
//! about -243 and the rate is ~5e-8 1/s; below ~40 °C it is negligible and
//! it underflows to exactly 0 well before reaching absolute zero. A cell at
//! exactly 0 K gets rate 0. Temperatures below absolute zero come from a
//! diverged field or from a strongly negative heat source (a heat sink); there
//! the exponent turns positive and the rate explodes (to +∞ just below 0 K),
//! which [`damage_fraction`] reports as saturated.

use bioheat_common::constants::{
    ACTIVATION_ENERGY, ARRHENIUS_FREQUENCY_FACTOR, GAS_CONSTANT, KELVIN_OFFSET, MAX_DAMAGE_FRACTION,
};
use rayon::prelude::*;

/// Instantaneous damage rate (1/s) at `temperature_c` degrees Celsius.
#[inline(always)]
pub fn damage_rate(temperature_c: f64) -> f64 {
    let t_kelvin = temperature_c + KELVIN_OFFSET;
    ARRHENIUS_FREQUENCY_FACTOR * (-ACTIVATION_ENERGY / (GAS_CONSTANT * t_kelvin)).exp()
}

/// Adds `rate(T) · dt` to every cell of the damage integral, using the
/// temperature that the diffusion step just produced.
pub fn accumulate_damage(damage: &mut [f64], temperature: &[f64], dt: f64) {
    damage
        .par_iter_mut()
        .zip(temperature.par_iter())
        .for_each(|(omega, &t)| *omega += damage_rate(t) * dt);
}

/// Fraction of damaged cells `1 - exp(-Ω)`, clamped to `[0, 1)`.
///
/// Large or infinite Ω saturates at the largest f64 below 1; a NaN integral
/// reports the saturated value as well.
#[inline]
pub fn damage_fraction(omega: f64) -> f64 {
    let fraction = -(-omega).exp_m1();
    if fraction.is_nan() {
        return MAX_DAMAGE_FRACTION;
    }
    fraction.clamp(0.0, MAX_DAMAGE_FRACTION)
}
