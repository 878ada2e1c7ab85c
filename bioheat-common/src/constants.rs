//! Physical constants shared by the solver and the reporting layer.

/// Baseline (arterial) body temperature, °C. Initial field value and
/// perfusion sink temperature.
pub const BODY_TEMPERATURE_C: f64 = 37.0;

/// Specific heat of blood, J/(kg·K).
pub const BLOOD_SPECIFIC_HEAT: f64 = 3770.0;

/// Offset between Celsius and Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

// Arrhenius damage model
/// Frequency factor A, 1/s.
pub const ARRHENIUS_FREQUENCY_FACTOR: f64 = 3.1e98;
/// Activation energy Ea, J/mol.
pub const ACTIVATION_ENERGY: f64 = 6.28e5;
/// Universal gas constant R, J/(mol·K).
pub const GAS_CONSTANT: f64 = 8.314;

/// Damage integral at which a cell counts as damaged (fraction 1 - 1/e).
pub const DAMAGE_THRESHOLD_OMEGA: f64 = 1.0;

/// Largest f64 below 1.0. Reported damage fractions never exceed it.
pub const MAX_DAMAGE_FRACTION: f64 = 1.0 - f64::EPSILON / 2.0;

// Sanity band for the instability check, °C.
pub const MIN_PLAUSIBLE_TEMPERATURE_C: f64 = -KELVIN_OFFSET;
pub const MAX_PLAUSIBLE_TEMPERATURE_C: f64 = 1000.0;

/// Fraction of the explicit stability limit used per sub-step when the
/// `substep` policy is active.
pub const SUBSTEP_SAFETY_FACTOR: f64 = 0.8;

// Reference configuration
pub const DEFAULT_GRID_SIZE: usize = 100;
pub const DEFAULT_DOMAIN_LENGTH_M: f64 = 0.05;
pub const DEFAULT_SNAPSHOT_INTERVAL: u32 = 5;
