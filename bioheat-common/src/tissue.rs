use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported background tissues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TissueType {
    Muscle,
    Fat,
    Skin,
}

/// Thermophysical constants of a tissue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TissueProperties {
    /// Density ρ, kg/m³.
    pub density: f64,
    /// Specific heat c, J/(kg·K).
    pub specific_heat: f64,
    /// Thermal conductivity k, W/(m·K).
    pub conductivity: f64,
    /// Blood perfusion rate w, 1/s.
    pub perfusion: f64,
}

impl TissueType {
    pub const ALL: [TissueType; 3] = [TissueType::Muscle, TissueType::Fat, TissueType::Skin];

    pub fn properties(self) -> TissueProperties {
        match self {
            TissueType::Muscle => TissueProperties {
                density: 1050.0,
                specific_heat: 3600.0,
                conductivity: 0.5,
                perfusion: 0.001,
            },
            TissueType::Fat => TissueProperties {
                density: 920.0,
                specific_heat: 2300.0,
                conductivity: 0.2,
                perfusion: 0.0005,
            },
            TissueType::Skin => TissueProperties {
                density: 1100.0,
                specific_heat: 3400.0,
                conductivity: 0.37,
                perfusion: 0.002,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TissueType::Muscle => "muscle",
            TissueType::Fat => "fat",
            TissueType::Skin => "skin",
        }
    }
}

impl fmt::Display for TissueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TissueType::Muscle => "Muscle",
            TissueType::Fat => "Fat",
            TissueType::Skin => "Skin",
        };
        f.write_str(name)
    }
}

impl FromStr for TissueType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TissueType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownTissueType(s.to_string()))
    }
}

/// Looks up the property record for a tissue selector such as `"Muscle"`.
pub fn tissue_properties(selector: &str) -> Result<TissueProperties, ConfigError> {
    selector.parse::<TissueType>().map(TissueType::properties)
}

impl TissueProperties {
    /// Volumetric heat capacity ρ·c, J/(m³·K).
    pub fn heat_capacity(&self) -> f64 {
        self.density * self.specific_heat
    }

    /// Largest time step for which the explicit 5-point scheme stays stable
    /// on a grid of spacing `dx`: `dx² · ρc / (4k)`.
    pub fn stable_time_step(&self, dx: f64) -> f64 {
        if self.conductivity <= 0.0 {
            return f64::INFINITY;
        }
        dx * dx * self.heat_capacity() / (4.0 * self.conductivity)
    }
}
