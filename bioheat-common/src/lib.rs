pub mod config;
pub mod constants;
pub mod error;
pub mod field;
pub mod sim_params;
pub mod snapshot;
pub mod tissue;

// Re-export key types for easier use by dependent crates
pub use config::{
    BoundaryCondition, GridConfig, HeatSourceConfig, OutputConfig, SimulationConfig,
    StabilityPolicy, TimingConfig, TissueConfig,
};
pub use error::{ConfigError, SimulationError};
pub use field::{FieldStats, ScalarField};
pub use sim_params::SimParams;
pub use snapshot::{NumericInstability, RunMetadata, SimulationResult, Snapshot};
pub use tissue::{tissue_properties, TissueProperties, TissueType};
