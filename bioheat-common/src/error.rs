use thiserror::Error;

/// Configuration problems. All of them are detected before the first tick.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("grid size must be at least 1 cell")]
    EmptyGrid,
    #[error("time_step_s ({time_step}) exceeds total_time_s ({total_time})")]
    TimeStepExceedsTotal { time_step: f64, total_time: f64 },
    #[error("unknown tissue type '{0}' (expected one of: muscle, fat, skin)")]
    UnknownTissueType(String),
    #[error("snapshot_interval_steps must be at least 1")]
    ZeroSnapshotInterval,
    #[error("run would take {0} steps, more than the supported maximum")]
    TooManySteps(f64),
    #[error("time step {time_step} s exceeds the explicit stability limit {limit:.4e} s")]
    UnstableTimeStep { time_step: f64, limit: f64 },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read configuration '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("simulation already completed")]
    AlreadyCompleted,
    #[error("simulation has not completed ({completed_steps}/{total_steps} steps)")]
    NotCompleted { completed_steps: u32, total_steps: u32 },
    #[error("simulation cancelled after {completed_steps} steps")]
    Cancelled { completed_steps: u32 },
}
