use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid grid specification: {0}")]
    InvalidGridSpec(String),

    #[error("invalid plate geometry: {0}")]
    InvalidPlateGeometry(String),

    /// Only raised when a caller asks for a strictly converged field.
    #[error("relaxation did not converge after {iterations} iterations (last delta {delta:e})")]
    NonConvergence { iterations: usize, delta: f64 },

    #[error("malformed parameter record: {0}")]
    ParamRecord(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;
