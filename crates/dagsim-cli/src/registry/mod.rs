mod logging;
mod run;

pub use logging::{LogTarget, init_logging};
pub use run::{RunContext, RunOptions, RunSummary, start_run, write_summary};

use thiserror::Error;

/// Failures while recording a run.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
