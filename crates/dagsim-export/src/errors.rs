use thiserror::Error;

/// Errors emitted while writing tables or graphs.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid location: {0}")]
    InvalidLocation(String),
    #[error("unknown table format: {0}")]
    UnknownFormat(String),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
