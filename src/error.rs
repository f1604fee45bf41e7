//! Error types for grid aggregation.

use thiserror::Error;

/// Errors raised while building grids, loading points or writing outputs.
#[derive(Error, Debug)]
pub enum GridError {
    /// The grid request violates a parameter constraint. Fatal, raised before
    /// any cell is generated.
    #[error("invalid grid spec: {param} {reason}")]
    InvalidGridSpec { param: &'static str, reason: String },

    /// A generated cell boundary cannot be indexed (degenerate or wrongly wound).
    #[error("index build failed for cell {cell}: {reason}")]
    IndexBuildFailure { cell: String, reason: String },

    /// A single input point is unusable. The assigner counts these instead of
    /// propagating them.
    #[error("malformed point: {reason}")]
    MalformedPoint { reason: String },

    /// Input data could not be interpreted as points.
    #[error("load error: {0}")]
    Load(String),

    /// Invalid configuration file or option combination.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal invariant violation (should not happen).
    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GridError {
    pub(crate) fn invalid_spec(param: &'static str, reason: impl Into<String>) -> Self {
        GridError::InvalidGridSpec {
            param,
            reason: reason.into(),
        }
    }

    /// Whether this error aborts a whole aggregation run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GridError::MalformedPoint { .. })
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
