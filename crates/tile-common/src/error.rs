//! Error types for the weather-tiles services.

use thiserror::Error;

/// Result type alias using TileError.
pub type TileResult<T> = Result<T, TileError>;

/// Primary error type for tile compositing operations.
#[derive(Debug, Error)]
pub enum TileError {
    /// A dataset key maps to no dataset. Recovered locally during
    /// enumeration; never surfaced for a request with other sections.
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    /// No section intersects the requested tile.
    #[error("tile {z}/{x}/{y} is outside dataset bounds")]
    TileOutOfBounds { z: u32, x: u32, y: u32 },

    /// A section's pixel data failed to load after its metadata
    /// indicated coverage.
    #[error("failed to fetch tile data for {key}: {message}")]
    FetchFailure { key: String, message: String },

    /// Malformed key string, option payload, or tile coordinate.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Internal-consistency violation (shape mismatch, sentinel
    /// collision). Indicates a rule-authoring bug, not a runtime
    /// condition to recover from.
    #[error("internal consistency error: {0}")]
    Consistency(String),

    /// Image assembly or PNG encoding failed.
    #[error("render failed: {0}")]
    Render(String),

    /// Unclassified internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TileError {
    /// Get the HTTP status code for this error.
    ///
    /// Internal errors map to 500 rather than an empty 2xx response, so
    /// genuine data-availability problems stay visible to callers.
    pub fn http_status_code(&self) -> u16 {
        match self {
            TileError::Validation(_) => 400,
            TileError::DatasetNotFound(_) | TileError::TileOutOfBounds { .. } => 404,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for TileError {
    fn from(err: std::io::Error) -> Self {
        TileError::Internal(err.to_string())
    }
}
