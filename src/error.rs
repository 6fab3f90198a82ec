//! Error types for the aldex-clr library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum ClrError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// User data fault detected before any sampling happens.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A Dirichlet draw produced a value outside (0, 1) or a non-finite value.
    #[error("Monte Carlo sampling failed: {0}")]
    Sampling(String),

    /// A CLR value came out non-finite from strictly positive inputs.
    #[error("CLR transform failed: {0}")]
    Transform(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, ClrError>;
