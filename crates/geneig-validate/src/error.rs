//! Error types for validation.

use thiserror::Error;

/// Errors that can occur while validating the solver.
#[derive(Debug, Error)]
pub enum Error {
    /// The solver (or an input check) failed.
    #[error("solver error: {0}")]
    Solver(#[from] geneig_core::Error),

    /// The symmetric-definite reference needs a symmetric A.
    #[error("matrix A is not symmetric")]
    NotSymmetric,

    /// The symmetric-definite reference needs a positive definite B.
    #[error("matrix B is not symmetric positive definite")]
    NotPositiveDefinite,

    /// Report serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, Error>;
