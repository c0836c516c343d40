//! Error types for geneig.

use thiserror::Error;

/// Errors that can occur while setting up or running a generalized
/// eigenvalue decomposition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The pencil has order zero.
    #[error("matrices must have at least one row and column")]
    Empty,

    /// An operand is not square.
    #[error("matrix {operand} must be square, got {rows}×{cols}")]
    NotSquare {
        operand: &'static str,
        rows: usize,
        cols: usize,
    },

    /// Operands (or rows of an operand) disagree in size.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The QZ sweep budget ran out before every eigenvalue was isolated.
    ///
    /// `index` is 0-based; the message shows the 1-based position.
    #[error(
        "no convergence after {sweeps} QZ sweeps while seeking eigenvalue {position} of the pencil",
        position = .index + 1
    )]
    NoConvergence { index: usize, sweeps: usize },

    /// Eigenvectors were disabled when the decomposition was built.
    #[error("eigenvectors were not computed for this decomposition")]
    EigenvectorsNotComputed,

    /// An eigenvalue index outside `0..order`.
    #[error("index {index} out of range for order {order}")]
    IndexOutOfRange { index: usize, order: usize },
}

impl Error {
    /// The 1-based eigenvalue index of a convergence failure, as reported by
    /// the classic EISPACK `ierr` convention.
    pub fn one_based_index(&self) -> Option<usize> {
        match self {
            Error::NoConvergence { index, .. } => Some(index + 1),
            _ => None,
        }
    }
}

/// Result type for geneig operations.
pub type Result<T> = std::result::Result<T, Error>;
