//! Cross-validation of the geneig QZ solver.
//!
//! Checks [`GeneralizedEigen`](geneig_solver::GeneralizedEigen) against
//! independent reference decompositions from nalgebra:
//!
//! - [`compare_standard`]: `B = I`, compared with the Schur-based eigenvalues.
//! - [`compare_symmetric_definite`]: symmetric `A` and positive definite `B`,
//!   compared with the symmetric eigenvalues of the Cholesky-reduced problem.
//! - [`check_residuals`]: scale-relative residuals of every finite eigenpair.
//!
//! Results are collected in a serializable [`ValidationReport`].
//!
//! # Example
//!
//! ```
//! use geneig_validate::{ComparisonConfig, compare_standard};
//! use nalgebra::dmatrix;
//!
//! let a = dmatrix![1.0, 2.0; -3.0, 4.0];
//! let report = compare_standard(&a, &ComparisonConfig::default()).unwrap();
//! assert!(report.passed, "{}", report.to_text());
//! ```

pub mod compare;
pub mod error;
pub mod report;

pub use compare::{ComparisonConfig, check_residuals, compare_standard, compare_symmetric_definite};
pub use error::{Error, Result};
pub use report::{Comparison, ValidationReport};
