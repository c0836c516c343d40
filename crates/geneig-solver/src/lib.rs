//! QZ solver for the real generalized eigenvalue problem `A x = λ B x`.
//!
//! The decomposition runs four stages over private copies of `A` and `B`:
//!
//! 1. **Hessenberg-triangular reduction**: orthogonal transformations bring
//!    `B` to upper triangular and `A` to upper Hessenberg form.
//! 2. **QZ iteration**: implicitly shifted sweeps reduce `A` to
//!    quasi-triangular form (1×1 and 2×2 blocks) with `B` kept triangular.
//! 3. **Eigenvalue extraction**: 2×2 blocks with real eigenvalues are split,
//!    and every eigenvalue is read off as an `(alpha_re, alpha_im, beta)` triple.
//! 4. **Eigenvector back-substitution**: the quasi-triangular system is solved
//!    for each eigenvector, which is mapped back through the accumulated right
//!    transformations and normalized.
//!
//! Nothing requires `B` to be invertible: singular `B` produces infinite
//! eigenvalues (`beta == 0`) instead of failing.
//!
//! # Example
//!
//! ```
//! use geneig_solver::GeneralizedEigen;
//! use nalgebra::dmatrix;
//!
//! let a = dmatrix![3.0, -1.0, 5.0; -1.0, -2.0, 7.0; 5.0, 7.0, 0.0];
//! let b = dmatrix![10.0, 2.0, 7.0; 2.0, 12.0, 3.0; 7.0, 3.0, 15.0];
//!
//! let eig = GeneralizedEigen::new(&a, &b).unwrap();
//! let v = eig.eigenvectors().unwrap();
//! let residual = &a * v - &b * v * eig.eigenvalue_matrix();
//! assert!(residual.amax() < 1e-10);
//! ```

pub mod config;
pub mod decomposition;
pub mod epsilon;
mod hessenberg;
mod pencil;
pub mod qz;
pub mod rotation;
pub mod values;
mod vectors;

pub use config::{AD_HOC_SHIFT, AD_HOC_SHIFT_AFTER, SWEEPS_PER_ORDER, SolverConfig};
pub use decomposition::GeneralizedEigen;
pub use epsilon::unit_roundoff;
pub use geneig_core::{Error, Result};
pub use qz::{IterationStats, Tolerances};
pub use values::{Eigenvalue, EigenvalueKind};
