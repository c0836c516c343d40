//! Comparison of the QZ solver against reference decompositions.

use geneig_core::{check_pencil, norm_inf};
use geneig_solver::GeneralizedEigen;
use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::report::{Comparison, ValidationReport};

/// Tolerances for comparing solver output against references.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    /// Maximum eigenvalue error, relative to `max(1, |reference|)`.
    pub eigenvalue_tol: f64,
    /// Maximum scale-relative residual `‖A v - λ B v‖ / ((‖A‖ + |λ|‖B‖) ‖v‖)`.
    pub residual_tol: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            eigenvalue_tol: 1e-6,
            residual_tol: 1e-4,
        }
    }
}

impl ComparisonConfig {
    pub fn with_eigenvalue_tol(mut self, tol: f64) -> Self {
        self.eigenvalue_tol = tol;
        self
    }

    pub fn with_residual_tol(mut self, tol: f64) -> Self {
        self.residual_tol = tol;
        self
    }
}

/// Solve the standard problem `A x = λ x` as the pencil `(A, I)` and compare
/// against nalgebra's Schur-based eigenvalues.
pub fn compare_standard(a: &DMatrix<f64>, config: &ComparisonConfig) -> Result<ValidationReport> {
    let b = DMatrix::identity(a.nrows(), a.ncols());
    let eig = GeneralizedEigen::new(a, &b)?;
    let reference: Vec<Complex<f64>> = a.complex_eigenvalues().iter().copied().collect();

    let mut report = ValidationReport::new("standard");
    compare_eigenvalues(&mut report, &eig.eigenvalues(), &reference, config.eigenvalue_tol);
    report.merge(check_residuals(a, &b, &eig, config)?);

    log::debug!(
        "standard comparison of order {}: passed = {}",
        a.nrows(),
        report.passed
    );
    Ok(report)
}

/// Compare against the Cholesky reduction of a symmetric-definite pencil:
/// with `B = L Lᵀ`, the eigenvalues are those of the symmetric `L⁻¹ A L⁻ᵀ`.
///
/// Every imaginary part must come out exactly zero.
pub fn compare_symmetric_definite(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    config: &ComparisonConfig,
) -> Result<ValidationReport> {
    let n = check_pencil(a, b)?;
    if !is_symmetric(a) {
        return Err(Error::NotSymmetric);
    }
    if !is_symmetric(b) {
        return Err(Error::NotPositiveDefinite);
    }

    let chol = b.clone().cholesky().ok_or(Error::NotPositiveDefinite)?;
    let linv = chol
        .l()
        .solve_lower_triangular(&DMatrix::identity(n, n))
        .ok_or(Error::NotPositiveDefinite)?;
    let c = &linv * a * linv.transpose();
    let c = (&c + c.transpose()) * 0.5;
    let reference: Vec<Complex<f64>> = SymmetricEigen::new(c)
        .eigenvalues
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .collect();

    let eig = GeneralizedEigen::new(a, b)?;
    let mut report = ValidationReport::new("symmetric-definite");
    compare_eigenvalues(&mut report, &eig.eigenvalues(), &reference, config.eigenvalue_tol);

    for (k, t) in eig.triples().iter().enumerate() {
        report.add(Comparison::new(
            format!("alpha_im[{}]", k),
            [0.0, 0.0],
            [t.alpha_im, 0.0],
            t.alpha_im.abs(),
            0.0,
        ));
    }
    report.merge(check_residuals(a, b, &eig, config)?);

    log::debug!(
        "symmetric-definite comparison of order {}: passed = {}",
        n,
        report.passed
    );
    Ok(report)
}

/// Residual of every finite eigenpair, complex pairs included.
///
/// Eigenvalues with `beta` at or below the solver's `B` tolerance are skipped.
pub fn check_residuals(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    eig: &GeneralizedEigen<f64>,
    config: &ComparisonConfig,
) -> Result<ValidationReport> {
    let anorm = norm_inf(a);
    let bnorm = norm_inf(b);
    let ac = a.map(|x| Complex::new(x, 0.0));
    let bc = b.map(|x| Complex::new(x, 0.0));
    let epsb = eig.tolerances().epsb;

    let mut report = ValidationReport::new("residuals");
    for (k, t) in eig.triples().iter().enumerate() {
        if t.beta <= epsb {
            continue;
        }
        let lambda = t.value();
        let v = eig.complex_eigenvector(k)?;

        let r = &ac * &v - (&bc * &v) * lambda;
        let rnorm = r.iter().map(|c| c.norm()).fold(0.0, f64::max);
        let vnorm = v.iter().map(|c| c.norm()).fold(0.0, f64::max);
        let scale = (anorm + lambda.norm() * bnorm) * vnorm;
        let error = if scale > 0.0 { rnorm / scale } else { rnorm };

        report.add(Comparison::new(
            format!("residual[{}]", k),
            [0.0, 0.0],
            [error, 0.0],
            error,
            config.residual_tol,
        ));
    }
    Ok(report)
}

/// Pair each computed eigenvalue (in sorted order) with the nearest unused
/// reference eigenvalue and record the relative error.
fn compare_eigenvalues(
    report: &mut ValidationReport,
    actual: &[Complex<f64>],
    reference: &[Complex<f64>],
    tol: f64,
) {
    let mut sorted = actual.to_vec();
    sorted.sort_by(|x, y| x.re.total_cmp(&y.re).then(x.im.total_cmp(&y.im)));

    let mut used = vec![false; reference.len()];
    for (k, lambda) in sorted.iter().enumerate() {
        let nearest = reference
            .iter()
            .enumerate()
            .filter(|(j, _)| !used[*j])
            .min_by(|(_, x), (_, y)| (*x - lambda).norm().total_cmp(&(*y - lambda).norm()));

        let name = format!("lambda[{}]", k);
        let Some((j, mu)) = nearest else {
            report.add(Comparison::new(name, [f64::NAN, f64::NAN], [lambda.re, lambda.im], f64::INFINITY, tol));
            continue;
        };
        used[j] = true;

        let error = (lambda - mu).norm() / mu.norm().max(1.0);
        report.add(Comparison::new(name, [mu.re, mu.im], [lambda.re, lambda.im], error, tol));
    }
}

fn is_symmetric(m: &DMatrix<f64>) -> bool {
    let tol = 1e-12 * m.amax().max(1.0);
    (0..m.nrows()).all(|i| (0..i).all(|j| (m[(i, j)] - m[(j, i)]).abs() <= tol))
}
