//! Integration tests for geneig-validate.
//!
//! The QZ solver is checked against nalgebra's Schur and symmetric
//! eigen-decompositions.

use geneig_solver::{GeneralizedEigen, SolverConfig};
use geneig_validate::{
    ComparisonConfig, Error, check_residuals, compare_standard,
    compare_symmetric_definite,
};
use nalgebra::{DMatrix, dmatrix};

/// Deterministic pseudo-random matrix with entries in [-1, 1).
fn nonsymmetric(n: usize, seed: u64) -> DMatrix<f64> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    DMatrix::from_fn(n, n, |_, _| {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    })
}

/// Symmetric positive definite `M Mᵀ + n I`.
fn spd(n: usize, seed: u64) -> DMatrix<f64> {
    let m = nonsymmetric(n, seed);
    &m * m.transpose() + DMatrix::identity(n, n) * n as f64
}

fn symmetric(n: usize, seed: u64) -> DMatrix<f64> {
    let m = nonsymmetric(n, seed);
    (&m + m.transpose()) * 0.5
}

#[test]
fn test_standard_problem_matches_schur() {
    for (n, seed) in [(2, 1), (3, 2), (5, 3), (8, 4), (12, 5)] {
        let a = nonsymmetric(n, seed);
        let report = compare_standard(&a, &ComparisonConfig::default()).unwrap();
        assert!(report.passed, "n = {}:\n{}", n, report.to_text());
        assert_eq!(
            report.comparisons.iter().filter(|c| c.name.starts_with("lambda")).count(),
            n
        );
    }
}

#[test]
fn test_standard_rotation() {
    let a = dmatrix![0.0, -1.0; 1.0, 0.0];
    let report = compare_standard(&a, &ComparisonConfig::default()).unwrap();
    assert!(report.passed, "{}", report.to_text());
}

#[test]
fn test_symmetric_definite_matches_cholesky() {
    for (n, seed) in [(3, 1), (4, 2), (6, 3), (10, 4)] {
        let a = symmetric(n, seed);
        let b = spd(n, seed + 100);
        let report = compare_symmetric_definite(&a, &b, &ComparisonConfig::default()).unwrap();
        assert!(report.passed, "n = {}:\n{}", n, report.to_text());
    }
}

#[test]
fn test_symmetric_definite_classic_pencil() {
    let a = dmatrix![3.0, -1.0, 5.0; -1.0, -2.0, 7.0; 5.0, 7.0, 0.0];
    let b = dmatrix![10.0, 2.0, 7.0; 2.0, 12.0, 3.0; 7.0, 3.0, 15.0];
    let config = ComparisonConfig::default().with_eigenvalue_tol(1e-10);
    let report = compare_symmetric_definite(&a, &b, &config).unwrap();
    assert!(report.passed, "{}", report.to_text());
}

#[test]
fn test_residuals_of_general_pencil() {
    let a = nonsymmetric(7, 9);
    let b = nonsymmetric(7, 10) + DMatrix::identity(7, 7) * 4.0;
    let eig = GeneralizedEigen::new(&a, &b).unwrap();
    let config = ComparisonConfig::default().with_residual_tol(1e-10);

    let report = check_residuals(&a, &b, &eig, &config).unwrap();
    assert!(report.passed, "{}", report.to_text());
    assert_eq!(report.comparisons.len(), 7);
}

#[test]
fn test_residuals_skip_infinite_eigenvalues() {
    let a = dmatrix![1.0, 2.0, 3.0; 4.0, 5.0, 6.0; 7.0, 8.0, 10.0];
    let b = dmatrix![0.0, 0.0, 0.0; 0.0, 3.0, 4.0; 0.0, 0.0, 5.0];
    let eig = GeneralizedEigen::new(&a, &b).unwrap();

    let report = check_residuals(&a, &b, &eig, &ComparisonConfig::default()).unwrap();
    assert!(report.passed, "{}", report.to_text());
    assert_eq!(report.comparisons.len(), 2);
}

#[test]
fn test_residuals_need_eigenvectors() {
    let a = dmatrix![1.0, 2.0; 3.0, 4.0];
    let b = DMatrix::identity(2, 2);
    let eig = GeneralizedEigen::with_config(&a, &b, &SolverConfig::eigenvalues_only()).unwrap();

    let err = check_residuals(&a, &b, &eig, &ComparisonConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Solver(geneig_core::Error::EigenvectorsNotComputed)
    ));
}

#[test]
fn test_solver_errors_propagate() {
    let a = DMatrix::<f64>::zeros(2, 3);
    let err = compare_standard(&a, &ComparisonConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Solver(geneig_core::Error::NotSquare { .. })
    ));
    assert!(err.to_string().contains("solver error"));
}

#[test]
fn test_report_json_round_trip() {
    let a = nonsymmetric(4, 2);
    let report = compare_standard(&a, &ComparisonConfig::default()).unwrap();
    let json = report.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["name"], "standard");
    assert_eq!(value["passed"], report.passed);
    assert_eq!(
        value["comparisons"].as_array().unwrap().len(),
        report.comparisons.len()
    );
}
