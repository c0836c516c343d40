//! Benchmarks for the QZ decomposition.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geneig_solver::{GeneralizedEigen, SolverConfig};
use nalgebra::DMatrix;

/// Nonsymmetric `A` and diagonally dominant `B` of the given order.
fn pencil(size: usize) -> (DMatrix<f64>, DMatrix<f64>) {
    let a = DMatrix::from_fn(size, size, |i, j| {
        (((i * 7 + j * 13) % 17) as f64 - 8.0) / (1.0 + (i as f64 - j as f64).abs())
    });
    let b = DMatrix::from_fn(size, size, |i, j| {
        if i == j {
            (size as f64) + 1.0
        } else {
            1.0 / ((i as f64 - j as f64).abs() + 1.0)
        }
    });
    (a, b)
}

fn bench_eigenvalues(c: &mut Criterion) {
    let mut group = c.benchmark_group("qz_eigenvalues");
    let config = SolverConfig::eigenvalues_only();

    for size in [10, 50, 100, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, &size| {
            let (a, b) = pencil(size);
            bencher.iter(|| {
                GeneralizedEigen::with_config(black_box(&a), black_box(&b), &config).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_eigenvectors(c: &mut Criterion) {
    let mut group = c.benchmark_group("qz_eigenvectors");

    for size in [10, 50, 100, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, &size| {
            let (a, b) = pencil(size);
            bencher.iter(|| GeneralizedEigen::new(black_box(&a), black_box(&b)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_eigenvalues, bench_eigenvectors);
criterion_main!(benches);
