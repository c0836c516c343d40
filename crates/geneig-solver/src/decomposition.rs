//! Generalized real eigen-decomposition of a matrix pencil.

use nalgebra::{DMatrix, DVector, RealField};
use num_complex::Complex;

use geneig_core::{Error, Result, check_pencil};

use crate::config::SolverConfig;
use crate::hessenberg;
use crate::pencil::Pencil;
use crate::qz::{self, IterationStats, Tolerances};
use crate::values::{self, Eigenvalue, EigenvalueKind};
use crate::vectors;

/// Eigenvalues and eigenvectors of the real generalized problem `A x = λ B x`.
///
/// Computed with the QZ algorithm, so `B` may be singular and neither matrix
/// needs to be symmetric. Eigenvalues are kept as `(alpha_re, alpha_im, beta)`
/// triples with `λ = (alpha_re + i·alpha_im) / beta`; an eigenvalue with
/// `beta` at or below the `B` tolerance is infinite.
///
/// Eigenvalues appear in the order the reduction produces them, not sorted.
/// Complex eigenvalues come in adjacent conjugate pairs, the one with positive
/// imaginary part first. For such a pair at `(k, k + 1)` the eigenvector of
/// `λ_k` is `V[:, k] + i·V[:, k + 1]`, so that `A V = B V D` holds with
/// `D` from [`eigenvalue_matrix`](Self::eigenvalue_matrix).
///
/// The input matrices are copied; they are never modified.
///
/// # Example
///
/// ```
/// use geneig_solver::GeneralizedEigen;
/// use nalgebra::dmatrix;
///
/// let a = dmatrix![2.0, 0.0; 0.0, 6.0];
/// let b = dmatrix![1.0, 0.0; 0.0, 2.0];
/// let eig = GeneralizedEigen::new(&a, &b).unwrap();
///
/// let mut values = eig.real_eigenvalues();
/// values.sort_by(|x, y| x.partial_cmp(y).unwrap());
/// assert_eq!(values, vec![2.0, 3.0]);
/// ```
#[derive(Debug, Clone)]
pub struct GeneralizedEigen<T: RealField + Copy> {
    triples: Vec<Eigenvalue<T>>,
    kinds: Vec<EigenvalueKind>,
    vectors: Option<DMatrix<T>>,
    tolerances: Tolerances<T>,
    stats: IterationStats,
}

impl<T: RealField + Copy> GeneralizedEigen<T> {
    /// Decompose the pencil `(a, b)` with the default configuration,
    /// eigenvectors included.
    pub fn new(a: &DMatrix<T>, b: &DMatrix<T>) -> Result<Self> {
        Self::with_config(a, b, &SolverConfig::default())
    }

    /// Decompose the pencil `(a, b)`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotSquare`], [`Error::DimensionMismatch`] or [`Error::Empty`]
    ///   for malformed input.
    /// - [`Error::NoConvergence`] when the sweep budget runs out.
    pub fn with_config(a: &DMatrix<T>, b: &DMatrix<T>, config: &SolverConfig<T>) -> Result<Self> {
        let n = check_pencil(a, b)?;
        log::debug!(
            "geneig: decomposing pencil of order {} (eigenvectors: {})",
            n,
            config.compute_eigenvectors
        );

        let mut pencil = Pencil::new(a, b, config.compute_eigenvectors);
        hessenberg::reduce(&mut pencil);
        pencil.trace("hessenberg-triangular");

        let tolerances = Tolerances::for_pencil(&pencil.a, &pencil.b, config.tolerance);
        let stats = qz::iterate(&mut pencil, &tolerances, config.sweep_budget(n))?;
        pencil.trace("quasi-triangular");

        let triples = values::extract(&mut pencil, tolerances.epsb);
        let kinds = EigenvalueKind::classify(&triples);

        let vectors = match pencil.z.take() {
            Some(mut z) => {
                vectors::back_substitute(&pencil.a, &mut pencil.b, &mut z, &triples, tolerances.epsb);
                Some(z)
            }
            None => None,
        };

        Ok(Self {
            triples,
            kinds,
            vectors,
            tolerances,
            stats,
        })
    }

    /// Order of the pencil.
    #[inline]
    pub fn order(&self) -> usize {
        self.triples.len()
    }

    /// The raw `(alpha_re, alpha_im, beta)` triples.
    pub fn triples(&self) -> &[Eigenvalue<T>] {
        &self.triples
    }

    /// Eigenvalue `k` as a complex number. Infinite eigenvalues are non-finite.
    ///
    /// # Panics
    ///
    /// Panics if `k >= self.order()`.
    pub fn eigenvalue(&self, k: usize) -> Complex<T> {
        self.triples[k].value()
    }

    /// All eigenvalues as complex numbers.
    pub fn eigenvalues(&self) -> Vec<Complex<T>> {
        self.triples.iter().map(Eigenvalue::value).collect()
    }

    /// Real part of eigenvalue `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= self.order()`.
    pub fn real_eigenvalue(&self, k: usize) -> T {
        let v = &self.triples[k];
        v.alpha_re / v.beta
    }

    /// Imaginary part of eigenvalue `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= self.order()`.
    pub fn imag_eigenvalue(&self, k: usize) -> T {
        let v = &self.triples[k];
        v.alpha_im / v.beta
    }

    pub fn real_eigenvalues(&self) -> Vec<T> {
        (0..self.order()).map(|k| self.real_eigenvalue(k)).collect()
    }

    pub fn imag_eigenvalues(&self) -> Vec<T> {
        (0..self.order()).map(|k| self.imag_eigenvalue(k)).collect()
    }

    /// Whether eigenvalue `k` is real or which half of a conjugate pair it is.
    ///
    /// # Panics
    ///
    /// Panics if `k >= self.order()`.
    pub fn kind(&self, k: usize) -> EigenvalueKind {
        self.kinds[k]
    }

    /// Matrix of eigenvectors, one per column.
    ///
    /// Real eigenvalue `k` has eigenvector `V[:, k]`, scaled so its largest
    /// component has magnitude one. A conjugate pair at `(k, k + 1)` shares the
    /// two columns as real and imaginary parts.
    pub fn eigenvectors(&self) -> Result<&DMatrix<T>> {
        self.vectors.as_ref().ok_or(Error::EigenvectorsNotComputed)
    }

    /// Column `k` of the eigenvector matrix.
    pub fn eigenvector(&self, k: usize) -> Result<DVector<T>> {
        let v = self.eigenvectors()?;
        self.check_index(k)?;
        Ok(v.column(k).into_owned())
    }

    /// The (possibly complex) eigenvector belonging to eigenvalue `k`.
    pub fn complex_eigenvector(&self, k: usize) -> Result<DVector<Complex<T>>> {
        let v = self.eigenvectors()?;
        self.check_index(k)?;
        let n = self.order();
        let vector = match self.kinds[k] {
            EigenvalueKind::Real => DVector::from_fn(n, |i, _| Complex::new(v[(i, k)], T::zero())),
            EigenvalueKind::ConjugateFirst => {
                DVector::from_fn(n, |i, _| Complex::new(v[(i, k)], v[(i, k + 1)]))
            }
            EigenvalueKind::ConjugateSecond => {
                DVector::from_fn(n, |i, _| Complex::new(v[(i, k - 1)], -v[(i, k)]))
            }
        };
        Ok(vector)
    }

    /// Block diagonal eigenvalue matrix `D` with `A V = B V D`.
    ///
    /// Real eigenvalues sit on the diagonal. A conjugate pair `μ ± iν` at
    /// `(k, k + 1)` becomes the block `[[μ, ν], [-ν, μ]]`.
    pub fn eigenvalue_matrix(&self) -> DMatrix<T> {
        let n = self.order();
        let mut d = DMatrix::zeros(n, n);
        for k in 0..n {
            d[(k, k)] = self.real_eigenvalue(k);
            match self.kinds[k] {
                EigenvalueKind::Real => {}
                EigenvalueKind::ConjugateFirst => d[(k, k + 1)] = self.imag_eigenvalue(k),
                EigenvalueKind::ConjugateSecond => d[(k, k - 1)] = self.imag_eigenvalue(k),
            }
        }
        d
    }

    pub fn has_complex_eigenvalues(&self) -> bool {
        self.kinds.iter().any(|k| *k != EigenvalueKind::Real)
    }

    /// True if some `beta` is negligible: `B` is singular and the pencil has
    /// an infinite eigenvalue.
    pub fn is_singular(&self) -> bool {
        self.triples.iter().any(|v| v.beta <= self.tolerances.epsb)
    }

    /// True if some eigenvalue has both `alpha` and `beta` negligible, so
    /// `det(A - λB)` vanishes for every `λ`.
    pub fn is_degenerate(&self) -> bool {
        self.triples.iter().any(|v| {
            v.beta <= self.tolerances.epsb
                && v.alpha_re.abs() + v.alpha_im.abs() <= self.tolerances.epsa
        })
    }

    /// Negligibility thresholds used for `A` and `B`.
    pub fn tolerances(&self) -> Tolerances<T> {
        self.tolerances
    }

    /// Iteration counters of the QZ stage.
    pub fn stats(&self) -> IterationStats {
        self.stats
    }

    fn check_index(&self, k: usize) -> Result<()> {
        if k >= self.order() {
            return Err(Error::IndexOutOfRange {
                index: k,
                order: self.order(),
            });
        }
        Ok(())
    }
}
