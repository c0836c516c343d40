//! Working storage for one decomposition.

use geneig_core::format_matrix;
use nalgebra::{DMatrix, RealField};

/// The working pencil `(A, B)` and the right-hand transformation accumulator `Z`.
///
/// Owns private copies of the caller's matrices; every pipeline stage mutates
/// these buffers in place. `z` is `None` when eigenvectors were not requested.
#[derive(Debug, Clone)]
pub(crate) struct Pencil<T: RealField + Copy> {
    pub a: DMatrix<T>,
    pub b: DMatrix<T>,
    pub z: Option<DMatrix<T>>,
}

impl<T: RealField + Copy> Pencil<T> {
    /// Copy `a` and `b` into a new working pencil. With `accumulate` set, `z`
    /// starts as the identity.
    pub fn new(a: &DMatrix<T>, b: &DMatrix<T>, accumulate: bool) -> Self {
        let n = a.nrows();
        Self {
            a: a.clone(),
            b: b.clone(),
            z: accumulate.then(|| DMatrix::identity(n, n)),
        }
    }

    /// Order of the pencil.
    #[inline]
    pub fn order(&self) -> usize {
        self.a.nrows()
    }

    /// Dump `A` and `B` at trace level.
    pub fn trace(&self, stage: &str) {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "{}: A =\n{}B =\n{}",
                stage,
                format_matrix(&self.a, 6),
                format_matrix(&self.b, 6)
            );
        }
    }
}
