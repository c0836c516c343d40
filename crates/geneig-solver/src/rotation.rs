//! Two- and three-element Householder reflectors.
//!
//! Every orthogonal update of the QZ pipeline is one of these reflectors,
//! stored in the scaled form `(u, v)` so that applying it to a pair (triple)
//! of entries costs one multiply-add for the projection and one per entry:
//!
//! ```text
//! t  = x1 + u2*x2 (+ u3*x3)
//! xk = xk + t*vk
//! ```
//!
//! The operation order is fixed; QZ deflation decisions are sensitive to it.

use std::ops::Range;

use nalgebra::{DMatrix, RealField};

/// Reflector that annihilates the second entry of a pair `(a1, a2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflector2<T> {
    u2: T,
    v1: T,
    v2: T,
}

impl<T: RealField + Copy> Reflector2<T> {
    /// Build the reflector mapping `(a1, a2)` onto `(±‖a‖, 0)`.
    ///
    /// Returns `None` when both entries are zero (nothing to annihilate).
    pub fn new(a1: T, a2: T) -> Option<Self> {
        let s = a1.abs() + a2.abs();
        if s == T::zero() {
            return None;
        }
        let u1 = a1 / s;
        let u2 = a2 / s;
        let r = u1.hypot(u2).copysign(u1);
        let v1 = -(u1 + r) / r;
        let v2 = -u2 / r;
        Some(Self {
            u2: v2 / v1,
            v1,
            v2,
        })
    }

    /// Apply from the left to rows `r1` and `r2` over the given columns.
    #[inline]
    pub fn apply_rows(&self, m: &mut DMatrix<T>, r1: usize, r2: usize, cols: Range<usize>) {
        for j in cols {
            let t = m[(r1, j)] + self.u2 * m[(r2, j)];
            m[(r1, j)] = m[(r1, j)] + t * self.v1;
            m[(r2, j)] = m[(r2, j)] + t * self.v2;
        }
    }

    /// Apply from the right to columns `c1` and `c2` over the given rows.
    #[inline]
    pub fn apply_cols(&self, m: &mut DMatrix<T>, c1: usize, c2: usize, rows: Range<usize>) {
        for i in rows {
            let t = m[(i, c1)] + self.u2 * m[(i, c2)];
            m[(i, c1)] = m[(i, c1)] + t * self.v1;
            m[(i, c2)] = m[(i, c2)] + t * self.v2;
        }
    }
}

/// Reflector that annihilates the last two entries of `(a1, a2, a3)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflector3<T> {
    u2: T,
    u3: T,
    v1: T,
    v2: T,
    v3: T,
}

impl<T: RealField + Copy> Reflector3<T> {
    /// Build the reflector mapping `(a1, a2, a3)` onto `(±‖a‖, 0, 0)`.
    ///
    /// Returns `None` when all entries are zero.
    pub fn new(a1: T, a2: T, a3: T) -> Option<Self> {
        let s = a1.abs() + a2.abs() + a3.abs();
        if s == T::zero() {
            return None;
        }
        let u1 = a1 / s;
        let u2 = a2 / s;
        let u3 = a3 / s;
        let r = (u1 * u1 + u2 * u2 + u3 * u3).sqrt().copysign(u1);
        let v1 = -(u1 + r) / r;
        let v2 = -u2 / r;
        let v3 = -u3 / r;
        Some(Self {
            u2: v2 / v1,
            u3: v3 / v1,
            v1,
            v2,
            v3,
        })
    }

    /// Apply from the left to rows `r1`, `r2`, `r3` over the given columns.
    #[inline]
    pub fn apply_rows(
        &self,
        m: &mut DMatrix<T>,
        (r1, r2, r3): (usize, usize, usize),
        cols: Range<usize>,
    ) {
        for j in cols {
            let t = m[(r1, j)] + self.u2 * m[(r2, j)] + self.u3 * m[(r3, j)];
            m[(r1, j)] = m[(r1, j)] + t * self.v1;
            m[(r2, j)] = m[(r2, j)] + t * self.v2;
            m[(r3, j)] = m[(r3, j)] + t * self.v3;
        }
    }

    /// Apply from the right to columns `c1`, `c2`, `c3` over the given rows.
    #[inline]
    pub fn apply_cols(
        &self,
        m: &mut DMatrix<T>,
        (c1, c2, c3): (usize, usize, usize),
        rows: Range<usize>,
    ) {
        for i in rows {
            let t = m[(i, c1)] + self.u2 * m[(i, c2)] + self.u3 * m[(i, c3)];
            m[(i, c1)] = m[(i, c1)] + t * self.v1;
            m[(i, c2)] = m[(i, c2)] + t * self.v2;
            m[(i, c3)] = m[(i, c3)] + t * self.v3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    #[test]
    fn test_reflector2_annihilates() {
        let mut m = dmatrix![3.0_f64; 4.0];
        let h = Reflector2::new(3.0_f64, 4.0).unwrap();
        h.apply_rows(&mut m, 0, 1, 0..1);

        assert!((m[(0, 0)].abs() - 5.0).abs() < 1e-14);
        assert!(m[(1, 0)].abs() < 1e-14);
    }

    #[test]
    fn test_reflector2_columns() {
        let mut m = dmatrix![4.0_f64, 3.0];
        let h = Reflector2::new(3.0_f64, 4.0).unwrap();
        h.apply_cols(&mut m, 1, 0, 0..1);

        assert!((m[(0, 1)].abs() - 5.0).abs() < 1e-14);
        assert!(m[(0, 0)].abs() < 1e-14);
    }

    #[test]
    fn test_reflector2_zero() {
        assert!(Reflector2::<f64>::new(0.0, 0.0).is_none());
    }

    #[test]
    fn test_reflector2_is_orthogonal() {
        let mut m = DMatrix::<f64>::identity(2, 2);
        let h = Reflector2::new(-1.5_f64, 0.25).unwrap();
        h.apply_rows(&mut m, 0, 1, 0..2);

        let qtq = m.transpose() * &m;
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((qtq[(i, j)] - expected).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn test_reflector3_annihilates() {
        let mut m = dmatrix![1.0_f64; 2.0; 2.0];
        let h = Reflector3::new(1.0_f64, 2.0, 2.0).unwrap();
        h.apply_rows(&mut m, (0, 1, 2), 0..1);

        assert!((m[(0, 0)].abs() - 3.0).abs() < 1e-14);
        assert!(m[(1, 0)].abs() < 1e-14);
        assert!(m[(2, 0)].abs() < 1e-14);
    }

    #[test]
    fn test_reflector3_columns() {
        let mut m = dmatrix![2.0_f64, 2.0, 1.0];
        let h = Reflector3::new(1.0_f64, 2.0, 2.0).unwrap();
        h.apply_cols(&mut m, (2, 1, 0), 0..1);

        assert!((m[(0, 2)].abs() - 3.0).abs() < 1e-14);
        assert!(m[(0, 1)].abs() < 1e-14);
        assert!(m[(0, 0)].abs() < 1e-14);
    }

    #[test]
    fn test_reflector3_zero() {
        assert!(Reflector3::<f64>::new(0.0, 0.0, 0.0).is_none());
    }
}
