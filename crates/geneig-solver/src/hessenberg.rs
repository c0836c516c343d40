//! Hessenberg-triangular reduction (first QZ stage).
//!
//! Reduces `B` to upper triangular and `A` to upper Hessenberg form with
//! orthogonal transformations `Q^T (A, B) Z`, accumulating `Z` when the pencil
//! carries an accumulator. This is the EISPACK `qzhes` step of Moler and
//! Stewart's QZ algorithm.

use nalgebra::RealField;

use crate::pencil::Pencil;
use crate::rotation::Reflector2;

/// Reduce the pencil to Hessenberg-triangular form in place.
pub(crate) fn reduce<T: RealField + Copy>(pencil: &mut Pencil<T>) {
    let n = pencil.order();
    if n <= 1 {
        return;
    }
    log::debug!("qz: Hessenberg-triangular reduction, order {}", n);

    let Pencil { a, b, z } = pencil;

    // Householder reflections from the left make B upper triangular.
    for l in 0..n - 1 {
        let l1 = l + 1;
        let mut s = T::zero();
        for i in l1..n {
            s += b[(i, l)].abs();
        }
        if s == T::zero() {
            continue;
        }

        s += b[(l, l)].abs();
        let mut r = T::zero();
        for i in l..n {
            b[(i, l)] /= s;
            r += b[(i, l)] * b[(i, l)];
        }
        r = r.sqrt().copysign(b[(l, l)]);
        b[(l, l)] += r;
        let rho = r * b[(l, l)];

        for j in l1..n {
            let mut t = T::zero();
            for i in l..n {
                t += b[(i, l)] * b[(i, j)];
            }
            t = -t / rho;
            for i in l..n {
                let v = b[(i, l)];
                b[(i, j)] += t * v;
            }
        }

        for j in 0..n {
            let mut t = T::zero();
            for i in l..n {
                t += b[(i, l)] * a[(i, j)];
            }
            t = -t / rho;
            for i in l..n {
                a[(i, j)] += t * b[(i, l)];
            }
        }

        b[(l, l)] = -s * r;
        for i in l1..n {
            b[(i, l)] = T::zero();
        }
    }

    if n == 2 {
        return;
    }

    // Zero A below the subdiagonal column by column, bottom up, restoring the
    // triangularity of B after every left rotation.
    for k in 0..n - 2 {
        for l in (k + 1..=n - 2).rev() {
            let l1 = l + 1;

            let Some(q) = Reflector2::new(a[(l, k)], a[(l1, k)]) else {
                continue;
            };
            q.apply_rows(a, l, l1, k..n);
            a[(l1, k)] = T::zero();
            q.apply_rows(b, l, l1, l..n);

            let Some(h) = Reflector2::new(b[(l1, l1)], b[(l1, l)]) else {
                continue;
            };
            h.apply_cols(b, l1, l, 0..l1 + 1);
            b[(l1, l)] = T::zero();
            h.apply_cols(a, l1, l, 0..n);
            if let Some(z) = z.as_mut() {
                h.apply_cols(z, l1, l, 0..n);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, dmatrix};

    fn assert_orthogonal(z: &DMatrix<f64>) {
        let ztz = z.transpose() * z;
        let n = z.nrows();
        for i in 0..n {
            for j in 0..n {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (ztz[(i, j)] - expected).abs() < 1e-12,
                    "Z^T Z [{},{}] = {}",
                    i,
                    j,
                    ztz[(i, j)]
                );
            }
        }
    }

    #[test]
    fn test_reduce_structure() {
        let a = DMatrix::from_fn(5, 5, |i, j| ((i * 7 + j * 3) % 11) as f64 - 4.0);
        let b = DMatrix::from_fn(5, 5, |i, j| ((i * 5 + j * 2) % 7) as f64 + 0.5);
        let mut p = Pencil::new(&a, &b, true);
        reduce(&mut p);

        for i in 0..5 {
            for j in 0..5 {
                if i > j + 1 {
                    assert_eq!(p.a[(i, j)], 0.0, "A[{},{}] not zeroed", i, j);
                }
                if i > j {
                    assert_eq!(p.b[(i, j)], 0.0, "B[{},{}] not zeroed", i, j);
                }
            }
        }
        assert_orthogonal(p.z.as_ref().unwrap());
    }

    #[test]
    fn test_reduce_preserves_pencil() {
        // Q^T A Z = A' implies A Z = Q A'; with B invertible,
        // B^{-1} A = Z (B'^{-1} A') Z^T, so B'^{-1} A' is similar to B^{-1} A.
        let a = dmatrix![3.0_f64, -1.0, 5.0, 2.0; -1.0, -2.0, 7.0, 0.5; 5.0, 7.0, 0.0, 1.0; 1.0, 2.0, 3.0, 4.0];
        let b = dmatrix![10.0_f64, 2.0, 7.0, 1.0; 2.0, 12.0, 3.0, 0.0; 7.0, 3.0, 15.0, 2.0; 1.0, 0.0, 2.0, 9.0];
        let mut p = Pencil::new(&a, &b, true);
        reduce(&mut p);

        let z = p.z.as_ref().unwrap();
        let lhs = b.clone().lu().solve(&a).unwrap();
        let reduced = p.b.clone().lu().solve(&p.a).unwrap();
        let rhs = z * reduced * z.transpose();
        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    (lhs[(i, j)] - rhs[(i, j)]).abs() < 1e-10,
                    "mismatch at [{},{}]: {} vs {}",
                    i,
                    j,
                    lhs[(i, j)],
                    rhs[(i, j)]
                );
            }
        }
    }

    #[test]
    fn test_reduce_without_accumulator() {
        let a = dmatrix![1.0, 2.0, 3.0; 4.0, 5.0, 6.0; 7.0, 8.0, 10.0];
        let b = dmatrix![2.0, 1.0, 0.0; 1.0, 3.0, 1.0; 0.0, 1.0, 4.0];
        let mut with_z = Pencil::new(&a, &b, true);
        let mut without_z = Pencil::new(&a, &b, false);
        reduce(&mut with_z);
        reduce(&mut without_z);

        assert!(without_z.z.is_none());
        assert_eq!(with_z.a, without_z.a);
        assert_eq!(with_z.b, without_z.b);
    }

    #[test]
    fn test_reduce_trivial_orders() {
        let mut p = Pencil::new(&dmatrix![5.0], &dmatrix![2.0], true);
        reduce(&mut p);
        assert_eq!(p.a[(0, 0)], 5.0);
        assert_eq!(p.b[(0, 0)], 2.0);

        let mut p = Pencil::new(&dmatrix![1.0, 2.0; 3.0, 4.0], &dmatrix![1.0, 0.0; 1.0, 1.0], true);
        reduce(&mut p);
        assert_eq!(p.b[(1, 0)], 0.0);
        assert_eq!(p.z.as_ref().unwrap(), &DMatrix::identity(2, 2));
    }
}
