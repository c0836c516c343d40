//! Dense-matrix helpers shared by the solver and validation crates.
//!
//! Matrices are plain [`nalgebra::DMatrix`] values. The helpers here cover the
//! input checks a generalized eigenvalue problem needs, conversion from the
//! row-major nested form most callers hold, and a fixed-precision printer for
//! logs and reports.

use std::fmt::{Display, Write};

use nalgebra::{DMatrix, RealField, Scalar};

use crate::error::{Error, Result};

/// Returns true if the matrix has as many rows as columns.
pub fn is_square<T: Scalar>(m: &DMatrix<T>) -> bool {
    m.nrows() == m.ncols()
}

/// Returns true if both matrices have the same shape.
pub fn same_size<T: Scalar>(a: &DMatrix<T>, b: &DMatrix<T>) -> bool {
    a.shape() == b.shape()
}

/// Validate a matrix pencil `(A, B)` and return its order.
///
/// Both operands must be square, non-empty and of identical order.
pub fn check_pencil<T: Scalar>(a: &DMatrix<T>, b: &DMatrix<T>) -> Result<usize> {
    if !is_square(a) {
        return Err(Error::NotSquare {
            operand: "A",
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    if !is_square(b) {
        return Err(Error::NotSquare {
            operand: "B",
            rows: b.nrows(),
            cols: b.ncols(),
        });
    }
    if !same_size(a, b) {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.nrows(),
        });
    }
    if a.nrows() == 0 {
        return Err(Error::Empty);
    }
    Ok(a.nrows())
}

/// Build a matrix from row-major nested rows.
///
/// All rows must have the same length as the first one.
pub fn from_rows<T: Scalar, R: AsRef<[T]>>(rows: &[R]) -> Result<DMatrix<T>> {
    let nrows = rows.len();
    let ncols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
    if nrows == 0 || ncols == 0 {
        return Err(Error::Empty);
    }
    if let Some(bad) = rows.iter().find(|r| r.as_ref().len() != ncols) {
        return Err(Error::DimensionMismatch {
            expected: ncols,
            actual: bad.as_ref().len(),
        });
    }

    Ok(DMatrix::from_fn(nrows, ncols, |i, j| {
        rows[i].as_ref()[j].clone()
    }))
}

/// Maximum absolute row sum (the induced infinity norm).
pub fn norm_inf<T: RealField + Copy>(m: &DMatrix<T>) -> T {
    let mut norm: T = nalgebra::zero();
    for row in m.row_iter() {
        let sum = row.iter().fold(nalgebra::zero::<T>(), |acc, &x| acc + x.abs());
        if sum > norm {
            norm = sum;
        }
    }
    norm
}

/// Format a matrix with a fixed number of decimals, one row per line.
pub fn format_matrix<T: Scalar + Display>(m: &DMatrix<T>, precision: usize) -> String {
    let cells: Vec<String> = m.iter().map(|x| format!("{:.*}", precision, x)).collect();
    let width = cells.iter().map(|c| c.len()).max().unwrap_or(0);

    let mut out = String::new();
    for i in 0..m.nrows() {
        out.push('[');
        for j in 0..m.ncols() {
            if j > 0 {
                out.push_str(", ");
            }
            // column-major storage
            let _ = write!(out, "{:>width$}", cells[j * m.nrows() + i], width = width);
        }
        out.push_str("]\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    #[test]
    fn test_check_pencil_ok() {
        let a = dmatrix![1.0, 2.0; 3.0, 4.0];
        let b = DMatrix::<f64>::identity(2, 2);
        assert_eq!(check_pencil(&a, &b), Ok(2));
    }

    #[test]
    fn test_check_pencil_not_square() {
        let a = DMatrix::<f64>::zeros(2, 3);
        let b = DMatrix::<f64>::identity(2, 2);
        assert!(matches!(
            check_pencil(&a, &b),
            Err(Error::NotSquare { operand: "A", rows: 2, cols: 3 })
        ));

        let a = DMatrix::<f64>::identity(2, 2);
        let b = DMatrix::<f64>::zeros(3, 2);
        assert!(matches!(
            check_pencil(&a, &b),
            Err(Error::NotSquare { operand: "B", .. })
        ));
    }

    #[test]
    fn test_check_pencil_mismatch() {
        let a = DMatrix::<f64>::identity(2, 2);
        let b = DMatrix::<f64>::identity(3, 3);
        assert_eq!(
            check_pencil(&a, &b),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        );
    }

    #[test]
    fn test_check_pencil_empty() {
        let a = DMatrix::<f64>::zeros(0, 0);
        let b = DMatrix::<f64>::zeros(0, 0);
        assert_eq!(check_pencil(&a, &b), Err(Error::Empty));
    }

    #[test]
    fn test_from_rows() {
        let m = from_rows(&[[1.0_f64, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
    }

    #[test]
    fn test_from_rows_ragged() {
        let rows = vec![vec![1.0_f64, 2.0], vec![3.0]];
        assert_eq!(
            from_rows(&rows),
            Err(Error::DimensionMismatch { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_norm_inf() {
        let m = dmatrix![1.0_f64, -2.0; -3.0, 4.0];
        assert!((norm_inf(&m) - 7.0).abs() < 1e-15);
    }

    #[test]
    fn test_format_matrix() {
        let m = dmatrix![1.0_f64, -2.5; 10.0, 0.0];
        let s = format_matrix(&m, 2);
        assert_eq!(s, "[ 1.00, -2.50]\n[10.00,  0.00]\n");
    }
}
