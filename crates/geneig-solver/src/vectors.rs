//! Eigenvector back-substitution (fourth QZ stage).
//!
//! Solves the quasi-triangular system `(beta·A - alpha·B) y = 0` for every
//! eigenvalue, bottom up, storing each `y` in the strict upper triangle of the
//! (no longer needed) `B`. The vectors are then mapped back through the
//! accumulated `Z` and scaled so the largest component has magnitude one.
//! This is the EISPACK `qzvec` step.
//!
//! A complex pair at indices `(na, en)` yields one complex vector stored as
//! real part in column `na` and imaginary part in column `en`. It belongs to
//! the eigenvalue at `na`, the one with positive imaginary part.

use nalgebra::{DMatrix, RealField};

use crate::values::Eigenvalue;

/// Complex division `(tr + i·ti) / (dr + i·di)`.
///
/// A zero divisor is replaced by `eps`.
fn complex_divide<T: RealField + Copy>(tr: T, ti: T, dr: T, di: T, eps: T) -> (T, T) {
    let dr = if dr == T::zero() && di == T::zero() { eps } else { dr };
    if di.abs() > dr.abs() {
        let rr = dr / di;
        let d = dr * rr + di;
        ((tr * rr + ti) / d, (ti * rr - tr) / d)
    } else {
        let rr = di / dr;
        let d = dr + di * rr;
        ((tr + ti * rr) / d, (ti - tr * rr) / d)
    }
}

#[inline]
fn nonzero<T: RealField + Copy>(x: T, eps: T) -> T {
    if x == T::zero() { eps } else { x }
}

/// Steps of the outer loop over eigenvalues, bottom up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VectorStep {
    /// Pick the kind of vector for index `en`.
    Select,
    /// Real vector.
    Real,
    /// L710: complex vector of the pair ending at `en`.
    Complex,
    /// L795: toggle the pair flag, skipping the upper half of a pair.
    Toggle,
    /// L800.
    Done,
}

/// Steps of the real back-substitution for one row `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RealStep {
    /// Residual of row `i`; a nonzero subdiagonal saves the row for a 2×2 block.
    Row,
    /// L630: solve a 1×1 row, or hand a 2×2 block on.
    Close,
    /// L640: 2×2 block, rows `i` and `i + 1`.
    Block,
    /// L650: row `i + 1` from the saved row.
    FromSaved,
    /// L690: toggle the pending block.
    Toggle,
    /// L700.
    Done,
}

/// Steps of the complex back-substitution for one row `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComplexStep {
    /// Residual `(ra, sa)` of row `i`; a nonzero subdiagonal saves the row.
    Row,
    /// L770: set up a 1×1 row, or hand a 2×2 block on.
    Close,
    /// L773: divide by the diagonal `(w, w1)`.
    DivideByDiagonal,
    /// L775, L777: complex division `(t1, t2) = (tr, ti) / (dr, di)`.
    Divide,
    /// L780: 2×2 block, solve for row `i + 1` first.
    Block,
    /// L782: store row `i + 1` and pick the equation for row `i`.
    SecondRow,
    /// L785: row `i` from the saved row.
    FromSaved,
    /// L787: store row `i`.
    Store,
    /// L790.
    Done,
}

/// Steps of the normalization of column `j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NormalizeStep {
    /// Real column, or the first column of a pair.
    Column,
    /// L920: second column of a pair, scale both by the largest modulus.
    Pair,
    /// L945: toggle the pair flag.
    Toggle,
    /// L950.
    Done,
}

/// Back-substitute for every eigenvector and transform them into the original
/// coordinates. On return the columns of `z` hold the eigenvectors.
pub(crate) fn back_substitute<T: RealField + Copy>(
    a: &DMatrix<T>,
    b: &mut DMatrix<T>,
    z: &mut DMatrix<T>,
    values: &[Eigenvalue<T>],
    epsb: T,
) {
    let n = a.nrows();
    // Set once the lower half of a complex pair is done.
    let mut in_pair = false;

    for en in (0..n).rev() {
        let mut step = VectorStep::Select;
        loop {
            step = match step {
                VectorStep::Select => {
                    if in_pair {
                        VectorStep::Toggle
                    } else if en == 0 || values[en].is_real() {
                        VectorStep::Real
                    } else {
                        VectorStep::Complex
                    }
                }
                VectorStep::Real => {
                    solve_real(a, b, values, en, epsb);
                    VectorStep::Done
                }
                VectorStep::Complex => {
                    solve_complex(a, b, values, en, epsb);
                    VectorStep::Toggle
                }
                VectorStep::Toggle => {
                    in_pair = !in_pair;
                    VectorStep::Done
                }
                VectorStep::Done => break,
            };
        }
    }

    // Z·Y, column by column from the right so each column of Y is read before
    // it is overwritten.
    for j in (0..n).rev() {
        for i in 0..n {
            let mut zz = T::zero();
            for k in 0..=j {
                zz += z[(i, k)] * b[(k, j)];
            }
            z[(i, j)] = zz;
        }
    }

    normalize(z, values);
    log::debug!("qz: back-substituted {} eigenvectors", n);
}

/// Real eigenvalue at `en`: solve for column `en` of `B`.
fn solve_real<T: RealField + Copy>(
    a: &DMatrix<T>,
    b: &mut DMatrix<T>,
    values: &[Eigenvalue<T>],
    en: usize,
    epsb: T,
) {
    b[(en, en)] = T::one();
    if en == 0 {
        return;
    }

    let alfm = values[en].alpha_re;
    let betm = values[en].beta;
    let zero = T::zero();
    let mut m = en;

    // Saved row of a pending 2×2 diagonal block.
    let mut pending = false;
    let (mut zz, mut s) = (zero, zero);

    for i in (0..en).rev() {
        let (mut w, mut r) = (zero, zero);
        let (mut y, mut t) = (zero, zero);
        let mut step = RealStep::Row;
        loop {
            step = match step {
                RealStep::Row => {
                    w = betm * a[(i, i)] - alfm * b[(i, i)];
                    r = zero;
                    for j in m..=en {
                        r += (betm * a[(i, j)] - alfm * b[(i, j)]) * b[(j, en)];
                    }
                    if i == 0 || pending || betm * a[(i, i - 1)] == zero {
                        RealStep::Close
                    } else {
                        zz = w;
                        s = r;
                        RealStep::Toggle
                    }
                }
                RealStep::Close => {
                    m = i;
                    if pending {
                        RealStep::Block
                    } else {
                        b[(i, en)] = -r / nonzero(w, epsb);
                        RealStep::Done
                    }
                }
                RealStep::Block => {
                    let x = betm * a[(i, i + 1)] - alfm * b[(i, i + 1)];
                    y = betm * a[(i + 1, i)];
                    t = (x * s - zz * r) / nonzero(w * zz - x * y, epsb);
                    b[(i, en)] = t;
                    if x.abs() <= zz.abs() {
                        RealStep::FromSaved
                    } else {
                        b[(i + 1, en)] = (-r - w * t) / x;
                        RealStep::Toggle
                    }
                }
                RealStep::FromSaved => {
                    b[(i + 1, en)] = (-s - y * t) / nonzero(zz, epsb);
                    RealStep::Toggle
                }
                RealStep::Toggle => {
                    pending = !pending;
                    RealStep::Done
                }
                RealStep::Done => break,
            };
        }
    }
}

/// Complex pair at `(en - 1, en)`: solve for columns `na` (real part) and
/// `en` (imaginary part) of `B`.
fn solve_complex<T: RealField + Copy>(
    a: &DMatrix<T>,
    b: &mut DMatrix<T>,
    values: &[Eigenvalue<T>],
    en: usize,
    epsb: T,
) {
    let na = en - 1;
    let almr = values[na].alpha_re;
    let almi = values[na].alpha_im;
    let betm = values[na].beta;
    let zero = T::zero();
    let mut m = na;

    // Last component chosen purely imaginary so the 2×2 block row `en` holds.
    let y = nonzero(betm * a[(en, na)], epsb);
    b[(na, na)] = -almi * b[(en, en)] / y;
    b[(na, en)] = (almr * b[(en, en)] - betm * a[(en, en)]) / y;
    b[(en, na)] = zero;
    b[(en, en)] = T::one();
    if na == 0 {
        return;
    }

    let mut pending = false;
    let (mut zz, mut z1, mut r, mut s) = (zero, zero, zero, zero);

    for i in (0..na).rev() {
        let (mut w, mut w1, mut ra, mut sa) = (zero, zero, zero, zero);
        let (mut x, mut x1, mut y) = (zero, zero, zero);
        let (mut tr, mut ti, mut dr, mut di) = (zero, zero, zero, zero);
        let (mut t1, mut t2) = (zero, zero);
        let mut step = ComplexStep::Row;
        loop {
            step = match step {
                ComplexStep::Row => {
                    w = betm * a[(i, i)] - almr * b[(i, i)];
                    w1 = -almi * b[(i, i)];
                    ra = zero;
                    sa = zero;
                    for j in m..=en {
                        let xj = betm * a[(i, j)] - almr * b[(i, j)];
                        let x1j = -almi * b[(i, j)];
                        ra = ra + xj * b[(j, na)] - x1j * b[(j, en)];
                        sa = sa + xj * b[(j, en)] + x1j * b[(j, na)];
                    }
                    if i == 0 || pending || betm * a[(i, i - 1)] == zero {
                        ComplexStep::Close
                    } else {
                        zz = w;
                        z1 = w1;
                        r = ra;
                        s = sa;
                        pending = true;
                        ComplexStep::Done
                    }
                }
                ComplexStep::Close => {
                    m = i;
                    if pending {
                        ComplexStep::Block
                    } else {
                        tr = -ra;
                        ti = -sa;
                        ComplexStep::DivideByDiagonal
                    }
                }
                ComplexStep::DivideByDiagonal => {
                    dr = w;
                    di = w1;
                    ComplexStep::Divide
                }
                ComplexStep::Divide => {
                    (t1, t2) = complex_divide(tr, ti, dr, di, epsb);
                    if pending {
                        ComplexStep::SecondRow
                    } else {
                        ComplexStep::Store
                    }
                }
                ComplexStep::Block => {
                    x = betm * a[(i, i + 1)] - almr * b[(i, i + 1)];
                    x1 = -almi * b[(i, i + 1)];
                    y = betm * a[(i + 1, i)];
                    tr = y * ra - w * r + w1 * s;
                    ti = y * sa - w * s - w1 * r;
                    dr = w * zz - w1 * z1 - x * y;
                    di = w * z1 + w1 * zz - x1 * y;
                    ComplexStep::Divide
                }
                ComplexStep::SecondRow => {
                    b[(i + 1, na)] = t1;
                    b[(i + 1, en)] = t2;
                    pending = false;
                    if y.abs() > w.abs() + w1.abs() {
                        ComplexStep::FromSaved
                    } else {
                        tr = -ra - x * b[(i + 1, na)] + x1 * b[(i + 1, en)];
                        ti = -sa - x * b[(i + 1, en)] - x1 * b[(i + 1, na)];
                        ComplexStep::DivideByDiagonal
                    }
                }
                ComplexStep::FromSaved => {
                    t1 = (-r - zz * b[(i + 1, na)] + z1 * b[(i + 1, en)]) / y;
                    t2 = (-s - zz * b[(i + 1, en)] - z1 * b[(i + 1, na)]) / y;
                    ComplexStep::Store
                }
                ComplexStep::Store => {
                    b[(i, na)] = t1;
                    b[(i, en)] = t2;
                    ComplexStep::Done
                }
                ComplexStep::Done => break,
            };
        }
    }
}

/// Scale every vector so its largest component has magnitude one.
fn normalize<T: RealField + Copy>(z: &mut DMatrix<T>, values: &[Eigenvalue<T>]) {
    let n = z.nrows();
    // Set while waiting for the second column of a pair.
    let mut in_pair = false;

    for j in 0..n {
        let mut d = T::zero();
        let mut step = NormalizeStep::Column;
        loop {
            step = match step {
                NormalizeStep::Column => {
                    if in_pair {
                        NormalizeStep::Pair
                    } else if !values[j].is_real() {
                        NormalizeStep::Toggle
                    } else {
                        for i in 0..n {
                            if z[(i, j)].abs() > d {
                                d = z[(i, j)].abs();
                            }
                        }
                        if d != T::zero() {
                            for i in 0..n {
                                z[(i, j)] = z[(i, j)] / d;
                            }
                        }
                        NormalizeStep::Done
                    }
                }
                NormalizeStep::Pair => {
                    for i in 0..n {
                        let (x, y) = (z[(i, j - 1)], z[(i, j)]);
                        let mut r = x.abs() + y.abs();
                        if r != T::zero() {
                            r *= (x / r).hypot(y / r);
                        }
                        if r > d {
                            d = r;
                        }
                    }
                    if d != T::zero() {
                        for i in 0..n {
                            z[(i, j - 1)] = z[(i, j - 1)] / d;
                            z[(i, j)] = z[(i, j)] / d;
                        }
                    }
                    NormalizeStep::Toggle
                }
                NormalizeStep::Toggle => {
                    in_pair = !in_pair;
                    NormalizeStep::Done
                }
                NormalizeStep::Done => break,
            };
        }
    }
}
