//! Eigenvalue extraction (third QZ stage).
//!
//! Reduces every 2×2 diagonal block of the quasi-triangular pencil that has
//! real eigenvalues to two 1×1 blocks, and reads off the `(alpha_re, alpha_im,
//! beta)` triple of each eigenvalue. The generalized eigenvalues are the ratios
//! `(alpha_re + i·alpha_im) / beta`. This is the EISPACK `qzval` step.

use nalgebra::RealField;
use num_complex::Complex;

use crate::pencil::Pencil;
use crate::rotation::Reflector2;

/// One generalized eigenvalue as the unnormalized triple `(alpha_re, alpha_im, beta)`.
///
/// `beta` is never negative. It is zero or negligible for infinite eigenvalues,
/// so the ratio is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eigenvalue<T> {
    pub alpha_re: T,
    pub alpha_im: T,
    pub beta: T,
}

impl<T: RealField + Copy> Eigenvalue<T> {
    /// Real eigenvalue of the 1×1 block `a / b`, with `beta = |b|`.
    fn from_diagonal(a: T, b: T) -> Self {
        Self {
            alpha_re: if b < T::zero() { -a } else { a },
            alpha_im: T::zero(),
            beta: b.abs(),
        }
    }

    /// The eigenvalue `(alpha_re + i·alpha_im) / beta`.
    ///
    /// Non-finite when `beta` is zero.
    pub fn value(&self) -> Complex<T> {
        Complex::new(self.alpha_re / self.beta, self.alpha_im / self.beta)
    }

    /// The eigenvalue, or `None` when `beta` is exactly zero.
    pub fn finite_value(&self) -> Option<Complex<T>> {
        (self.beta != T::zero()).then(|| self.value())
    }

    #[inline]
    pub fn is_real(&self) -> bool {
        self.alpha_im == T::zero()
    }
}

/// Position of an eigenvalue relative to its complex conjugate partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EigenvalueKind {
    Real,
    /// First of a conjugate pair; its partner follows at the next index.
    ConjugateFirst,
    /// Second of a conjugate pair; its partner is at the previous index.
    ConjugateSecond,
}

impl EigenvalueKind {
    /// Classify a sequence of eigenvalues, pairing nonzero imaginary parts top down.
    pub(crate) fn classify<T: RealField + Copy>(values: &[Eigenvalue<T>]) -> Vec<Self> {
        let mut kinds = vec![EigenvalueKind::Real; values.len()];
        let mut i = 0;
        while i < values.len() {
            if !values[i].is_real() && i + 1 < values.len() {
                kinds[i] = EigenvalueKind::ConjugateFirst;
                kinds[i + 1] = EigenvalueKind::ConjugateSecond;
                i += 2;
            } else {
                i += 1;
            }
        }
        kinds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Decide how to treat the block ending at `en`.
    Classify,
    /// L410: 1×1 block.
    RealRoot,
    /// L420: 2×2 block, check the diagonal of `B` for negligible entries.
    Block,
    /// L430: normalize the block and solve its characteristic equation.
    Normalize,
    /// L435: choose and apply the right rotation `Z`.
    ApplyZ,
    /// L455: left rotation chosen from the first column of `A`.
    LeftFromA,
    /// L460: choose and apply the left rotation `Q`.
    ApplyQ,
    /// L475: block split into two real roots.
    TwoReal,
    /// L480, L485: complex rotations `Z` and `Q` of a conjugate pair.
    ComplexPair,
    /// L500, L503: diagonal the complex rotations would produce, and the pair
    /// read off from it.
    ComplexDiagonal,
    /// L505, L510: done with this index (or pair of indices).
    Next,
}

/// Scratch variables of one 2×2 block.
struct BlockScratch<T> {
    a1: T,
    a2: T,
    an: T,
    bn: T,
    e: T,
    ei: T,
    c: T,
    d: T,
    a11: T,
    a12: T,
    a21: T,
    a22: T,
    b11: T,
    b12: T,
    b22: T,
    cz: T,
    szr: T,
    szi: T,
    cq: T,
    sqr: T,
    sqi: T,
}

impl<T: RealField + Copy> BlockScratch<T> {
    fn new() -> Self {
        let z = T::zero();
        Self {
            a1: z,
            a2: z,
            an: z,
            bn: z,
            e: z,
            ei: z,
            c: z,
            d: z,
            a11: z,
            a12: z,
            a21: z,
            a22: z,
            b11: z,
            b12: z,
            b22: z,
            cz: z,
            szr: z,
            szi: z,
            cq: z,
            sqr: z,
            sqi: z,
        }
    }
}

/// Unit complex rotation `(c, s)` whose first row maps `(x1, x2)` onto a
/// multiple of `(1, 0)`, where `x1 = a1 + i·a1i` and `x2 = a2 + i·a2i`.
///
/// Returns `(c, sr, si)` with `c` real.
fn complex_rotation<T: RealField + Copy>(a1: T, a1i: T, a2: T, a2i: T) -> (T, T, T) {
    let c = (a1 * a1 + a1i * a1i).sqrt();
    if c == T::zero() {
        return (c, T::one(), T::zero());
    }
    let sr = (a1 * a2 + a1i * a2i) / c;
    let si = (a1 * a2i - a1i * a2) / c;
    let r = (c * c + sr * sr + si * si).sqrt();
    (c / r, sr / r, si / r)
}

/// Extract all eigenvalue triples from a quasi-triangular pencil, splitting
/// 2×2 blocks with real eigenvalues in place (and updating `Z` when present).
///
/// Returned in index order; complex pairs occupy adjacent indices, positive
/// imaginary part first.
pub(crate) fn extract<T: RealField + Copy>(pencil: &mut Pencil<T>, epsb: T) -> Vec<Eigenvalue<T>> {
    let n = pencil.order();
    let Pencil { a, b, z } = pencil;
    let zero_value = Eigenvalue {
        alpha_re: T::zero(),
        alpha_im: T::zero(),
        beta: T::zero(),
    };
    let mut values = vec![zero_value; n];
    let half: T = nalgebra::convert(0.5);

    // Set after a 2×2 block so the next (upper) index is skipped.
    let mut skip = false;

    for en in (0..n).rev() {
        if skip {
            skip = false;
            continue;
        }

        let na = en.saturating_sub(1);
        let mut s = BlockScratch::new();
        let mut state = State::Classify;

        loop {
            state = match state {
                State::Classify => {
                    if en == 0 || a[(en, na)] == T::zero() {
                        State::RealRoot
                    } else {
                        State::Block
                    }
                }
                State::RealRoot => {
                    values[en] = Eigenvalue::from_diagonal(a[(en, en)], b[(en, en)]);
                    State::Next
                }
                State::Block => {
                    if b[(na, na)].abs() <= epsb {
                        State::LeftFromA
                    } else if b[(en, en)].abs() > epsb {
                        State::Normalize
                    } else {
                        s.a1 = a[(en, en)];
                        s.a2 = a[(en, na)];
                        s.bn = T::zero();
                        State::ApplyZ
                    }
                }
                State::Normalize => {
                    s.an = a[(na, na)].abs()
                        + a[(na, en)].abs()
                        + a[(en, na)].abs()
                        + a[(en, en)].abs();
                    s.bn = b[(na, na)].abs() + b[(na, en)].abs() + b[(en, en)].abs();
                    s.a11 = a[(na, na)] / s.an;
                    s.a12 = a[(na, en)] / s.an;
                    s.a21 = a[(en, na)] / s.an;
                    s.a22 = a[(en, en)] / s.an;
                    s.b11 = b[(na, na)] / s.bn;
                    s.b12 = b[(na, en)] / s.bn;
                    s.b22 = b[(en, en)] / s.bn;

                    s.e = s.a11 / s.b11;
                    s.ei = s.a22 / s.b22;
                    let q = s.a21 / (s.b11 * s.b22);
                    let mut t = (s.a22 - s.e * s.b22) / s.b22;
                    if s.e.abs() > s.ei.abs() {
                        s.e = s.ei;
                        t = (s.a11 - s.e * s.b11) / s.b11;
                    }
                    s.c = half * (t - q * s.b12);
                    s.d = s.c * s.c + q * (s.a12 - s.e * s.b12);
                    if s.d < T::zero() {
                        State::ComplexPair
                    } else {
                        // Two real roots: zero both a(en, na) and b(en, na).
                        s.e += s.c + s.d.sqrt().copysign(s.c);
                        s.a11 -= s.e * s.b11;
                        s.a12 -= s.e * s.b12;
                        s.a22 -= s.e * s.b22;
                        if s.a11.abs() + s.a12.abs() < s.a21.abs() + s.a22.abs() {
                            s.a1 = s.a22;
                            s.a2 = s.a21;
                        } else {
                            s.a1 = s.a12;
                            s.a2 = s.a11;
                        }
                        State::ApplyZ
                    }
                }
                State::ApplyZ => {
                    if let Some(h) = Reflector2::new(s.a1, s.a2) {
                        h.apply_cols(a, en, na, 0..en + 1);
                        h.apply_cols(b, en, na, 0..en + 1);
                        if let Some(z) = z.as_mut() {
                            h.apply_cols(z, en, na, 0..n);
                        }
                    }
                    if s.bn == T::zero() {
                        State::TwoReal
                    } else if s.an < s.e.abs() * s.bn {
                        State::LeftFromA
                    } else {
                        s.a1 = b[(na, na)];
                        s.a2 = b[(en, na)];
                        State::ApplyQ
                    }
                }
                State::LeftFromA => {
                    s.a1 = a[(na, na)];
                    s.a2 = a[(en, na)];
                    State::ApplyQ
                }
                State::ApplyQ => {
                    if let Some(q) = Reflector2::new(s.a1, s.a2) {
                        q.apply_rows(a, na, en, na..n);
                        q.apply_rows(b, na, en, na..n);
                    }
                    State::TwoReal
                }
                State::TwoReal => {
                    a[(en, na)] = T::zero();
                    b[(en, na)] = T::zero();
                    values[na] = Eigenvalue::from_diagonal(a[(na, na)], b[(na, na)]);
                    values[en] = Eigenvalue::from_diagonal(a[(en, en)], b[(en, en)]);
                    skip = true;
                    State::Next
                }
                State::ComplexPair => {
                    s.e += s.c;
                    s.ei = (-s.d).sqrt();
                    let a11r = s.a11 - s.e * s.b11;
                    let a11i = s.ei * s.b11;
                    let a12r = s.a12 - s.e * s.b12;
                    let a12i = s.ei * s.b12;
                    let a22r = s.a22 - s.e * s.b22;
                    let a22i = s.ei * s.b22;

                    // Complex Z.
                    let (a1, a1i, a2, a2i) = if a11r.abs() + a11i.abs() + a12r.abs() + a12i.abs()
                        < s.a21.abs() + a22r.abs() + a22i.abs()
                    {
                        (a22r, a22i, -s.a21, T::zero())
                    } else {
                        (a12r, a12i, -a11r, -a11i)
                    };
                    (s.cz, s.szr, s.szi) = complex_rotation(a1, a1i, a2, a2i);

                    // Complex Q.
                    let (a1, a1i, a2, a2i) = if s.an < (s.e.abs() + s.ei) * s.bn {
                        (
                            s.cz * s.a11 + s.szr * s.a12,
                            s.szi * s.a12,
                            s.cz * s.a21 + s.szr * s.a22,
                            s.szi * s.a22,
                        )
                    } else {
                        (
                            s.cz * s.b11 + s.szr * s.b12,
                            s.szi * s.b12,
                            s.szr * s.b22,
                            s.szi * s.b22,
                        )
                    };
                    (s.cq, s.sqr, s.sqi) = complex_rotation(a1, a1i, a2, a2i);
                    State::ComplexDiagonal
                }
                State::ComplexDiagonal => {
                    // Leading diagonal entries of Q^H (A, B) Z; the partner
                    // slot holds the exact conjugate.
                    let (cq, sqr, sqi, cz, szr, szi) = (s.cq, s.sqr, s.sqi, s.cz, s.szr, s.szi);
                    let ssr = sqr * szr + sqi * szi;
                    let ssi = sqr * szi - sqi * szr;
                    let tr = cq * cz * s.a11 + cq * szr * s.a12 + sqr * cz * s.a21 + ssr * s.a22;
                    let ti = cq * szi * s.a12 - sqi * cz * s.a21 + ssi * s.a22;
                    let dr = cq * cz * s.b11 + cq * szr * s.b12 + ssr * s.b22;
                    let di = cq * szi * s.b12 + ssi * s.b22;

                    let t = ti * dr - tr * di;
                    let mut r = dr.hypot(di);
                    if r == T::zero() {
                        r = epsb;
                    }
                    let alpha_re = s.an * (tr * dr + ti * di) / r;
                    let alpha_im = (s.an * t / r).abs();
                    let beta = s.bn * r;
                    values[na] = Eigenvalue { alpha_re, alpha_im, beta };
                    values[en] = Eigenvalue {
                        alpha_re,
                        alpha_im: -alpha_im,
                        beta,
                    };
                    skip = true;
                    State::Next
                }
                State::Next => break,
            };
        }
    }

    let complex = values.iter().filter(|v| !v.is_real()).count();
    log::debug!(
        "qz: extracted {} eigenvalues ({} complex)",
        n,
        complex
    );
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hessenberg::reduce;
    use crate::qz::{Tolerances, iterate};
    use nalgebra::{DMatrix, dmatrix};

    fn eigenvalues(a: &DMatrix<f64>, b: &DMatrix<f64>) -> (Pencil<f64>, Vec<Eigenvalue<f64>>) {
        let mut p = Pencil::new(a, b, true);
        reduce(&mut p);
        let tol = Tolerances::for_pencil(&p.a, &p.b, None);
        iterate(&mut p, &tol, 30 * a.nrows()).unwrap();
        let values = extract(&mut p, tol.epsb);
        (p, values)
    }

    fn sorted_real(values: &[Eigenvalue<f64>]) -> Vec<f64> {
        let mut re: Vec<f64> = values.iter().map(|v| v.value().re).collect();
        re.sort_by(|x, y| x.partial_cmp(y).unwrap());
        re
    }

    #[test]
    fn test_from_diagonal_sign() {
        let v = Eigenvalue::from_diagonal(3.0_f64, -2.0);
        assert_eq!(v.alpha_re, -3.0);
        assert_eq!(v.beta, 2.0);
        assert_eq!(v.value(), Complex::new(-1.5, 0.0));
    }

    #[test]
    fn test_finite_value() {
        let v = Eigenvalue { alpha_re: 1.0_f64, alpha_im: 0.0, beta: 0.0 };
        assert!(v.finite_value().is_none());
        assert!(v.value().re.is_infinite());
    }

    #[test]
    fn test_classify() {
        let r = Eigenvalue { alpha_re: 1.0_f64, alpha_im: 0.0, beta: 1.0 };
        let c = Eigenvalue { alpha_re: 1.0_f64, alpha_im: 2.0, beta: 1.0 };
        let cc = Eigenvalue { alpha_re: 1.0_f64, alpha_im: -2.0, beta: 1.0 };
        let kinds = EigenvalueKind::classify(&[r, c, cc, r]);
        assert_eq!(
            kinds,
            vec![
                EigenvalueKind::Real,
                EigenvalueKind::ConjugateFirst,
                EigenvalueKind::ConjugateSecond,
                EigenvalueKind::Real
            ]
        );
    }

    #[test]
    fn test_real_spectrum() {
        let a = dmatrix![3.0, -1.0, 5.0; -1.0, -2.0, 7.0; 5.0, 7.0, 0.0];
        let b = dmatrix![10.0, 2.0, 7.0; 2.0, 12.0, 3.0; 7.0, 3.0, 15.0];
        let (p, values) = eigenvalues(&a, &b);

        assert!(values.iter().all(|v| v.is_real() && v.beta >= 0.0));
        let expected = [-1.273994934400804, 0.288466904827307, 0.396523620802854];
        for (got, want) in sorted_real(&values).iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{} vs {}", got, want);
        }
        // fully triangular once every block is split
        for i in 1..3 {
            assert_eq!(p.a[(i, i - 1)], 0.0);
        }
    }

    #[test]
    fn test_complex_pair() {
        let a = dmatrix![3.0, -1.0, 4.0; -1.0, -2.0, 7.0; 5.0, 7.0, 0.0];
        let b = dmatrix![10.0, 2.0, 7.0; 2.0, 12.0, 3.0; 7.0, 3.0, 15.0];
        let (_, values) = eigenvalues(&a, &b);

        let kinds = EigenvalueKind::classify(&values);
        let first = kinds
            .iter()
            .position(|k| *k == EigenvalueKind::ConjugateFirst)
            .unwrap();
        let (x, y) = (values[first].value(), values[first + 1].value());
        assert!(x.im > 0.0);
        assert!((x.re - 0.348658815513143).abs() < 1e-6);
        assert!((x.im - 0.014231792443601).abs() < 1e-6);
        assert!((y - x.conj()).norm() < 1e-9);

        // The partner triple is the exact conjugate, at the same scale.
        let (u, w) = (values[first], values[first + 1]);
        assert_eq!(u.alpha_re, w.alpha_re);
        assert_eq!(u.alpha_im, -w.alpha_im);
        assert_eq!(u.beta, w.beta);

        let real = values.iter().find(|v| v.is_real()).unwrap();
        assert!((real.value().re + 1.218260039403249).abs() < 1e-6);
    }

    #[test]
    fn test_two_by_two_with_real_roots() {
        // Hessenberg pencil whose only block has real roots 1 and 3.
        let a = dmatrix![2.0, 1.0; 1.0, 2.0];
        let b = DMatrix::<f64>::identity(2, 2);
        let (p, values) = eigenvalues(&a, &b);
        assert_eq!(p.a[(1, 0)], 0.0);
        let re = sorted_real(&values);
        assert!((re[0] - 1.0).abs() < 1e-12);
        assert!((re[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_infinite_eigenvalue() {
        let a = dmatrix![1.0, 2.0; 3.0, 4.0];
        let b = dmatrix![1.0, 0.0; 0.0, 0.0];
        let (_, values) = eigenvalues(&a, &b);
        assert!(values.iter().any(|v| v.beta.abs() < 1e-12));
        // finite one: det(A - λB) = (1-λ)·4 - 6 = 0
        let finite = values.iter().find(|v| v.beta.abs() > 1e-12).unwrap();
        assert!((finite.value().re + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_conjugate_pairs_share_scale() {
        // Pseudo-random pencils: every complex pair must come out as exact
        // conjugate triples with the positive imaginary part first.
        let mut state = 0x2545_f491_4f6c_dd1d_u64;
        let mut next = move || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
        };

        let mut pairs = 0;
        for n in [2, 3, 4, 5, 6, 8] {
            for _ in 0..4 {
                let a = DMatrix::from_fn(n, n, |_, _| next());
                let b = DMatrix::from_fn(n, n, |_, _| next()) + DMatrix::identity(n, n) * 3.0;
                let (_, values) = eigenvalues(&a, &b);
                let kinds = EigenvalueKind::classify(&values);

                for k in 0..n {
                    if kinds[k] != EigenvalueKind::ConjugateFirst {
                        continue;
                    }
                    pairs += 1;
                    let (u, w) = (values[k], values[k + 1]);
                    assert!(u.alpha_im > 0.0, "n = {}, index {}", n, k);
                    assert_eq!(w.alpha_re, u.alpha_re, "n = {}, index {}", n, k);
                    assert_eq!(w.alpha_im, -u.alpha_im, "n = {}, index {}", n, k);
                    assert_eq!(w.beta, u.beta, "n = {}, index {}", n, k);
                }
            }
        }
        assert!(pairs > 0);
    }
}
