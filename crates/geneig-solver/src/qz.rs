//! QZ iteration (second QZ stage).
//!
//! Takes a Hessenberg-triangular pencil and reduces `A` to quasi-triangular
//! form (1×1 and 2×2 diagonal blocks) while keeping `B` upper triangular,
//! following Moler and Stewart's implicit shifted QZ with Ward's modifications
//! (EISPACK `qzit`).
//!
//! The iteration is a state machine over the active block `[l, en]`:
//!
//! ```text
//! BeginStep ──► FindSplit ──► Deflate ──► BeginStep (block isolated)
//!                   │            │
//!                   ▼            ▼
//!              CheckTopOfB ◄─────┘ (split above the bottom block)
//!                   │
//!                   ▼
//!                 TestB ──► (negligible B diagonal) zero it, Deflate
//!                   │
//!                   ▼
//!              ChooseShift ──► SingleShift ┐
//!                   │  │                   │
//!                   │  └─► DoubleShift ────┼──► Sweep ──► FindSplit
//!                   └────► AdHocShift ─────┘
//! ```
//!
//! Floating point operations happen in the classic order; reordering them
//! changes which subdiagonal entries become negligible.

use nalgebra::{DMatrix, RealField};

use geneig_core::{Error, Result};

use crate::config::{AD_HOC_SHIFT, AD_HOC_SHIFT_AFTER};
use crate::epsilon::unit_roundoff;
use crate::pencil::Pencil;
use crate::rotation::{Reflector2, Reflector3};

/// Negligibility thresholds for the reduced pencil.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances<T> {
    /// Entries of `A` at or below this magnitude are treated as zero.
    pub epsa: T,
    /// Entries of `B` at or below this magnitude are treated as zero.
    pub epsb: T,
}

impl<T: RealField + Copy> Tolerances<T> {
    /// Derive the thresholds from the norms of a Hessenberg-triangular pencil.
    ///
    /// `tolerance` replaces the unit round-off when it is positive.
    pub(crate) fn for_pencil(a: &DMatrix<T>, b: &DMatrix<T>, tolerance: Option<T>) -> Self {
        let n = a.nrows();
        let mut anorm = T::zero();
        let mut bnorm = T::zero();

        for i in 0..n {
            let mut ani = if i != 0 { a[(i, i - 1)].abs() } else { T::zero() };
            let mut bni = T::zero();
            for j in i..n {
                ani += a[(i, j)].abs();
                bni += b[(i, j)].abs();
            }
            if ani > anorm {
                anorm = ani;
            }
            if bni > bnorm {
                bnorm = bni;
            }
        }

        if anorm == T::zero() {
            anorm = T::one();
        }
        if bnorm == T::zero() {
            bnorm = T::one();
        }

        let ep = match tolerance {
            Some(t) if t > T::zero() => t,
            _ => unit_roundoff(),
        };

        Self {
            epsa: ep * anorm,
            epsb: ep * bnorm,
        }
    }
}

/// Counters describing one run of the QZ iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationStats {
    /// QZ sweeps performed.
    pub sweeps: usize,
    /// Sweeps that used the ad hoc shift.
    pub ad_hoc_shifts: usize,
    /// Trailing blocks isolated.
    pub deflations: usize,
    /// Sweep budget the iteration ran under.
    pub budget: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// L60: start work on the block ending at `en`.
    BeginStep,
    /// L70: scan upward for a negligible subdiagonal entry.
    FindSplit,
    /// L90: zero the negligible entry; shrink the active block if it isolates the bottom.
    Deflate,
    /// L95: record the top of the active block.
    CheckTopOfB,
    /// L100: test the top diagonal entry of `B` for negligibility.
    TestB,
    /// L120: pick the shift strategy for the next sweep.
    ChooseShift,
    /// L140: first column of a single real shift.
    SingleShift,
    /// L150: first column of an implicit double shift.
    DoubleShift,
    /// L155: fixed exceptional shift after repeated failures.
    AdHocShift,
    /// L160: chase the bulge down the active block.
    Sweep,
    /// L1000: sweep budget exhausted.
    Exhausted,
    /// L1001: every block is 1×1 or 2×2.
    Finished,
}

struct QzIteration<'p, T: RealField + Copy> {
    a: &'p mut DMatrix<T>,
    b: &'p mut DMatrix<T>,
    z: Option<&'p mut DMatrix<T>>,
    n: usize,
    epsa: T,
    epsb: T,

    // active block and split bookkeeping
    en: usize,
    na: usize,
    enorn: usize,
    lor1: usize,
    l: usize,
    l1: usize,
    lm1: usize,
    ld: usize,

    // shift bookkeeping
    ish: usize,
    its: usize,
    itn: usize,
    sh: T,
    a1: T,
    a2: T,
    a3: T,
    a11: T,
    a21: T,
    a33: T,
    a34: T,
    a43: T,
    a44: T,
    b22: T,
    b34: T,

    stats: IterationStats,
}

/// Reduce a Hessenberg-triangular pencil to quasi-triangular form.
///
/// Fails with [`Error::NoConvergence`] carrying the 0-based index of the
/// eigenvalue being sought when `budget` sweeps are exhausted.
pub(crate) fn iterate<T: RealField + Copy>(
    pencil: &mut Pencil<T>,
    tolerances: &Tolerances<T>,
    budget: usize,
) -> Result<IterationStats> {
    let n = pencil.order();
    let Pencil { a, b, z } = pencil;
    let accumulate = z.is_some();

    let zero = T::zero();
    let run = QzIteration {
        a,
        b,
        z: z.as_mut(),
        n,
        epsa: tolerances.epsa,
        epsb: tolerances.epsb,
        en: n - 1,
        na: 0,
        enorn: n,
        lor1: 0,
        l: 0,
        l1: 0,
        lm1: 0,
        ld: 0,
        ish: 0,
        its: 0,
        itn: budget,
        sh: zero,
        a1: zero,
        a2: zero,
        a3: zero,
        a11: zero,
        a21: zero,
        a33: zero,
        a34: zero,
        a43: zero,
        a44: zero,
        b22: zero,
        b34: zero,
        stats: IterationStats {
            budget,
            ..Default::default()
        },
    };

    log::debug!(
        "qz: iterating order {} (budget {} sweeps, accumulate Z: {})",
        n,
        budget,
        accumulate
    );
    run.run()
}

impl<T: RealField + Copy> QzIteration<'_, T> {
    fn run(mut self) -> Result<IterationStats> {
        let mut state = State::BeginStep;
        loop {
            state = match state {
                State::BeginStep => self.begin_step(),
                State::FindSplit => self.find_split(),
                State::Deflate => self.deflate(),
                State::CheckTopOfB => {
                    self.ld = self.l;
                    State::TestB
                }
                State::TestB => self.test_b(),
                State::ChooseShift => self.choose_shift(),
                State::SingleShift => self.single_shift(),
                State::DoubleShift => self.double_shift(),
                State::AdHocShift => self.ad_hoc_shift(),
                State::Sweep => self.sweep(),
                State::Exhausted => {
                    log::warn!(
                        "qz: sweep budget of {} exhausted at eigenvalue index {}",
                        self.stats.budget,
                        self.en
                    );
                    return Err(Error::NoConvergence {
                        index: self.en,
                        sweeps: self.stats.sweeps,
                    });
                }
                State::Finished => {
                    log::debug!(
                        "qz: converged after {} sweeps ({} ad hoc)",
                        self.stats.sweeps,
                        self.stats.ad_hoc_shifts
                    );
                    return Ok(self.stats);
                }
            };
        }
    }

    fn begin_step(&mut self) -> State {
        if self.en <= 1 {
            return State::Finished;
        }
        if self.z.is_none() {
            self.enorn = self.en + 1;
        }
        self.its = 0;
        self.na = self.en - 1;
        State::FindSplit
    }

    fn find_split(&mut self) -> State {
        self.ish = 2;
        for l in (0..=self.en).rev() {
            self.l = l;
            if l == 0 {
                return State::CheckTopOfB;
            }
            self.lm1 = l - 1;
            if self.a[(l, l - 1)].abs() <= self.epsa {
                return State::Deflate;
            }
        }
        State::Deflate
    }

    fn deflate(&mut self) -> State {
        self.a[(self.l, self.lm1)] = T::zero();
        if self.l < self.na {
            return State::CheckTopOfB;
        }
        // 1×1 or 2×2 block isolated at the bottom
        self.en = self.lm1;
        self.stats.deflations += 1;
        State::BeginStep
    }

    fn test_b(&mut self) -> State {
        let l = self.l;
        let l1 = l + 1;
        self.l1 = l1;

        let b11 = self.b[(l, l)];
        if b11.abs() > self.epsb {
            return State::ChooseShift;
        }

        // Infinite eigenvalue: rotate the zero diagonal entry of B out of the
        // active block instead of shifting against it.
        log::debug!("qz: negligible B[{},{}], splitting off an infinite eigenvalue", l, l);
        self.b[(l, l)] = T::zero();
        if let Some(q) = Reflector2::new(self.a[(l, l)], self.a[(l1, l)]) {
            q.apply_rows(self.a, l, l1, l..self.enorn);
            q.apply_rows(self.b, l, l1, l..self.enorn);
        }

        if l != 0 {
            self.a[(l, self.lm1)] = -self.a[(l, self.lm1)];
        }
        self.lm1 = l;
        self.l = l1;
        State::Deflate
    }

    fn choose_shift(&mut self) -> State {
        let (l, l1) = (self.l, self.l1);
        let b11 = self.b[(l, l)];
        self.a11 = self.a[(l, l)] / b11;
        self.a21 = self.a[(l1, l)] / b11;
        if self.ish == 1 {
            return State::SingleShift;
        }

        if self.itn == 0 {
            return State::Exhausted;
        }
        if self.its == AD_HOC_SHIFT_AFTER {
            return State::AdHocShift;
        }

        // Shift from the generalized eigenvalues of the trailing 2×2 block.
        let (na, en, epsb) = (self.na, self.en, self.epsb);
        let guard = |x: T| if x.abs() < epsb { epsb } else { x };
        self.b22 = guard(self.b[(l1, l1)]);
        let b33 = guard(self.b[(na, na)]);
        let b44 = guard(self.b[(en, en)]);
        self.a33 = self.a[(na, na)] / b33;
        self.a34 = self.a[(na, en)] / b44;
        self.a43 = self.a[(en, na)] / b33;
        self.a44 = self.a[(en, en)] / b44;
        self.b34 = self.b[(na, en)] / b44;

        let half: T = nalgebra::convert(0.5);
        let t = half * (self.a43 * self.b34 - self.a33 - self.a44);
        let r = t * t + self.a34 * self.a43 - self.a33 * self.a44;
        if r < T::zero() {
            return State::DoubleShift;
        }

        // Real roots: single shift at the root closer to a44.
        self.ish = 1;
        let r = r.sqrt();
        self.sh = -t + r;
        let s = -t - r;
        if (s - self.a44).abs() < (self.sh - self.a44).abs() {
            self.sh = s;
        }

        // Look for two consecutive small subdiagonal elements of A.
        let ld = self.ld;
        for l in (ld + 1..=en - 2).rev() {
            let lm1 = l - 1;
            let l1 = l + 1;
            let mut t = self.a[(l, l)];
            if self.b[(l, l)].abs() > self.epsb {
                t -= self.sh * self.b[(l, l)];
            }

            let below = self.a[(l1, l)];
            let negligible = if below == T::zero() {
                t != T::zero()
            } else {
                self.a[(l, lm1)].abs() <= (t / below).abs() * self.epsa
            };
            if negligible {
                self.l = l;
                self.lm1 = lm1;
                self.l1 = l1;
                return State::TestB;
            }
        }
        self.l = ld;
        State::SingleShift
    }

    fn single_shift(&mut self) -> State {
        self.a1 = self.a11 - self.sh;
        self.a2 = self.a21;
        if self.l != self.ld {
            let (l, lm1) = (self.l, self.lm1);
            self.a[(l, lm1)] = -self.a[(l, lm1)];
        }
        State::Sweep
    }

    fn double_shift(&mut self) -> State {
        let (l, l1) = (self.l, self.l1);
        let b22 = self.b22;
        let a12 = self.a[(l, l1)] / b22;
        let a22 = self.a[(l1, l1)] / b22;
        let b12 = self.b[(l, l1)] / b22;

        let (a11, a33, a34, a43, a44, b34) =
            (self.a11, self.a33, self.a34, self.a43, self.a44, self.b34);
        let a21 = if self.a21 == T::zero() { self.epsa } else { self.a21 };

        self.a1 = ((a33 - a11) * (a44 - a11) - a34 * a43 + a43 * b34 * a11) / a21 + a12
            - a11 * b12;
        self.a2 = a22 - a11 - a21 * b12 - (a33 - a11) - (a44 - a11) + a43 * b34;
        self.a3 = self.a[(l1 + 1, l1)] / b22;
        State::Sweep
    }

    fn ad_hoc_shift(&mut self) -> State {
        log::debug!(
            "qz: {} sweeps without convergence on block ending at {}, using ad hoc shift",
            self.its,
            self.en
        );
        self.stats.ad_hoc_shifts += 1;
        self.a1 = T::zero();
        self.a2 = T::one();
        self.a3 = nalgebra::convert(AD_HOC_SHIFT);
        State::Sweep
    }

    fn sweep(&mut self) -> State {
        self.its += 1;
        self.itn -= 1;
        self.stats.sweeps += 1;
        if self.z.is_none() {
            self.lor1 = self.ld;
        }

        let (l, na, en, n, enorn, lor1) = (self.l, self.na, self.en, self.n, self.enorn, self.lor1);
        for k in l..=na {
            let notlas = k != na && self.ish == 2;
            let k1 = k + 1;
            let k2 = k + 2;
            let km1 = k.max(l + 1) - 1;
            let ll = en.min(k1 + self.ish);

            if !notlas {
                // zero a(k+1, k-1)
                if k != l {
                    self.a1 = self.a[(k, km1)];
                    self.a2 = self.a[(k1, km1)];
                }
                let Some(q) = Reflector2::new(self.a1, self.a2) else {
                    return State::FindSplit;
                };
                q.apply_rows(self.a, k, k1, km1..enorn);
                q.apply_rows(self.b, k, k1, km1..enorn);
                if k != l {
                    self.a[(k1, km1)] = T::zero();
                }
            } else {
                // zero a(k+1, k-1) and a(k+2, k-1)
                if k != l {
                    self.a1 = self.a[(k, km1)];
                    self.a2 = self.a[(k1, km1)];
                    self.a3 = self.a[(k2, km1)];
                }
                let Some(q) = Reflector3::new(self.a1, self.a2, self.a3) else {
                    continue;
                };
                q.apply_rows(self.a, (k, k1, k2), km1..enorn);
                q.apply_rows(self.b, (k, k1, k2), km1..enorn);
                if k != l {
                    self.a[(k1, km1)] = T::zero();
                    self.a[(k2, km1)] = T::zero();
                }

                // zero b(k+2, k+1) and b(k+2, k)
                if let Some(h) =
                    Reflector3::new(self.b[(k2, k2)], self.b[(k2, k1)], self.b[(k2, k)])
                {
                    h.apply_cols(self.a, (k2, k1, k), lor1..ll + 1);
                    h.apply_cols(self.b, (k2, k1, k), lor1..ll + 1);
                    self.b[(k2, k)] = T::zero();
                    self.b[(k2, k1)] = T::zero();
                    if let Some(z) = self.z.as_deref_mut() {
                        h.apply_cols(z, (k2, k1, k), 0..n);
                    }
                }
            }

            // zero b(k+1, k)
            let Some(h) = Reflector2::new(self.b[(k1, k1)], self.b[(k1, k)]) else {
                continue;
            };
            h.apply_cols(self.a, k1, k, lor1..ll + 1);
            h.apply_cols(self.b, k1, k, lor1..ll + 1);
            self.b[(k1, k)] = T::zero();
            if let Some(z) = self.z.as_deref_mut() {
                h.apply_cols(z, k1, k, 0..n);
            }
        }

        State::FindSplit
    }
}
