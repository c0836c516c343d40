//! Unit round-off estimation.

use nalgebra::RealField;

/// Estimate the unit round-off of `T`: the spacing of floating point numbers
/// just above one.
///
/// Computed at run time from the arithmetic of `T` rather than taken from a
/// table, using the `4/3` cancellation trick: `3 * (4/3 - 1)` differs from one
/// by exactly one unit in the last place in binary arithmetic.
pub fn unit_roundoff<T: RealField + Copy>() -> T {
    let one = T::one();
    let three: T = nalgebra::convert(3.0);
    let a = (one + three) / three;
    let b = a - one;
    let c = b + b + b;
    let eps = (c - one).abs();

    if eps == T::zero() {
        // Non-binary arithmetic; fall back to the type's own epsilon.
        T::default_epsilon()
    } else {
        eps
    }
}
