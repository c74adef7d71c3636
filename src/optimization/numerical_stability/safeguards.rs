//! Guarded scalar arithmetic for step-size estimation.
//!
//! Step-size formulas in the accelerated solver are ratios of inner products
//! (`s·y / y·y`, `s·s / s·y`, `||s|| / ||y||`). Any of them can degenerate:
//! zero denominators, sign flips from non-convex curvature, or overflow on
//! huge coordinate scales. The helpers here turn those cases into `None` so
//! each estimator can pick its documented fallback instead of carrying a
//! `NaN` or `inf` into the iteration state.
//!
//! # Provided items
//! - [`safe_ratio`]: `num / den` when the denominator is non-zero and the
//!   quotient is finite.
//! - [`positive_ratio`]: like [`safe_ratio`] but also requires a strictly
//!   positive result.
//! - [`is_positive_finite`]: the admissibility test for step sizes.
//! - [`scale_decay`]: the `2^-i` learning-rate factor for scale `i`.

/// `true` when `x` is a usable step size: finite and strictly positive.
#[inline]
pub fn is_positive_finite(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

/// Quotient `num / den`, or `None` when `den == 0` or the result is not finite.
///
/// # Parameters
/// - `num`: numerator
/// - `den`: denominator
///
/// # Returns
/// - `Some(num / den)` if finite, `None` otherwise.
#[inline]
pub fn safe_ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 || !den.is_finite() || !num.is_finite() {
        return None;
    }
    let q = num / den;
    q.is_finite().then_some(q)
}

/// Quotient `num / den` restricted to strictly positive finite values.
#[inline]
pub fn positive_ratio(num: f64, den: f64) -> Option<f64> {
    safe_ratio(num, den).filter(|q| *q > 0.0)
}

/// Learning-rate factor `2^-scale` used by the multi-scale scheduler.
///
/// Indices beyond `i32::MAX` saturate to `0.0`.
#[inline]
pub fn scale_decay(scale: usize) -> f64 {
    let exp = i32::try_from(scale).unwrap_or(i32::MAX);
    0.5_f64.powi(exp)
}
