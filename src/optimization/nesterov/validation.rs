//! Validation helpers for the accelerated placement solver.
//!
//! This module centralizes the consistency checks used across the solver
//! interface:
//!
//! - **Option checks** (`verify_*`): learning rate, history capacity, Wolfe
//!   constants, scale schedule, and run tolerances are finite and inside
//!   their admissible ranges.
//! - **Vector checks** (`validate_*`): coordinate vectors, gradients, and
//!   projected points have the expected dimension and finite entries.
//! - **Scalars**: [`validate_value`] checks objective outputs for finiteness.
//!
//! All helpers return domain-specific [`OptError`] variants so higher-level
//! code reports failures uniformly.
use crate::optimization::{
    errors::{OptError, OptResult},
    nesterov::types::{Coords, Grad},
};

/// Validate the base learning rate `lr0`.
///
/// # Errors
/// Returns [`OptError::InvalidLearningRate`] if `lr` is non-finite or ≤ 0.0.
pub fn verify_learning_rate(lr: f64) -> OptResult<()> {
    if !lr.is_finite() {
        return Err(OptError::InvalidLearningRate { lr, reason: "Learning rate must be finite." });
    }
    if lr <= 0.0 {
        return Err(OptError::InvalidLearningRate {
            lr,
            reason: "Learning rate must be positive.",
        });
    }
    Ok(())
}

/// Validate the curvature-pair history capacity `K`.
///
/// # Errors
/// Returns [`OptError::InvalidHistoryCapacity`] if `capacity == 0`.
pub fn verify_history_capacity(capacity: usize) -> OptResult<()> {
    if capacity == 0 {
        return Err(OptError::InvalidHistoryCapacity {
            capacity,
            reason: "History capacity must be greater than zero.",
        });
    }
    Ok(())
}

/// Validate the Wolfe constants.
///
/// Requires `0 < c1 < c2 < 1`; both must be finite.
///
/// # Errors
/// Returns [`OptError::InvalidWolfeConstants`] describing the violated bound.
pub fn verify_wolfe_constants(c1: f64, c2: f64) -> OptResult<()> {
    if !c1.is_finite() || !c2.is_finite() {
        return Err(OptError::InvalidWolfeConstants {
            c1,
            c2,
            reason: "Wolfe constants must be finite.",
        });
    }
    if c1 <= 0.0 || c2 >= 1.0 {
        return Err(OptError::InvalidWolfeConstants {
            c1,
            c2,
            reason: "Wolfe constants must lie strictly inside (0, 1).",
        });
    }
    if c1 >= c2 {
        return Err(OptError::InvalidWolfeConstants {
            c1,
            c2,
            reason: "Sufficient-decrease constant c1 must be smaller than c2.",
        });
    }
    Ok(())
}

/// Validate the backtracking shrink factor.
///
/// # Errors
/// Returns [`OptError::InvalidBacktrackFactor`] unless `0 < factor < 1`.
pub fn verify_backtrack_factor(factor: f64) -> OptResult<()> {
    if !factor.is_finite() || factor <= 0.0 || factor >= 1.0 {
        return Err(OptError::InvalidBacktrackFactor {
            factor,
            reason: "Backtracking factor must lie strictly inside (0, 1).",
        });
    }
    Ok(())
}

/// Validate the line-search trial cap.
///
/// # Errors
/// Returns [`OptError::InvalidMaxTrials`] if `max_trials == 0`.
pub fn verify_max_trials(max_trials: usize) -> OptResult<()> {
    if max_trials == 0 {
        return Err(OptError::InvalidMaxTrials {
            max_trials,
            reason: "Line search needs at least one trial.",
        });
    }
    Ok(())
}

/// Validate the initial line-search trial step.
///
/// # Errors
/// Returns [`OptError::InvalidInitialStep`] if `step` is non-finite or ≤ 0.0.
pub fn verify_initial_step(step: f64) -> OptResult<()> {
    if !step.is_finite() || step <= 0.0 {
        return Err(OptError::InvalidInitialStep {
            step,
            reason: "Initial step must be finite and positive.",
        });
    }
    Ok(())
}

/// Validate the number of scales in a multi-scale schedule.
///
/// # Errors
/// Returns [`OptError::InvalidScales`] if `scales == 0`.
pub fn verify_scales(scales: usize) -> OptResult<()> {
    if scales == 0 {
        return Err(OptError::InvalidScales {
            scales,
            reason: "At least one scale is required.",
        });
    }
    Ok(())
}

/// Validate an inner-iteration count (coarse or fine).
///
/// # Errors
/// Returns [`OptError::InvalidInnerIterations`] if `iterations == 0`.
pub fn verify_inner_iterations(iterations: usize) -> OptResult<()> {
    if iterations == 0 {
        return Err(OptError::InvalidInnerIterations {
            iterations,
            reason: "Each scale must run at least one inner step.",
        });
    }
    Ok(())
}

/// Validate the early-exit gradient-norm threshold.
///
/// Zero is accepted and disables early exit.
///
/// # Errors
/// Returns [`OptError::InvalidConvergenceThreshold`] if the threshold is
/// non-finite or negative.
pub fn verify_convergence_threshold(threshold: f64) -> OptResult<()> {
    if !threshold.is_finite() {
        return Err(OptError::InvalidConvergenceThreshold {
            threshold,
            reason: "Threshold must be finite.",
        });
    }
    if threshold < 0.0 {
        return Err(OptError::InvalidConvergenceThreshold {
            threshold,
            reason: "Threshold must be non-negative.",
        });
    }
    Ok(())
}

/// Validate the optional gradient‐norm tolerance.
///
/// - Accepts `None` (no stopping rule on gradient).
/// - If `Some`, the value must be **finite** and **strictly positive**.
///
/// # Errors
/// Returns [`OptError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost‐change tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate an initial coordinate vector.
///
/// # Errors
/// - [`OptError::EmptyCoordinates`] if `x` has no entries.
/// - [`OptError::InvalidCoordinates`] with the index/value of the first
///   non-finite entry.
pub fn validate_coords(x: &Coords) -> OptResult<()> {
    if x.is_empty() {
        return Err(OptError::EmptyCoordinates);
    }
    for (index, &value) in x.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidCoordinates {
                index,
                value,
                reason: "Coordinates must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// Checks:
/// - `grad.len() == dim`
/// - every element is finite (`NaN` or `±∞` are rejected)
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate a point returned by a constraint projector.
///
/// # Errors
/// - [`OptError::ProjectionDimMismatch`] if the projector resized the vector.
/// - [`OptError::InvalidProjection`] for the first non-finite coordinate.
pub fn validate_projection(x: &Coords, dim: usize) -> OptResult<()> {
    if x.len() != dim {
        return Err(OptError::ProjectionDimMismatch { expected: dim, found: x.len() });
    }
    match x.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OptError::InvalidProjection { index, value: x[index] }),
        None => Ok(()),
    }
}

/// Validate and unwrap a final coordinate vector.
///
/// # Errors
/// - [`OptError::MissingSolution`] if no vector was provided.
/// - [`OptError::InvalidSolution`] if any element is non-finite.
pub fn validate_solution(x: Option<Coords>) -> OptResult<Coords> {
    match x {
        Some(x) => {
            for (index, &value) in x.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidSolution {
                        index,
                        value,
                        reason: "Solution coordinates must be finite.",
                    });
                }
            }
            Ok(x)
        }
        None => Err(OptError::MissingSolution),
    }
}

/// Validate that an objective value is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Range checks for learning rate, Wolfe constants, backtracking factor
    //   and convergence threshold.
    // - Dimension and finiteness checks for gradients and projected points.
    //
    // They intentionally DO NOT cover:
    // - How the solver reacts to these errors (state left untouched); see
    //   the solver tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Reject zero, negative and non-finite learning rates.
    //
    // Given
    // -----
    // - lr ∈ {0.0, -0.1, NaN, +inf}.
    //
    // Expect
    // ------
    // - `InvalidLearningRate` for each.
    fn verify_learning_rate_rejects_non_positive_and_non_finite() {
        for lr in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            match verify_learning_rate(lr) {
                Err(OptError::InvalidLearningRate { .. }) => {}
                other => panic!("expected InvalidLearningRate for {lr}, got {other:?}"),
            }
        }
        assert!(verify_learning_rate(0.1).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Enforce the ordering `0 < c1 < c2 < 1`.
    //
    // Given
    // -----
    // - The defaults (1e-4, 0.9) and three violating pairs.
    //
    // Expect
    // ------
    // - Defaults accepted; every violating pair rejected.
    fn verify_wolfe_constants_enforces_ordering() {
        assert!(verify_wolfe_constants(1e-4, 0.9).is_ok());
        for (c1, c2) in [(0.0, 0.9), (0.5, 0.4), (1e-4, 1.0)] {
            match verify_wolfe_constants(c1, c2) {
                Err(OptError::InvalidWolfeConstants { .. }) => {}
                other => panic!("expected InvalidWolfeConstants for ({c1}, {c2}), got {other:?}"),
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Check the open interval for the shrink factor.
    //
    // Given
    // -----
    // - Factors 0.0, 1.0 and 0.5.
    //
    // Expect
    // ------
    // - Only 0.5 is accepted.
    fn verify_backtrack_factor_requires_open_unit_interval() {
        assert!(verify_backtrack_factor(0.0).is_err());
        assert!(verify_backtrack_factor(1.0).is_err());
        assert!(verify_backtrack_factor(0.5).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Zero threshold disables early exit and must be accepted; negative is
    // rejected.
    //
    // Given
    // -----
    // - Thresholds 0.0 and -1e-3.
    //
    // Expect
    // ------
    // - `Ok` then `InvalidConvergenceThreshold`.
    fn verify_convergence_threshold_accepts_zero_rejects_negative() {
        assert!(verify_convergence_threshold(0.0).is_ok());
        match verify_convergence_threshold(-1e-3) {
            Err(OptError::InvalidConvergenceThreshold { .. }) => {}
            other => panic!("expected InvalidConvergenceThreshold, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // A gradient of the wrong length is a dimension mismatch, not a
    // finiteness error.
    //
    // Given
    // -----
    // - A length-2 gradient checked against dim = 3.
    //
    // Expect
    // ------
    // - `GradientDimMismatch { expected: 3, found: 2 }`.
    fn validate_grad_reports_dimension_mismatch() {
        // Arrange
        let g = array![1.0, 2.0];

        // Act
        let err = validate_grad(&g, 3).unwrap_err();

        // Assert
        assert_eq!(err, OptError::GradientDimMismatch { expected: 3, found: 2 });
    }

    #[test]
    // Purpose
    // -------
    // Point at the first non-finite entry of a projected vector.
    //
    // Given
    // -----
    // - `[0.0, NaN, inf]` with dim = 3.
    //
    // Expect
    // ------
    // - `InvalidProjection { index: 1, .. }`.
    fn validate_projection_reports_first_non_finite_entry() {
        // Arrange
        let x = array![0.0, f64::NAN, f64::INFINITY];

        // Act
        let err = validate_projection(&x, 3).unwrap_err();

        // Assert
        match err {
            OptError::InvalidProjection { index, .. } => assert_eq!(index, 1),
            other => panic!("expected InvalidProjection, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Empty coordinate vectors cannot seed a solver.
    //
    // Given
    // -----
    // - A zero-length array.
    //
    // Expect
    // ------
    // - `EmptyCoordinates`.
    fn validate_coords_rejects_empty_vector() {
        let x = Coords::zeros(0);
        assert_eq!(validate_coords(&x).unwrap_err(), OptError::EmptyCoordinates);
    }
}
