//! nesterov::finite_diff — gradient-free objectives as solver oracles.
//!
//! Purpose
//! -------
//! Let drivers hand the solver a cost-only objective. [`FiniteDiffOracle`]
//! evaluates the cost and approximates its gradient with the `finitediff`
//! crate, so the rest of the solver never sees the difference between an
//! analytic and a numerical gradient.
//!
//! Key behaviors
//! -------------
//! - Central differences first; if any sample fails or the central gradient
//!   is not finite, retry once with forward differences.
//! - Errors raised by the cost closure during differencing are captured in
//!   a shared cell (the `finitediff` closures must return `f64`) and
//!   surfaced after the sweep.
//! - Implements [`ObjectiveOracle`] for direct use with
//!   [`NesterovSolver`](crate::optimization::nesterov::solver::NesterovSolver)
//!   and argmin's `CostFunction` / `Gradient` for
//!   [`run_nesterov`](crate::optimization::nesterov::run::run_nesterov).
//!
//! Invariants & assumptions
//! ------------------------
//! - Every cost value handed out is finite; a non-finite value is reported
//!   as [`OptError::NonFiniteCost`].
//! - Every gradient handed out passes [`validate_grad`].
//!
//! Conventions
//! -----------
//! - Each gradient costs `2n` (central) or `n + 1` (forward) cost
//!   evaluations for `n` coordinates; [`FiniteDiffOracle::cost_evals`]
//!   counts all of them.
//!
//! Testing notes
//! -------------
//! - Unit tests compare against an analytic gradient, exercise the forward
//!   fallback at a domain boundary, and check error propagation.
use crate::optimization::{
    errors::{OptError, OptResult},
    nesterov::{
        traits::{Evaluation, ObjectiveOracle},
        types::{Coords, Cost, Grad},
        validation::{validate_grad, validate_value},
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;
use log::debug;
use std::cell::{Cell, RefCell};

/// Cost-only objective with a finite-difference gradient.
///
/// `F` maps a point to its cost and may fail with an [`OptError`] (for
/// example outside the objective's domain).
#[derive(Debug)]
pub struct FiniteDiffOracle<F> {
    cost: F,
    evals: Cell<usize>,
}

impl<F> FiniteDiffOracle<F>
where
    F: Fn(&Coords) -> OptResult<Cost>,
{
    pub fn new(cost: F) -> Self {
        Self { cost, evals: Cell::new(0) }
    }

    /// Number of cost evaluations so far, difference samples included.
    pub fn cost_evals(&self) -> usize {
        self.evals.get()
    }

    /// Validated cost at `x`.
    ///
    /// # Errors
    /// - Any error of the cost closure.
    /// - [`OptError::NonFiniteCost`] for a `NaN` or infinite value.
    pub fn value(&self, x: &Coords) -> OptResult<Cost> {
        self.evals.set(self.evals.get() + 1);
        let value = (self.cost)(x)?;
        validate_value(value)?;
        Ok(value)
    }

    /// Finite-difference gradient at `x`.
    ///
    /// Parameters
    /// ----------
    /// - `x`: point at which to differentiate; its length fixes the gradient
    ///   dimension.
    ///
    /// Returns
    /// -------
    /// The central-difference gradient when it is clean, otherwise the
    /// forward-difference gradient.
    ///
    /// Errors
    /// ------
    /// - The first error raised by the cost closure during the forward sweep.
    /// - [`OptError::InvalidGradient`] if the forward gradient is not finite.
    pub fn gradient_at(&self, x: &Coords) -> OptResult<Grad> {
        let dim = x.len();
        let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
        let sample = |p: &Coords| -> f64 {
            match self.value(p) {
                Ok(value) => value,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };

        let central = x.central_diff(&sample);
        let central_failed = closure_err.borrow().is_some();
        if !central_failed && validate_grad(&central, dim).is_ok() {
            return Ok(central);
        }

        debug!("Central difference unusable at dim {dim}; retrying with forward differences");
        closure_err.replace(None);
        let forward = x.forward_diff(&sample);
        if let Some(err) = closure_err.take() {
            return Err(err);
        }
        validate_grad(&forward, dim)?;
        Ok(forward)
    }
}

impl<F> ObjectiveOracle for FiniteDiffOracle<F>
where
    F: Fn(&Coords) -> OptResult<Cost>,
{
    fn evaluate(&mut self, x: &Coords) -> OptResult<Evaluation> {
        let cost = self.value(x)?;
        let grad = self.gradient_at(x)?;
        Ok(Evaluation::new(cost, grad))
    }
}

impl<F> CostFunction for FiniteDiffOracle<F>
where
    F: Fn(&Coords) -> OptResult<Cost>,
{
    type Param = Coords;
    type Output = Cost;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.value(x)?)
    }
}

impl<F> Gradient for FiniteDiffOracle<F>
where
    F: Fn(&Coords) -> OptResult<Cost>,
{
    type Param = Coords;
    type Gradient = Grad;

    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.gradient_at(x)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement of the central-difference gradient with an analytic one.
    // - The forward-difference retry when central samples leave the domain.
    // - Propagation of closure errors and non-finite costs.
    //
    // They intentionally DO NOT cover:
    // - Use inside the solver loop; see the integration tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Central differences reproduce a smooth analytic gradient.
    //
    // Given
    // -----
    // - f(x) = Σ (i + 1)(x_i - i)² at x = (0.5, -1, 2).
    //
    // Expect
    // ------
    // - Gradient within 1e-5 of `2 (i + 1)(x_i - i)`.
    // - `cost_evals` counts the value plus `2n` samples.
    fn central_difference_matches_analytic_gradient() {
        // Arrange
        let mut oracle = FiniteDiffOracle::new(|x: &Coords| {
            Ok(x.iter().enumerate().map(|(i, v)| (i + 1) as f64 * (v - i as f64).powi(2)).sum())
        });
        let x = array![0.5, -1.0, 2.0];

        // Act
        let eval = oracle.evaluate(&x).unwrap();

        // Assert
        for (i, g) in eval.grad.iter().enumerate() {
            let expected = 2.0 * (i + 1) as f64 * (x[i] - i as f64);
            assert_relative_eq!(*g, expected, epsilon = 1e-5);
        }
        assert_eq!(oracle.cost_evals(), 1 + 2 * 3);
    }

    #[test]
    // Purpose
    // -------
    // At a domain boundary the backward sample fails and forward differences
    // take over.
    //
    // Given
    // -----
    // - f(x) = x² for x >= 0, an `OracleFailure` for x < 0, evaluated at 0.
    //
    // Expect
    // ------
    // - `Ok(grad)` with a small non-negative forward slope.
    fn boundary_point_falls_back_to_forward_difference() {
        // Arrange
        let oracle = FiniteDiffOracle::new(|x: &Coords| {
            if x[0] < 0.0 {
                Err(OptError::OracleFailure { text: "negative coordinate".to_string() })
            } else {
                Ok(x[0] * x[0])
            }
        });

        // Act
        let grad = oracle.gradient_at(&array![0.0]).unwrap();

        // Assert
        assert!(grad[0] >= 0.0 && grad[0] < 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // A closure that fails everywhere surfaces its own error.
    //
    // Given
    // -----
    // - A cost closure that always returns `OracleFailure`.
    //
    // Expect
    // ------
    // - `gradient_at` returns that `OracleFailure`.
    fn closure_error_is_propagated() {
        let oracle = FiniteDiffOracle::new(|_: &Coords| -> OptResult<Cost> {
            Err(OptError::OracleFailure { text: "boom".to_string() })
        });
        match oracle.gradient_at(&array![1.0, 2.0]) {
            Err(OptError::OracleFailure { text }) => assert_eq!(text, "boom"),
            other => panic!("expected OracleFailure, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Non-finite costs never leave the oracle.
    //
    // Given
    // -----
    // - A cost closure returning `+∞`.
    //
    // Expect
    // ------
    // - `value` and the argmin `cost` both fail.
    fn non_finite_cost_is_rejected() {
        let oracle = FiniteDiffOracle::new(|_: &Coords| Ok(f64::INFINITY));
        assert_eq!(oracle.value(&array![0.0]), Err(OptError::NonFiniteCost { value: f64::INFINITY }));
        assert!(oracle.cost(&array![0.0]).is_err());
    }
}
