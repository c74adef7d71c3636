//! Wolfe backtracking line search.
//!
//! Starting from `initial_step`, the trial step is multiplied by the
//! backtracking factor until both Wolfe conditions hold at `x + α d`:
//!
//! ```text
//! Armijo:     f(x + α d) <= f(x) + c1 α (g·d)
//! curvature:  g(x + α d)·d >= c2 (g·d)
//! ```
//!
//! The search is bounded by `max_trials` oracle evaluations. Exhausting the
//! budget is reported as [`OptError::LineSearchFailed`]; the caller decides
//! the fallback step. Trials that return a non-finite cost or gradient are
//! treated as rejected and shrink the step like any other failure.
use crate::optimization::{
    errors::{OptError, OptResult},
    nesterov::{
        traits::{ObjectiveOracle, WolfeOptions},
        types::{Coords, Cost, Grad},
    },
};

/// Accepted step of a successful search.
///
/// - `alpha`: step length along the search direction.
/// - `cost`: objective at the accepted point.
/// - `evals`: oracle evaluations spent, including the accepted one.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSearchOutcome {
    pub alpha: f64,
    pub cost: Cost,
    pub evals: usize,
}

/// Backtracking search for a step satisfying both Wolfe conditions.
///
/// Parameters
/// ----------
/// - `oracle`: objective oracle evaluated at every trial point.
/// - `x`: base point.
/// - `cost`: objective at `x`.
/// - `grad`: gradient at `x`.
/// - `direction`: search direction `d`; must satisfy `g·d < 0`.
/// - `opts`: Wolfe constants, shrink factor, trial cap, initial step.
///
/// Returns
/// -------
/// The first trial step that satisfies Armijo and curvature conditions.
///
/// Errors
/// ------
/// - [`OptError::NotDescentDirection`] if `g·d >= 0` or is not finite; no
///   evaluation is spent.
/// - [`OptError::LineSearchFailed`] after `max_trials` rejected trials.
/// - [`OptError::GradientDimMismatch`] if the oracle returns a gradient of the
///   wrong length; oracle errors are propagated unchanged.
pub fn wolfe_backtracking<O>(
    oracle: &mut O, x: &Coords, cost: Cost, grad: &Grad, direction: &Coords, opts: &WolfeOptions,
) -> OptResult<LineSearchOutcome>
where
    O: ObjectiveOracle + ?Sized,
{
    let slope = grad.dot(direction);
    if !slope.is_finite() || slope >= 0.0 {
        return Err(OptError::NotDescentDirection { slope });
    }

    let dim = x.len();
    let mut alpha = opts.initial_step;
    let mut trial = x.clone();
    for attempt in 1..=opts.max_trials {
        trial.assign(x);
        trial.scaled_add(alpha, direction);

        let eval = oracle.evaluate(&trial)?;
        if eval.grad.len() != dim {
            return Err(OptError::GradientDimMismatch { expected: dim, found: eval.grad.len() });
        }
        let finite = eval.cost.is_finite() && eval.grad.iter().all(|v| v.is_finite());
        if finite {
            let armijo = eval.cost <= cost + opts.c1 * alpha * slope;
            let curvature = eval.grad.dot(direction) >= opts.c2 * slope;
            if armijo && curvature {
                return Ok(LineSearchOutcome { alpha, cost: eval.cost, evals: attempt });
            }
        }
        alpha *= opts.backtrack;
    }
    Err(OptError::LineSearchFailed { trials: opts.max_trials, alpha })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::nesterov::traits::Evaluation;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Termination on a convex quadratic with both Wolfe conditions holding
    //   at the accepted step.
    // - Failure reporting when the trial cap is exhausted.
    // - Rejection of ascent directions before any evaluation.
    //
    // They intentionally DO NOT cover:
    // - The fallback applied by the step-size estimator on failure.
    // -------------------------------------------------------------------------

    fn quadratic(x: &Coords) -> (Cost, Grad) {
        // f(x) = Σ (i+1)(x_i - 1)²
        let w = Coords::from_iter((0..x.len()).map(|i| (i + 1) as f64));
        let r = x - 1.0;
        ((&w * &r * &r).sum(), 2.0 * &w * &r)
    }

    #[test]
    // Purpose
    // -------
    // On a convex quadratic the search terminates within the cap and the
    // accepted step satisfies Armijo and curvature conditions.
    //
    // Given
    // -----
    // - f(x) = (x₀ - 1)² + 2(x₁ - 1)², x = (-2, 4), d = -g, default options.
    //
    // Expect
    // ------
    // - `Ok(outcome)` with `evals <= max_trials`.
    // - Both inequalities hold when recomputed at `x + α d`.
    fn wolfe_backtracking_on_convex_quadratic_satisfies_both_conditions() {
        // Arrange
        let opts = WolfeOptions::default();
        let x = array![-2.0, 4.0];
        let (f0, g0) = quadratic(&x);
        let d = -&g0;
        let mut oracle = quadratic;

        // Act
        let out = wolfe_backtracking(&mut oracle, &x, f0, &g0, &d, &opts).unwrap();

        // Assert
        assert!(out.evals >= 1 && out.evals <= opts.max_trials);
        let x_new = &x + &(out.alpha * &d);
        let (f_new, g_new) = quadratic(&x_new);
        let slope = g0.dot(&d);
        assert!(f_new <= f0 + opts.c1 * out.alpha * slope);
        assert!(g_new.dot(&d) >= opts.c2 * slope);
        assert_eq!(f_new, out.cost);
    }

    #[test]
    // Purpose
    // -------
    // A budget too small to reach an acceptable step yields `LineSearchFailed`
    // with the number of trials spent.
    //
    // Given
    // -----
    // - f(x) = x², x = 1, d = -g = -2, initial step 100, max_trials = 2.
    //   Trials at α = 100 and 50 both overshoot badly.
    //
    // Expect
    // ------
    // - `Err(LineSearchFailed { trials: 2, .. })`.
    fn wolfe_backtracking_reports_failure_when_cap_is_hit() {
        // Arrange
        let opts = WolfeOptions::new(1e-4, 0.9, 0.5, 2, 100.0).unwrap();
        let x = array![1.0];
        let mut oracle = |x: &Coords| (x[0] * x[0], array![2.0 * x[0]]);
        let g = array![2.0];
        let d = array![-2.0];

        // Act
        let err = wolfe_backtracking(&mut oracle, &x, 1.0, &g, &d, &opts).unwrap_err();

        // Assert
        match err {
            OptError::LineSearchFailed { trials, .. } => assert_eq!(trials, 2),
            other => panic!("expected LineSearchFailed, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Ascent directions are refused without spending evaluations.
    //
    // Given
    // -----
    // - g = [1], d = [1] and an oracle that counts calls.
    //
    // Expect
    // ------
    // - `NotDescentDirection` and zero oracle calls.
    fn wolfe_backtracking_rejects_ascent_direction() {
        // Arrange
        struct Counting(usize);
        impl ObjectiveOracle for Counting {
            fn evaluate(&mut self, x: &Coords) -> OptResult<Evaluation> {
                self.0 += 1;
                Ok(Evaluation::new(0.0, x.clone()))
            }
        }
        let mut oracle = Counting(0);

        // Act
        let err = wolfe_backtracking(
            &mut oracle,
            &array![0.0],
            0.0,
            &array![1.0],
            &array![1.0],
            &WolfeOptions::default(),
        )
        .unwrap_err();

        // Assert
        assert_eq!(err, OptError::NotDescentDirection { slope: 1.0 });
        assert_eq!(oracle.0, 0);
    }
}
