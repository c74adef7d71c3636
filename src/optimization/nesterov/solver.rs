//! nesterov::solver — one accelerated-gradient step for one parameter group.
//!
//! Purpose
//! -------
//! Orchestrate a single solver step: evaluate the oracle at the extrapolated
//! point `v` and at the previous extrapolated point `v_prev`, obtain a step
//! size from the configured [`StepSizeEstimator`], compute the descent point
//! `u_next` and the Nesterov extrapolation `v_next`, hand `v_next` to the
//! constraint projector, and commit the result into the
//! [`IterationState`].
//!
//! Key behaviors
//! -------------
//! - First step: `v_prev` is seeded as `v - lr0·g` and the fallback bound is
//!   `||v - v_prev|| / ||g - g_prev||` (or `lr0` if that ratio is
//!   degenerate).
//! - With the BB and quasi-Newton rules each step spends exactly two oracle
//!   evaluations and one projector call; the Wolfe rule adds its trial
//!   evaluations.
//! - A group whose oracle reports no gradient is skipped without any
//!   state change: either up front through `has_gradient() == false`, or
//!   when an evaluation returns [`OptError::GradientUnavailable`].
//! - [`NesterovSolver::step_scaled`] multiplies `lr0` and the fallback bound
//!   by a scale factor; the multi-scale scheduler drives it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every error is raised before the commit, so a failed step leaves the
//!   state exactly as it was.
//! - Oracle output is validated (length, finiteness) before it reaches the
//!   estimator; projector output is validated before the commit.
//!
//! Downstream usage
//! ----------------
//! - Drivers call [`NesterovSolver::step`] once per outer placement
//!   iteration and read [`IterationState::v`] afterwards.
//! - [`StepReport`] carries per-step diagnostics for logging and for the
//!   scale scheduler's early-exit test.
use crate::optimization::{
    errors::{OptError, OptResult},
    nesterov::{
        state::IterationState,
        step_size::{StepInputs, StepSizeEstimator, StepSource, initial_step_size},
        traits::{ConstraintProjector, Evaluation, NesterovOptions, ObjectiveOracle},
        types::{Coords, Cost, Grad},
        validation::{validate_grad, validate_projection, validate_value},
    },
    numerical_stability::is_positive_finite,
};
use argmin_math::ArgminL2Norm;
use log::debug;

/// Diagnostics of one committed step.
///
/// - `cost`: objective at the evaluated point `v`.
/// - `cost_prev`: objective at `v_prev`.
/// - `grad_norm`: `||g||₂` at `v`.
/// - `step_size`: step used for `u_next = v - step_size·g`.
/// - `source`: which estimate produced `step_size`.
/// - `coef`: momentum coefficient used in the extrapolation.
/// - `line_search_evals`: extra oracle evaluations (Wolfe rule only).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDiagnostics {
    pub cost: Cost,
    pub cost_prev: Cost,
    pub grad_norm: f64,
    pub step_size: f64,
    pub source: StepSource,
    pub coef: f64,
    pub line_search_evals: usize,
}

/// Result of [`NesterovSolver::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepReport {
    /// The oracle reported no gradient; the state was left unchanged.
    Skipped,
    Advanced(StepDiagnostics),
}

impl StepReport {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StepReport::Skipped)
    }

    /// Gradient norm at the evaluated point, `None` for a skipped step.
    pub fn grad_norm(&self) -> Option<f64> {
        match self {
            StepReport::Skipped => None,
            StepReport::Advanced(diag) => Some(diag.grad_norm),
        }
    }

    pub fn diagnostics(&self) -> Option<&StepDiagnostics> {
        match self {
            StepReport::Skipped => None,
            StepReport::Advanced(diag) => Some(diag),
        }
    }
}

/// Accelerated-gradient solver; stateless apart from its configuration.
///
/// The same solver can drive any number of independent [`IterationState`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct NesterovSolver {
    opts: NesterovOptions,
    estimator: StepSizeEstimator,
}

impl NesterovSolver {
    pub fn new(opts: NesterovOptions) -> Self {
        let estimator = StepSizeEstimator::from_options(&opts);
        Self { opts, estimator }
    }

    pub fn options(&self) -> &NesterovOptions {
        &self.opts
    }

    pub fn estimator(&self) -> &StepSizeEstimator {
        &self.estimator
    }

    /// Advance `state` by one accelerated step.
    ///
    /// Errors
    /// ------
    /// - [`OptError::GradientDimMismatch`] / [`OptError::InvalidGradient`] /
    ///   [`OptError::NonFiniteCost`] for malformed oracle output.
    /// - [`OptError::ProjectionDimMismatch`] / [`OptError::InvalidProjection`]
    ///   if the projector resized `v_next` or left a non-finite entry.
    /// - Any error returned by the oracle or projector, except
    ///   [`OptError::GradientUnavailable`], which yields
    ///   [`StepReport::Skipped`].
    ///
    /// In every error case `state` is unchanged.
    pub fn step<O, P>(
        &self, state: &mut IterationState, oracle: &mut O, projector: &mut P,
    ) -> OptResult<StepReport>
    where
        O: ObjectiveOracle + ?Sized,
        P: ConstraintProjector + ?Sized,
    {
        self.step_scaled(state, oracle, projector, 1.0)
    }

    /// [`step`](Self::step) with `lr0` and the fallback bound multiplied by
    /// `factor`.
    ///
    /// The bound is `factor` times the state's unscaled
    /// [`base_step`](IterationState::base_step); the committed base divides
    /// `factor` back out, so repeated scaled steps do not compound. A factor
    /// that is not positive and finite, or that would make the bound so, is
    /// treated as `1`.
    pub fn step_scaled<O, P>(
        &self, state: &mut IterationState, oracle: &mut O, projector: &mut P, factor: f64,
    ) -> OptResult<StepReport>
    where
        O: ObjectiveOracle + ?Sized,
        P: ConstraintProjector + ?Sized,
    {
        if !oracle.has_gradient() {
            debug!("Group without gradient skipped (step {})", state.eval_count());
            return Ok(StepReport::Skipped);
        }
        match self.advance(state, oracle, projector, factor) {
            Err(OptError::GradientUnavailable) => {
                debug!("Oracle reported no gradient; step {} skipped", state.eval_count());
                Ok(StepReport::Skipped)
            }
            other => other,
        }
    }

    fn advance<O, P>(
        &self, state: &mut IterationState, oracle: &mut O, projector: &mut P, factor: f64,
    ) -> OptResult<StepReport>
    where
        O: ObjectiveOracle + ?Sized,
        P: ConstraintProjector + ?Sized,
    {
        let dim = state.dim();

        let Evaluation { cost, grad: g } = evaluate_checked(oracle, state.v(), dim)?;

        let factor = if is_positive_finite(factor) { factor } else { 1.0 };
        let lr = self.opts.lr0 * factor;
        let lr = if is_positive_finite(lr) { lr } else { self.opts.lr0 };
        let seed = state.is_fresh().then(|| {
            let mut seed = state.v().clone();
            seed.scaled_add(-lr, &g);
            seed
        });
        let v_prev = seed.as_ref().or(state.v_prev()).ok_or_else(|| OptError::PotentialBug {
            text: "running state without a previous point".to_string(),
        })?;

        let Evaluation { cost: cost_prev, grad: g_prev } = evaluate_checked(oracle, v_prev, dim)?;

        // Fallback bound is `base * factor`; `base` is stored unscaled.
        let base = match state.base_step() {
            Some(base) => base,
            None => initial_step_size(&(state.v() - v_prev), &(&g - &g_prev), self.opts.lr0),
        };
        let (alpha_prev, bound_factor) = match base * factor {
            scaled if is_positive_finite(scaled) => (scaled, factor),
            _ => (base, 1.0),
        };

        let inputs = StepInputs { v: state.v(), v_prev, g: &g, g_prev: &g_prev, cost, alpha_prev };
        let estimate = self.estimator.estimate(&inputs, state.history(), oracle)?;
        let momentum = state.acceleration().peek();

        let v_next = state.stage(estimate.step, momentum.coef, &g);
        let projected = projector.project(v_next).and_then(|()| validate_projection(v_next, dim));
        if let Err(err) = projected {
            state.reset_scratch();
            return Err(err);
        }

        let diagnostics = StepDiagnostics {
            cost,
            cost_prev,
            grad_norm: g.l2_norm(),
            step_size: estimate.step,
            source: estimate.source,
            coef: momentum.coef,
            line_search_evals: estimate.line_search_evals,
        };
        let capacity = self.estimator.uses_history().then_some(self.opts.history_capacity);
        let next_base = estimate.step / bound_factor;
        let next_base = if is_positive_finite(next_base) { next_base } else { estimate.step };
        state.commit(estimate.step, next_base, momentum, estimate.pending_pair, seed, capacity)?;

        debug!(
            "step {}: cost = {cost:.6e}, ||g|| = {:.3e}, step = {:.3e} ({}), coef = {:.4}",
            state.eval_count(),
            diagnostics.grad_norm,
            diagnostics.step_size,
            diagnostics.source.as_str(),
            diagnostics.coef
        );
        Ok(StepReport::Advanced(diagnostics))
    }

    /// Full two-loop direction `r ≈ H⁻¹ g` over the group's curvature history.
    ///
    /// The quasi-Newton rule only uses `||r|| / ||g||`; this exposes the
    /// direction itself. `None` when the state keeps no history.
    pub fn quasi_newton_direction(&self, state: &IterationState, g: &Grad) -> Option<Grad> {
        state.history().map(|hist| hist.two_loop(g))
    }
}

fn evaluate_checked<O>(oracle: &mut O, x: &Coords, dim: usize) -> OptResult<Evaluation>
where
    O: ObjectiveOracle + ?Sized,
{
    let eval = oracle.evaluate(x)?;
    validate_grad(&eval.grad, dim)?;
    validate_value(eval.cost)?;
    Ok(eval)
}
