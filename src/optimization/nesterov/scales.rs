//! nesterov::scales — hierarchical multi-scale driver.
//!
//! Purpose
//! -------
//! Wrap [`NesterovSolver`] in an outer loop over `S` scales with
//! geometrically shrinking effective learning rates. Scale `i` uses the
//! factor `2^-i` on `lr0` and on the step-size fallback bound.
//!
//! Key behaviors
//! -------------
//! - State machine: `Scale(0) → Scale(1) → … → Scale(S-1) → Done`.
//! - Scale 0 runs up to `coarse_iter` inner steps; every later scale runs up
//!   to `fine_iter`.
//! - The factor multiplies the state's unscaled base step, never a step
//!   committed at an earlier scale, so the bound at scale `i` depends only
//!   on `i` and the base.
//! - After each inner step, a gradient norm below `convergence_threshold`
//!   ends the current scale early; the scheduler moves on to the next one.
//! - Skipped steps (group without gradient) consume the inner budget and
//!   never trigger an early exit.
//!
//! Invariants & assumptions
//! ------------------------
//! - `ScaleOptions` is validated: `S >= 1`, both iteration counts `>= 1`,
//!   threshold finite and `>= 0`.
//! - An error from an inner step aborts the run and leaves the scheduler at
//!   the failing scale; the iteration state is untouched by the failed step.
//!
//! Downstream usage
//! ----------------
//! - Drivers call [`ScaleScheduler::run`] once per outer placement iteration
//!   in place of a single [`NesterovSolver::step`].
use crate::optimization::{
    errors::OptResult,
    nesterov::{
        solver::NesterovSolver,
        state::IterationState,
        traits::{ConstraintProjector, ObjectiveOracle, ScaleOptions},
    },
    numerical_stability::scale_decay,
};
use log::debug;

/// Position of the scheduler in its scale sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePhase {
    Scale(usize),
    Done,
}

/// Outcome of one scale.
///
/// - `scale`: scale index `i`.
/// - `factor`: `2^-i`.
/// - `steps`: inner steps consumed (skipped steps included).
/// - `converged`: the gradient norm fell below the threshold.
/// - `early_exit`: convergence ended the scale before its budget ran out.
/// - `last_grad_norm`: gradient norm of the last advanced step, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSummary {
    pub scale: usize,
    pub factor: f64,
    pub steps: usize,
    pub converged: bool,
    pub early_exit: bool,
    pub last_grad_norm: Option<f64>,
}

/// Per-scale summaries of a full run, in scale order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaleReport {
    pub scales: Vec<ScaleSummary>,
}

impl ScaleReport {
    pub fn total_steps(&self) -> usize {
        self.scales.iter().map(|s| s.steps).sum()
    }

    pub fn any_early_exit(&self) -> bool {
        self.scales.iter().any(|s| s.early_exit)
    }
}

/// Multi-scale scheduler; see the module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleScheduler {
    opts: ScaleOptions,
    phase: ScalePhase,
}

impl ScaleScheduler {
    pub fn new(opts: ScaleOptions) -> Self {
        Self { opts, phase: ScalePhase::Scale(0) }
    }

    pub fn options(&self) -> &ScaleOptions {
        &self.opts
    }

    pub fn phase(&self) -> ScalePhase {
        self.phase
    }

    /// Rewind to `Scale(0)`.
    pub fn reset(&mut self) {
        self.phase = ScalePhase::Scale(0);
    }

    /// Run the inner steps of the current scale and move to the next phase.
    ///
    /// Returns `Ok(None)` once the scheduler is `Done`.
    pub fn run_scale<O, P>(
        &mut self, solver: &NesterovSolver, state: &mut IterationState, oracle: &mut O,
        projector: &mut P,
    ) -> OptResult<Option<ScaleSummary>>
    where
        O: ObjectiveOracle + ?Sized,
        P: ConstraintProjector + ?Sized,
    {
        let ScalePhase::Scale(scale) = self.phase else {
            return Ok(None);
        };
        let factor = scale_decay(scale);
        let budget = self.opts.iterations_for(scale);

        let mut summary = ScaleSummary {
            scale,
            factor,
            steps: 0,
            converged: false,
            early_exit: false,
            last_grad_norm: None,
        };
        while summary.steps < budget {
            let report = solver.step_scaled(state, oracle, projector, factor)?;
            summary.steps += 1;
            if let Some(norm) = report.grad_norm() {
                summary.last_grad_norm = Some(norm);
                if norm < self.opts.convergence_threshold {
                    summary.converged = true;
                    break;
                }
            }
        }
        summary.early_exit = summary.converged && summary.steps < budget;
        if summary.early_exit {
            debug!(
                "scale {scale}: converged after {}/{budget} steps (||g|| = {:.3e})",
                summary.steps,
                summary.last_grad_norm.unwrap_or(0.0)
            );
        }

        self.phase =
            if scale + 1 < self.opts.scales { ScalePhase::Scale(scale + 1) } else { ScalePhase::Done };
        Ok(Some(summary))
    }

    /// Run every scale from `Scale(0)` to `Done`.
    ///
    /// # Errors
    /// Propagates the first inner-step error; see [`NesterovSolver::step`].
    pub fn run<O, P>(
        &mut self, solver: &NesterovSolver, state: &mut IterationState, oracle: &mut O,
        projector: &mut P,
    ) -> OptResult<ScaleReport>
    where
        O: ObjectiveOracle + ?Sized,
        P: ConstraintProjector + ?Sized,
    {
        self.reset();
        let mut report = ScaleReport::default();
        while let Some(summary) = self.run_scale(solver, state, oracle, projector)? {
            report.scales.push(summary);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::OptError,
        nesterov::{
            traits::{Evaluation, NesterovOptions, StepRule},
            types::{Coords, Cost, Grad},
        },
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Phase transitions and per-scale budgets.
    // - Early exit on the gradient-norm threshold.
    // - Skipped groups consuming the budget without state change.
    // - Error propagation from inner steps.
    // - A scale decay that stays relative to the unscaled base.
    //
    // They intentionally DO NOT cover:
    // - The arithmetic of a single step; see the solver tests.
    // -------------------------------------------------------------------------

    fn shifted_quadratic(x: &Coords) -> (Cost, Grad) {
        let r = x - 3.0;
        (r.dot(&r), 2.0 * &r)
    }

    fn identity(_: &mut Coords) {}

    fn solver() -> NesterovSolver {
        NesterovSolver::new(NesterovOptions::with_rule(0.1, StepRule::default()).unwrap())
    }

    #[test]
    // Purpose
    // -------
    // A converged coarse scale stops early and hands over to the next scale.
    //
    // Given
    // -----
    // - f(x) = (x - 3)², x0 = 0, lr0 = 0.1; S = 3, coarse_iter = 10,
    //   fine_iter = 1, threshold 1e-3. The first step lands on x = 3, so the
    //   second step sees a zero gradient.
    //
    // Expect
    // ------
    // - Scale 0: 2 steps, early exit.
    // - Three summaries with factors 1, 0.5, 0.25; scheduler ends `Done`.
    // - `eval_count` equals the total number of steps.
    fn coarse_scale_exits_early_on_small_gradient() {
        // Arrange
        let opts = ScaleOptions::new(3, 10, 1, 1e-3).unwrap();
        let mut sched = ScaleScheduler::new(opts);
        let mut state = IterationState::new(array![0.0]).unwrap();

        // Act
        let report =
            sched.run(&solver(), &mut state, &mut shifted_quadratic, &mut identity).unwrap();

        // Assert
        assert_eq!(report.scales.len(), 3);
        let coarse = report.scales[0];
        assert_eq!(coarse.steps, 2);
        assert!(coarse.converged);
        assert!(coarse.early_exit);
        assert_eq!(coarse.last_grad_norm, Some(0.0));
        let factors: Vec<f64> = report.scales.iter().map(|s| s.factor).collect();
        assert_eq!(factors, vec![1.0, 0.5, 0.25]);
        assert!(report.any_early_exit());
        assert_eq!(sched.phase(), ScalePhase::Done);
        assert_eq!(state.eval_count(), report.total_steps());
        assert!((state.v()[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // With early exit disabled every scale spends its full budget.
    //
    // Given
    // -----
    // - The same problem, S = 3, coarse_iter = 4, fine_iter = 2, threshold 0.
    //
    // Expect
    // ------
    // - Steps [4, 2, 2], no early exit, `eval_count == 8`.
    fn zero_threshold_runs_full_budgets() {
        // Arrange
        let opts = ScaleOptions::new(3, 4, 2, 0.0).unwrap();
        let mut sched = ScaleScheduler::new(opts);
        let mut state = IterationState::new(array![0.0]).unwrap();

        // Act
        let report =
            sched.run(&solver(), &mut state, &mut shifted_quadratic, &mut identity).unwrap();

        // Assert
        let steps: Vec<usize> = report.scales.iter().map(|s| s.steps).collect();
        assert_eq!(steps, vec![4, 2, 2]);
        assert!(!report.any_early_exit());
        assert_eq!(state.eval_count(), 8);
    }

    #[test]
    // Purpose
    // -------
    // Phases advance one scale per `run_scale` call and stop at `Done`.
    //
    // Given
    // -----
    // - S = 2, coarse_iter = 1, fine_iter = 1.
    //
    // Expect
    // ------
    // - Scale(0) → Scale(1) → Done, then `Ok(None)`.
    fn run_scale_walks_the_phase_sequence() {
        // Arrange
        let mut sched = ScaleScheduler::new(ScaleOptions::new(2, 1, 1, 0.0).unwrap());
        let mut state = IterationState::new(array![0.0]).unwrap();
        let solver = solver();

        // Act / Assert
        assert_eq!(sched.phase(), ScalePhase::Scale(0));
        let first =
            sched.run_scale(&solver, &mut state, &mut shifted_quadratic, &mut identity).unwrap();
        assert_eq!(first.map(|s| s.scale), Some(0));
        assert_eq!(sched.phase(), ScalePhase::Scale(1));
        let second =
            sched.run_scale(&solver, &mut state, &mut shifted_quadratic, &mut identity).unwrap();
        assert_eq!(second.map(|s| s.scale), Some(1));
        assert_eq!(sched.phase(), ScalePhase::Done);
        let none =
            sched.run_scale(&solver, &mut state, &mut shifted_quadratic, &mut identity).unwrap();
        assert!(none.is_none());
    }

    #[test]
    // Purpose
    // -------
    // A group without gradient consumes each budget and stays untouched.
    //
    // Given
    // -----
    // - An oracle with `has_gradient() == false`; S = 2, coarse_iter = 3.
    //
    // Expect
    // ------
    // - Steps [3, 1], no convergence, no `last_grad_norm`, state unchanged.
    fn skipped_group_consumes_budget() {
        // Arrange
        struct Frozen;
        impl ObjectiveOracle for Frozen {
            fn evaluate(&mut self, _: &Coords) -> OptResult<Evaluation> {
                panic!("a frozen group must not be evaluated");
            }
            fn has_gradient(&self) -> bool {
                false
            }
        }
        let mut sched = ScaleScheduler::new(ScaleOptions::new(2, 3, 1, 1e-3).unwrap());
        let mut state = IterationState::new(array![1.0, 2.0]).unwrap();
        let before = state.clone();

        // Act
        let report = sched.run(&solver(), &mut state, &mut Frozen, &mut identity).unwrap();

        // Assert
        let steps: Vec<usize> = report.scales.iter().map(|s| s.steps).collect();
        assert_eq!(steps, vec![3, 1]);
        assert!(report.scales.iter().all(|s| !s.converged && s.last_grad_norm.is_none()));
        assert_eq!(state, before);
    }

    #[test]
    // Purpose
    // -------
    // The scale factor is applied to an unscaled base, so repeated runs keep
    // the same per-scale fallback bound instead of shrinking it every scale.
    //
    // Given
    // -----
    // - f(x) = x (gradient ≡ 1, so `y = 0` and BB always falls back to the
    //   bound), x0 = 0, lr0 = 0.1; S = 3, coarse_iter = 10, fine_iter = 1,
    //   threshold 0; `run` called 12 times.
    //
    // Expect
    // ------
    // - After every run: step size 0.1 · 2⁻² = 0.025, base step 0.1.
    // - u keeps decreasing by at least the step each inner step, ending
    //   below -12.
    fn repeated_runs_do_not_compound_the_scale_decay() {
        // Arrange
        let mut sched = ScaleScheduler::new(ScaleOptions::new(3, 10, 1, 0.0).unwrap());
        let mut state = IterationState::new(array![0.0]).unwrap();
        let mut linear = |x: &Coords| (x[0], Coords::ones(x.len()));
        let solver = solver();

        for _ in 0..12 {
            // Act
            let report = sched.run(&solver, &mut state, &mut linear, &mut identity).unwrap();

            // Assert
            assert_eq!(report.total_steps(), 12);
            assert_relative_eq!(state.step_size().unwrap(), 0.025, epsilon = 1e-15);
            assert_relative_eq!(state.base_step().unwrap(), 0.1, epsilon = 1e-15);
        }
        assert!(state.u()[0] < -12.0, "u stalled at {}", state.u()[0]);
    }

    #[test]
    // Purpose
    // -------
    // Inner-step errors abort the run at the failing scale.
    //
    // Given
    // -----
    // - A 1-D state and an oracle returning a 2-element gradient.
    //
    // Expect
    // ------
    // - `GradientDimMismatch`; the scheduler remains at `Scale(0)`.
    fn inner_error_aborts_run() {
        // Arrange
        let mut sched = ScaleScheduler::new(ScaleOptions::default());
        let mut state = IterationState::new(array![0.0]).unwrap();
        let mut oracle = |_: &Coords| (0.0, array![1.0, 1.0]);

        // Act
        let err = sched.run(&solver(), &mut state, &mut oracle, &mut identity).unwrap_err();

        // Assert
        assert_eq!(err, OptError::GradientDimMismatch { expected: 1, found: 2 });
        assert_eq!(sched.phase(), ScalePhase::Scale(0));
        assert_eq!(state.eval_count(), 0);
    }
}
