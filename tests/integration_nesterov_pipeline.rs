//! Integration tests for the accelerated placement solver.
//!
//! Purpose
//! -------
//! - Validate the end-to-end solver pipeline through the public crate
//!   surface: option construction, per-group iteration state, single steps,
//!   multi-scale sweeps, finite-difference oracles, projectors, and the
//!   argmin-backed runner.
//! - Exercise every step rule on small but non-trivial problems rather
//!   than on the hand-computed single-step cases of the unit tests.
//!
//! Coverage
//! --------
//! - `optimization::nesterov::solver`:
//!   - Monotone convergence on a 1-D quadratic and `eval_count` bookkeeping.
//!   - Step-at-a-time driving with a finite-difference oracle and a box
//!     projector.
//!   - Aborted steps leaving the iteration state untouched.
//! - `optimization::nesterov::scales`:
//!   - Early exit at the coarse scale and the full scale sequence.
//! - `optimization::nesterov::run`:
//!   - Executor runs under each step rule on an anisotropic bowl.
//!
//! Exclusions
//! ----------
//! - Estimator arithmetic, history eviction, and acceleration recurrence:
//!   covered by unit tests next to each module.
//! - Python bindings: expected to be tested from Python against the
//!   `_rust_placement` extension module.
use approx::assert_relative_eq;
use ndarray::array;
use rust_placement::optimization::{
    errors::{OptError, OptResult},
    nesterov::{
        FiniteDiffOracle,
        prelude::*,
        traits::{BbPreference, WolfeOptions},
    },
};

/// Purpose
/// -------
/// Objective `f(x) = Σ (x_i - 3)²` with its analytic gradient.
///
/// Usage
/// -----
/// - Shared by the single-step and multi-scale tests; the minimizer is the
///   all-threes vector.
fn shifted_quadratic(x: &Coords) -> (Cost, Grad) {
    let r = x - 3.0;
    (r.dot(&r), 2.0 * r)
}

fn no_projection(_: &mut Coords) {}

/// Purpose
/// -------
/// Cost-only anisotropic bowl `f(x) = (x₀ - 1)² + 5 (x₁ + 2)²` for the
/// finite-difference runs.
fn bowl_cost(x: &Coords) -> OptResult<Cost> {
    Ok((x[0] - 1.0).powi(2) + 5.0 * (x[1] + 2.0).powi(2))
}

#[test]
// Purpose
// -------
// Drive the solver step by step on the 1-D quadratic and check that the
// accepted solution approaches the minimizer monotonically.
//
// Given
// -----
// - f(x) = (x - 3)², identity projector, x0 = 0, lr0 = 0.1, BB rule.
//
// Expect
// ------
// - |u - 3| never increases and is below 1e-4 after 50 steps.
// - `eval_count` equals the number of `step` calls.
// - Every committed step size is strictly positive and finite.
fn quadratic_pipeline_converges_monotonically() {
    let opts = NesterovOptions::with_rule(0.1, StepRule::BarzilaiBorwein).unwrap();
    let solver = NesterovSolver::new(opts);
    let mut state = IterationState::new(array![0.0]).unwrap();
    let mut oracle = shifted_quadratic;
    let mut projector = no_projection;
    let mut last_gap = 3.0;

    for k in 1..=50 {
        solver.step(&mut state, &mut oracle, &mut projector).unwrap();
        let gap = (state.u()[0] - 3.0).abs();
        assert!(gap <= last_gap + 1e-12, "gap grew at step {k}: {last_gap} -> {gap}");
        let alpha = state.step_size().unwrap();
        assert!(alpha.is_finite() && alpha > 0.0);
        last_gap = gap;
    }

    assert!(last_gap < 1e-4);
    assert_eq!(state.eval_count(), 50);
}

#[test]
// Purpose
// -------
// The multi-scale schedule leaves the coarse scale early once the gradient
// vanishes and still visits every scale.
//
// Given
// -----
// - f(x) = (x - 3)², x0 = 0, lr0 = 0.1, S = 3, coarse_iter = 10,
//   fine_iter = 1, threshold = 1e-3.
//
// Expect
// ------
// - Scale 0 exits early with fewer than 10 steps.
// - Three scale summaries; `eval_count` equals the total step count.
fn multi_scale_pipeline_exits_coarse_scale_early() {
    let opts = NesterovOptions::with_rule(0.1, StepRule::BarzilaiBorwein).unwrap();
    let solver = NesterovSolver::new(opts);
    let mut scheduler = ScaleScheduler::new(ScaleOptions::new(3, 10, 1, 1e-3).unwrap());
    let mut state = IterationState::new(array![0.0]).unwrap();

    let report =
        scheduler.run(&solver, &mut state, &mut shifted_quadratic, &mut no_projection).unwrap();

    assert_eq!(report.scales.len(), 3);
    assert!(report.scales[0].early_exit);
    assert!(report.scales[0].steps < 10);
    assert_eq!(state.eval_count(), report.total_steps());
    assert_relative_eq!(state.v()[0], 3.0, epsilon = 1e-9);
}

#[test]
// Purpose
// -------
// A cost-only objective driven step by step with a box projector keeps
// every evaluated point legal and settles on the box corner closest to the
// unconstrained minimizer.
//
// Given
// -----
// - f(x) = (x₀ - 3)² + (x₁ + 3)² through `FiniteDiffOracle`, box [-1, 1]²,
//   x0 = 0, quasi-Newton rule with lr0 = 0.1 and K = 4, 20 steps.
//
// Expect
// ------
// - After every step, v lies inside the box.
// - The history never holds more than 4 pairs.
// - v ends at (1, -1).
fn finite_difference_oracle_with_box_projector() {
    let opts = NesterovOptions::new(
        0.1,
        StepRule::QuasiNewton,
        BbPreference::Short,
        4,
        WolfeOptions::default(),
    )
    .unwrap();
    let solver = NesterovSolver::new(opts);
    let mut oracle = FiniteDiffOracle::new(|x: &Coords| -> OptResult<Cost> {
        Ok((x[0] - 3.0).powi(2) + (x[1] + 3.0).powi(2))
    });
    let mut projector = BoxProjector::uniform(2, -1.0, 1.0).unwrap();
    let mut state = IterationState::new(array![0.0, 0.0]).unwrap();

    for _ in 0..20 {
        solver.step(&mut state, &mut oracle, &mut projector).unwrap();
        assert!(state.v().iter().all(|c| (-1.0..=1.0).contains(c)));
        assert!(state.history().map_or(0, |h| h.len()) <= 4);
    }

    assert_relative_eq!(state.v()[0], 1.0, epsilon = 1e-6);
    assert_relative_eq!(state.v()[1], -1.0, epsilon = 1e-6);
    assert!(oracle.cost_evals() > 2 * 20);
}

#[test]
// Purpose
// -------
// A structural oracle fault aborts the step without touching the state.
//
// Given
// -----
// - Three good steps on the 1-D quadratic, then an oracle returning a
//   gradient of length 2.
//
// Expect
// ------
// - `GradientDimMismatch { expected: 1, found: 2 }`.
// - u, v, step size and `eval_count` equal their values before the call.
fn failed_step_leaves_state_untouched() {
    let solver = NesterovSolver::new(NesterovOptions::default());
    let mut state = IterationState::new(array![0.0]).unwrap();
    for _ in 0..3 {
        solver.step(&mut state, &mut shifted_quadratic, &mut no_projection).unwrap();
    }
    let (u, v, alpha, count) =
        (state.u().clone(), state.v().clone(), state.step_size(), state.eval_count());

    let mut bad = |_: &Coords| (0.0, array![1.0, 1.0]);
    let err = solver.step(&mut state, &mut bad, &mut no_projection).unwrap_err();

    assert_eq!(err, OptError::GradientDimMismatch { expected: 1, found: 2 });
    assert_eq!(state.u(), &u);
    assert_eq!(state.v(), &v);
    assert_eq!(state.step_size(), alpha);
    assert_eq!(state.eval_count(), count);
}

#[test]
// Purpose
// -------
// The argmin-backed runner converges on the bowl under every step rule
// with a finite-difference gradient.
//
// Given
// -----
// - `bowl_cost` through `FiniteDiffOracle`, x0 = 0, identity projector,
//   lr0 = 0.01, tol_grad = 1e-4, max_iter = 500.
//
// Expect
// ------
// - Each run reports `converged` before the iteration cap and a best point
//   within 1e-3 of (1, -2).
fn runner_converges_under_each_step_rule() {
    for rule in [StepRule::BarzilaiBorwein, StepRule::QuasiNewton, StepRule::Wolfe] {
        let opts = NesterovOptions::with_rule(0.01, rule).unwrap();
        let run_opts = RunOptions::new(Tolerances::new(Some(1e-4), None, Some(500)).unwrap(), false);

        let out = run_nesterov(
            array![0.0, 0.0],
            &opts,
            &run_opts,
            FiniteDiffOracle::new(bowl_cost),
            IdentityProjector,
        )
        .unwrap();

        assert!(out.converged, "{rule:?}: {}", out.status);
        assert!(out.iterations < 500, "{rule:?}: {} iterations", out.iterations);
        assert_relative_eq!(out.coords[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(out.coords[1], -2.0, epsilon = 1e-3);
    }
}
