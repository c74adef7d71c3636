//! rust_placement — accelerated-gradient optimizer core for analytic
//! placement, with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the accelerated placement optimizer to Python via the
//! `_rust_placement` extension module. When the `python-bindings` feature is
//! enabled, this module defines the Python-facing optimizer class.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`optimization`) as the public crate
//!   surface.
//! - Define the `NesterovOptimizer` `#[pyclass]` and the `#[pymodule]`
//!   initializer for the `_rust_placement` Python extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input validation, and error mapping.
//! - Python callables for the objective and the projector are invoked with
//!   the GIL held; any exception they raise aborts the current step before
//!   the optimizer state is committed.
//!
//! Conventions
//! -----------
//! - Coordinates cross the boundary as 1-D `float64` NumPy arrays.
//! - Errors from core Rust code are propagated as `OptError` internally and
//!   converted to `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on `optimization::nesterov` and
//!   can ignore the PyO3 items guarded by the `python-bindings` feature.
//! - A Python placement driver constructs one `NesterovOptimizer` per
//!   parameter group and calls `step()` once per outer iteration.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner modules and
//!   by the integration tests under `tests/`.

pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::nesterov::{
        projectors::IdentityProjector, scales::ScaleScheduler, solver::NesterovSolver,
        state::IterationState, traits::ConstraintProjector,
    },
    utils::{
        PyOracle, PyProjector, build_nesterov_options, build_scale_options, extract_coords,
    },
};

/// NesterovOptimizer — Python-facing accelerated placement optimizer.
///
/// Purpose
/// -------
/// Own one parameter group's [`IterationState`] together with the Python
/// objective and projector callables, and advance it one step (or one full
/// multi-scale sweep) per `step()` call.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `NesterovOptimizer(x0, lr, obj_and_grad_fn, constraint_fn=None,
/// step_rule="bb", history=10, scales=None, coarse_iter=10, fine_iter=1,
/// convergence_threshold=1e-5, bb_preference="short", wolfe_c1=1e-4,
/// wolfe_c2=0.9, backtrack=0.5, max_trials=30)`:
/// - `x0`: 1-D array-like of finite `f64` initial coordinates.
/// - `lr`: positive base learning rate.
/// - `obj_and_grad_fn`: callable `x -> (cost, grad)`; `grad = None` marks
///   a group without gradient and skips the step.
/// - `constraint_fn`: optional callable projecting `x` in place (or
///   returning the projected array).
/// - `step_rule`: `"bb"`, `"lbfgs"` or `"wolfe"`.
/// - `history`: curvature-pair capacity for `"lbfgs"`.
/// - `scales`, `coarse_iter`, `fine_iter`, `convergence_threshold`: when
///   `scales` is given, each `step()` runs the whole multi-scale schedule.
/// - `bb_preference`: `"short"` or `"long"` BB ratio tried first.
/// - `wolfe_c1`, `wolfe_c2`, `backtrack`, `max_trials`: Wolfe search
///   constants for `"wolfe"`; unset values keep their defaults.
///
/// Invariants
/// ----------
/// - `u`, `v` always have the length of `x0`.
/// - `eval_count` counts advanced solver steps, not oracle calls.
///
/// Notes
/// -----
/// - Native Rust code should use [`NesterovSolver`] and [`ScaleScheduler`]
///   directly; this type exists solely for the PyO3 binding surface.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_placement", unsendable)]
pub struct NesterovOptimizer {
    solver: NesterovSolver,
    state: IterationState,
    scheduler: Option<ScaleScheduler>,
    oracle: PyOracle,
    projector: Option<PyProjector>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl NesterovOptimizer {
    #[new]
    #[pyo3(
        signature = (
            x0,
            lr,
            obj_and_grad_fn,
            constraint_fn = None,
            step_rule = None,
            history = None,
            scales = None,
            coarse_iter = 10,
            fine_iter = 1,
            convergence_threshold = 1e-5,
            bb_preference = None,
            wolfe_c1 = None,
            wolfe_c2 = None,
            backtrack = None,
            max_trials = None,
        ),
        text_signature = "(x0, lr, obj_and_grad_fn, /, constraint_fn=None, step_rule='bb', \
                          history=10, scales=None, coarse_iter=10, fine_iter=1, \
                          convergence_threshold=1e-5, bb_preference='short', wolfe_c1=1e-4, \
                          wolfe_c2=0.9, backtrack=0.5, max_trials=30)"
    )]
    pub fn new<'py>(
        py: Python<'py>, x0: &Bound<'py, PyAny>, lr: f64, obj_and_grad_fn: Py<PyAny>,
        constraint_fn: Option<Py<PyAny>>, step_rule: Option<&str>, history: Option<usize>,
        scales: Option<usize>, coarse_iter: usize, fine_iter: usize, convergence_threshold: f64,
        bb_preference: Option<&str>, wolfe_c1: Option<f64>, wolfe_c2: Option<f64>,
        backtrack: Option<f64>, max_trials: Option<usize>,
    ) -> PyResult<Self> {
        let x0 = extract_coords(py, x0, "x0")?;
        let opts = build_nesterov_options(
            lr,
            step_rule,
            history,
            bb_preference,
            wolfe_c1,
            wolfe_c2,
            backtrack,
            max_trials,
        )?;
        let scale_opts = build_scale_options(scales, coarse_iter, fine_iter, convergence_threshold)?;
        let state = IterationState::new(x0)?;

        Ok(NesterovOptimizer {
            solver: NesterovSolver::new(opts),
            state,
            scheduler: scale_opts.map(ScaleScheduler::new),
            oracle: PyOracle::new(obj_and_grad_fn),
            projector: constraint_fn.map(PyProjector::new),
        })
    }

    /// Advance the optimizer.
    ///
    /// Returns the gradient norm at the last evaluated point, or `None` when
    /// no step evaluated the objective.
    #[pyo3(text_signature = "(self)")]
    pub fn step(&mut self) -> PyResult<Option<f64>> {
        let mut identity = IdentityProjector;
        let projector: &mut dyn ConstraintProjector = match self.projector.as_mut() {
            Some(p) => p,
            None => &mut identity,
        };

        let grad_norm = match self.scheduler.as_mut() {
            Some(scheduler) => {
                let report =
                    scheduler.run(&self.solver, &mut self.state, &mut self.oracle, projector)?;
                report.scales.iter().rev().find_map(|s| s.last_grad_norm)
            }
            None => self.solver.step(&mut self.state, &mut self.oracle, projector)?.grad_norm(),
        };
        Ok(grad_norm)
    }

    /// Current accepted solution.
    #[getter]
    pub fn u(&self) -> Vec<f64> {
        self.state.u().to_vec()
    }

    /// Current extrapolated point (where the objective is evaluated next).
    #[getter]
    pub fn v(&self) -> Vec<f64> {
        self.state.v().to_vec()
    }

    /// Last committed step size; `None` before the first step.
    #[getter]
    pub fn step_size(&self) -> Option<f64> {
        self.state.step_size()
    }

    #[getter]
    pub fn eval_count(&self) -> usize {
        self.state.eval_count()
    }

    /// Current acceleration coefficient.
    #[getter]
    pub fn a(&self) -> f64 {
        self.state.a()
    }
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_placement<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<NesterovOptimizer>()?;
    Ok(())
}
