//! Adapters between the accelerated solver and `argmin`.
//!
//! - [`ProblemOracle`] exposes an argmin [`Problem`] (cost + gradient) as an
//!   [`ObjectiveOracle`], so every evaluation made by the solver goes through
//!   argmin's counters (`cost_count`, `gradient_count`).
//! - [`ArgminNesterov`] implements argmin's [`Solver`] on top of
//!   [`NesterovSolver`]: one argmin iteration is one accelerated step. It
//!   owns the per-run [`IterationState`] and the constraint projector.
//!
//! Each argmin iteration reports the point where the cost was measured (the
//! pre-step `v`), its cost and gradient, so argmin's best-point tracking and
//! observers see evaluated values only. Termination on `tol_grad` /
//! `tol_cost` is decided in [`Solver::terminate`]; `max_iters` is handled by
//! argmin itself.
use crate::optimization::{
    errors::{OptError, OptResult},
    nesterov::{
        solver::{NesterovSolver, StepDiagnostics, StepReport},
        state::IterationState,
        traits::{ConstraintProjector, Evaluation, ObjectiveOracle, Tolerances},
        types::{Coords, Cost, Grad},
    },
};
use argmin::{
    core::{
        CostFunction, Error, Gradient, IterState, KV, Problem, Solver, State, TerminationReason,
        TerminationStatus,
    },
    kv,
};

/// argmin state type used by [`ArgminNesterov`].
pub type NesterovIterState = IterState<Coords, Grad, (), (), (), f64>;

/// [`ObjectiveOracle`] over an argmin [`Problem`].
///
/// The first evaluation is remembered so the caller can report the
/// gradient at the step's evaluation point without evaluating twice.
pub struct ProblemOracle<'a, O> {
    problem: &'a mut Problem<O>,
    first: Option<Evaluation>,
}

impl<'a, O> ProblemOracle<'a, O> {
    pub fn new(problem: &'a mut Problem<O>) -> Self {
        Self { problem, first: None }
    }

    /// First evaluation made through this oracle, if any.
    pub fn take_first(&mut self) -> Option<Evaluation> {
        self.first.take()
    }
}

impl<O> ObjectiveOracle for ProblemOracle<'_, O>
where
    O: CostFunction<Param = Coords, Output = Cost> + Gradient<Param = Coords, Gradient = Grad>,
{
    fn evaluate(&mut self, x: &Coords) -> OptResult<Evaluation> {
        let cost = self.problem.cost(x)?;
        let grad = self.problem.gradient(x)?;
        if self.first.is_none() {
            self.first = Some(Evaluation::new(cost, grad.clone()));
        }
        Ok(Evaluation::new(cost, grad))
    }
}

/// argmin [`Solver`] running [`NesterovSolver`] steps.
///
/// `tol_grad` stops the run once the gradient norm at the evaluated point
/// falls below it; `tol_cost` once two consecutive evaluated costs differ
/// by less than it.
pub struct ArgminNesterov<P> {
    solver: NesterovSolver,
    projector: P,
    state: Option<IterationState>,
    last: Option<StepDiagnostics>,
    tol_grad: Option<f64>,
    tol_cost: Option<f64>,
}

impl<P: ConstraintProjector> ArgminNesterov<P> {
    pub fn new(solver: NesterovSolver, projector: P, tols: &Tolerances) -> Self {
        Self {
            solver,
            projector,
            state: None,
            last: None,
            tol_grad: tols.tol_grad,
            tol_cost: tols.tol_cost,
        }
    }

    /// Iteration state, available once argmin has called `init`.
    pub fn iteration_state(&self) -> Option<&IterationState> {
        self.state.as_ref()
    }

    /// Diagnostics of the most recent step.
    pub fn last_step(&self) -> Option<&StepDiagnostics> {
        self.last.as_ref()
    }
}

impl<O, P> Solver<O, NesterovIterState> for ArgminNesterov<P>
where
    O: CostFunction<Param = Coords, Output = Cost> + Gradient<Param = Coords, Gradient = Grad>,
    P: ConstraintProjector,
{
    const NAME: &'static str = "Nesterov";

    fn init(
        &mut self, _problem: &mut Problem<O>, state: NesterovIterState,
    ) -> Result<(NesterovIterState, Option<KV>), Error> {
        let x0 = state.get_param().ok_or_else(|| OptError::NotInitialized {
            text: "Initial coordinates are required; configure them with `state.param(x0)`."
                .to_string(),
        })?;
        self.state = Some(IterationState::new(x0.clone())?);
        self.last = None;
        Ok((state, Some(kv!("step_rule" => self.solver.estimator().rule().as_str().to_string();))))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: NesterovIterState,
    ) -> Result<(NesterovIterState, Option<KV>), Error> {
        let iter_state = self.state.as_mut().ok_or_else(|| OptError::NotInitialized {
            text: "`init` must run before the first iteration.".to_string(),
        })?;

        let mut oracle = ProblemOracle::new(problem);
        let report = self.solver.step(iter_state, &mut oracle, &mut self.projector)?;
        let StepReport::Advanced(diag) = report else {
            return Err(OptError::PotentialBug {
                text: "argmin problems always provide a gradient".to_string(),
            }
            .into());
        };
        let first = oracle.take_first().ok_or_else(|| OptError::PotentialBug {
            text: "an advanced step must have evaluated the objective".to_string(),
        })?;
        let evaluated = iter_state.v_prev().cloned().ok_or_else(|| OptError::PotentialBug {
            text: "a committed step must leave a previous point".to_string(),
        })?;
        self.last = Some(diag);

        let kv = kv!(
            "step_size" => diag.step_size;
            "coef" => diag.coef;
            "source" => diag.source.as_str().to_string();
            "grad_norm" => diag.grad_norm;
            "line_search_evals" => diag.line_search_evals as u64;
        );
        Ok((state.param(evaluated).cost(diag.cost).gradient(first.grad), Some(kv)))
    }

    fn terminate(&mut self, state: &NesterovIterState) -> TerminationStatus {
        let Some(diag) = self.last else {
            return TerminationStatus::NotTerminated;
        };
        if let Some(tol) = self.tol_grad {
            if diag.grad_norm < tol {
                return TerminationStatus::Terminated(TerminationReason::SolverConverged);
            }
        }
        if let Some(tol) = self.tol_cost {
            let change = (state.get_cost() - state.get_prev_cost()).abs();
            if change.is_finite() && change < tol {
                return TerminationStatus::Terminated(TerminationReason::SolverConverged);
            }
        }
        TerminationStatus::NotTerminated
    }
}
