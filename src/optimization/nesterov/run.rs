//! Execution helper that drives [`ArgminNesterov`] through an argmin
//! [`Executor`] and returns a crate-friendly [`RunOutcome`].
use crate::optimization::{
    errors::OptResult,
    nesterov::{
        adapter::{ArgminNesterov, NesterovIterState},
        solver::NesterovSolver,
        traits::{ConstraintProjector, NesterovOptions, RunOptions, RunOutcome},
        types::{Coords, Cost, Grad},
        validation::validate_coords,
    },
};
use argmin::core::{CostFunction, Executor, Gradient, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run the accelerated solver on an argmin problem until a stopping rule
/// fires.
///
/// This wires up:
/// - the problem `problem` (cost + gradient over [`Coords`]),
/// - an [`ArgminNesterov`] solver built from `opts` and `projector`,
/// - the initial coordinates `x0`,
/// - optional observers (behind the `obs_slog` feature),
/// - optional `max_iters`,
///   then executes and converts the final state into a [`RunOutcome`].
///
/// # Arguments
/// - `x0`: initial coordinates; consumed and set via `state.param(x0)`.
/// - `opts`: solver configuration (learning rate, step rule, history).
/// - `run_opts`: stopping rules and verbosity.
/// - `problem`: any `CostFunction + Gradient` over [`Coords`], for example a
///   [`FiniteDiffOracle`](crate::optimization::nesterov::finite_diff::FiniteDiffOracle).
/// - `projector`: legality restoration applied to every extrapolated point.
///
/// # Feature flags
/// With `obs_slog` and `run_opts.verbose == true`, a terminal slog observer
/// is attached with `ObserverMode::Always` and the initial cost and gradient
/// norm are printed before the first iteration.
///
/// # Returns
/// A [`RunOutcome`] with the best evaluated point, its cost, termination
/// status, iteration count, function-evaluation counts, and the norm of the
/// last reported gradient.
///
/// # Errors
/// - [`OptError::EmptyCoordinates`](crate::optimization::errors::OptError::EmptyCoordinates) /
///   [`OptError::InvalidCoordinates`](crate::optimization::errors::OptError::InvalidCoordinates)
///   for a bad `x0`.
/// - Any step error (dimension mismatch, oracle failure, projector failure)
///   via the crate's `From<argmin::core::Error>` conversion.
/// - Validation errors from [`RunOutcome::new`].
///
/// # Examples
/// ```ignore
/// let problem = FiniteDiffOracle::new(|x: &Coords| Ok(x.dot(x)));
/// let out = run_nesterov(x0, &NesterovOptions::default(), &RunOptions::default(),
///                        problem, IdentityProjector)?;
/// println!("done in {} iters, status: {}", out.iterations, out.status);
/// ```
pub fn run_nesterov<O, P>(
    x0: Coords, opts: &NesterovOptions, run_opts: &RunOptions, problem: O, projector: P,
) -> OptResult<RunOutcome>
where
    O: CostFunction<Param = Coords, Output = Cost> + Gradient<Param = Coords, Gradient = Grad>,
    P: ConstraintProjector + Send + 'static,
{
    validate_coords(&x0)?;
    #[cfg(feature = "obs_slog")]
    if run_opts.verbose {
        log_initial_state(&x0, &problem)?;
    }

    let solver = ArgminNesterov::new(NesterovSolver::new(opts.clone()), projector, &run_opts.tols);
    let mut executor = Executor::new(problem, solver);
    executor = executor.configure(|state: NesterovIterState| state.param(x0));
    #[cfg(feature = "obs_slog")]
    if run_opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = run_opts.tols.max_iter {
        executor = executor.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = executor.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    RunOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<O>(x0: &Coords, problem: &O) -> OptResult<()>
where
    O: CostFunction<Param = Coords, Output = Cost> + Gradient<Param = Coords, Gradient = Grad>,
{
    let c0 = problem.cost(x0)?;
    let g0n = problem.gradient(x0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: f(x0) = {:.6}{}",
        c0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
