//! Public API surface for the accelerated placement solver.
//!
//! - [`ObjectiveOracle`]: objective + gradient evaluation supplied by the driver.
//! - [`ConstraintProjector`]: in-place legality restoration supplied by the driver.
//! - [`StepRule`] / [`BbPreference`]: choice of step-size strategy.
//! - [`NesterovOptions`], [`WolfeOptions`], [`ScaleOptions`]: solver configuration.
//! - [`Tolerances`] / [`RunOptions`] and [`RunOutcome`]: argmin-driven runs.
//!
//! Convention: the solver *minimizes* the cost returned by the oracle. The
//! gradient must be the gradient of that cost with respect to the flattened
//! coordinate vector.
use crate::optimization::{
    errors::{OptError, OptResult},
    nesterov::{
        types::{
            Coords, Cost, DEFAULT_BACKTRACK_FACTOR, DEFAULT_COARSE_ITER,
            DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_FINE_ITER, DEFAULT_HISTORY_CAPACITY,
            DEFAULT_LEARNING_RATE, DEFAULT_MAX_TRIALS, DEFAULT_SCALES, DEFAULT_WOLFE_C1,
            DEFAULT_WOLFE_C2, FnEvalMap, Grad,
        },
        validation::{
            validate_solution, validate_value, verify_backtrack_factor,
            verify_convergence_threshold, verify_history_capacity, verify_initial_step,
            verify_inner_iterations, verify_learning_rate, verify_max_trials, verify_scales,
            verify_tol_cost, verify_tol_grad, verify_wolfe_constants,
        },
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Objective value and gradient at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub cost: Cost,
    pub grad: Grad,
}

impl Evaluation {
    pub fn new(cost: Cost, grad: Grad) -> Self {
        Self { cost, grad }
    }
}

/// Driver-supplied objective oracle.
///
/// Required:
/// - `evaluate(&Coords) -> OptResult<Evaluation>`: cost and gradient at `x`.
///   The gradient length must equal `x.len()`; the solver treats a mismatch
///   as fatal.
///
/// Optional:
/// - `has_gradient() -> bool`: `false` marks the group as frozen; the solver
///   then skips the step without evaluating anything. Defaults to `true`.
///
/// Closures `FnMut(&Coords) -> (Cost, Grad)` implement this trait directly.
pub trait ObjectiveOracle {
    // Required methods
    fn evaluate(&mut self, x: &Coords) -> OptResult<Evaluation>;

    // Optional methods
    fn has_gradient(&self) -> bool {
        true
    }
}

impl<F> ObjectiveOracle for F
where
    F: FnMut(&Coords) -> (Cost, Grad),
{
    fn evaluate(&mut self, x: &Coords) -> OptResult<Evaluation> {
        let (cost, grad) = self(x);
        Ok(Evaluation { cost, grad })
    }
}

/// Driver-supplied legality projector.
///
/// `project` mutates the candidate point in place. It must keep the length
/// of `x`; the solver rejects a resized vector.
///
/// Closures `FnMut(&mut Coords)` implement this trait directly.
pub trait ConstraintProjector {
    fn project(&mut self, x: &mut Coords) -> OptResult<()>;
}

impl<F> ConstraintProjector for F
where
    F: FnMut(&mut Coords),
{
    fn project(&mut self, x: &mut Coords) -> OptResult<()> {
        self(x);
        Ok(())
    }
}

/// Step-size strategy used by the accelerated solver.
///
/// Variants:
/// - `BarzilaiBorwein`: BB short (or long) step with a Lipschitz fallback.
/// - `QuasiNewton`: limited-memory two-loop recursion collapsed to the scalar
///   `||r|| / ||g||`, falling back to the BB rule when degenerate.
/// - `Wolfe`: backtracking search along `-g` under the (weak) Wolfe
///   conditions, falling back to the previous step on failure.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"bb"`, `"barzilaiborwein"`, `"qn"`, `"lbfgs"`, `"quasinewton"`, `"wolfe"`).
/// Unknown names return `OptError::InvalidStepRule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepRule {
    #[default]
    BarzilaiBorwein,
    QuasiNewton,
    Wolfe,
}

impl StepRule {
    /// Short stable name used in logs and observer key-value pairs.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepRule::BarzilaiBorwein => "bb",
            StepRule::QuasiNewton => "lbfgs",
            StepRule::Wolfe => "wolfe",
        }
    }
}

impl FromStr for StepRule {
    type Err = OptError;

    /// Parse a step rule from a string (case-insensitive, `_`/`-` ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String =
            s.chars().filter(|c| *c != '_' && *c != '-').collect::<String>().to_lowercase();
        match key.as_str() {
            "bb" | "barzilaiborwein" => Ok(StepRule::BarzilaiBorwein),
            "qn" | "lbfgs" | "quasinewton" => Ok(StepRule::QuasiNewton),
            "wolfe" => Ok(StepRule::Wolfe),
            _ => Err(OptError::InvalidStepRule {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'bb', 'lbfgs' or 'wolfe'.",
            }),
        }
    }
}

/// Which BB ratio is tried first.
///
/// `Short` is `s·y / y·y`, `Long` is `s·s / s·y`. Either one falls back to
/// `min(lipschitz, alpha_prev)` when it is not strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BbPreference {
    #[default]
    Short,
    Long,
}

impl FromStr for BbPreference {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(BbPreference::Short),
            "long" => Ok(BbPreference::Long),
            _ => Err(OptError::InvalidStepRule {
                name: s.to_string(),
                reason: "Valid BB preferences are case insensitive 'short' or 'long'.",
            }),
        }
    }
}

/// Parameters of the Wolfe backtracking search.
///
/// Default: `c1 = 1e-4`, `c2 = 0.9`, `backtrack = 0.5`, `max_trials = 30`,
/// `initial_step = 1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WolfeOptions {
    pub c1: f64,
    pub c2: f64,
    pub backtrack: f64,
    pub max_trials: usize,
    pub initial_step: f64,
}

impl WolfeOptions {
    /// Construct validated Wolfe options.
    ///
    /// # Errors
    /// - [`OptError::InvalidWolfeConstants`] unless `0 < c1 < c2 < 1`.
    /// - [`OptError::InvalidBacktrackFactor`] unless `0 < backtrack < 1`.
    /// - [`OptError::InvalidMaxTrials`] if `max_trials == 0`.
    /// - [`OptError::InvalidInitialStep`] for a non-positive initial step.
    pub fn new(
        c1: f64, c2: f64, backtrack: f64, max_trials: usize, initial_step: f64,
    ) -> OptResult<Self> {
        verify_wolfe_constants(c1, c2)?;
        verify_backtrack_factor(backtrack)?;
        verify_max_trials(max_trials)?;
        verify_initial_step(initial_step)?;
        Ok(Self { c1, c2, backtrack, max_trials, initial_step })
    }

    /// Defaults with the given fields replaced, validated like [`new`](Self::new).
    ///
    /// Used by front-ends that expose each constant as an optional keyword.
    pub fn with_overrides(
        c1: Option<f64>, c2: Option<f64>, backtrack: Option<f64>, max_trials: Option<usize>,
    ) -> OptResult<Self> {
        let defaults = Self::default();
        Self::new(
            c1.unwrap_or(defaults.c1),
            c2.unwrap_or(defaults.c2),
            backtrack.unwrap_or(defaults.backtrack),
            max_trials.unwrap_or(defaults.max_trials),
            defaults.initial_step,
        )
    }
}

impl Default for WolfeOptions {
    fn default() -> Self {
        Self {
            c1: DEFAULT_WOLFE_C1,
            c2: DEFAULT_WOLFE_C2,
            backtrack: DEFAULT_BACKTRACK_FACTOR,
            max_trials: DEFAULT_MAX_TRIALS,
            initial_step: 1.0,
        }
    }
}

/// Solver-level configuration.
///
/// Fields:
/// - `lr0` — base learning rate; seeds `v_prev = v - lr0·g` on the first step
///   and serves as the initial step when the first BB ratio is degenerate.
/// - `step_rule` — step-size strategy.
/// - `bb_preference` — BB ratio tried first (also used by the quasi-Newton
///   fallback).
/// - `history_capacity` — number of curvature pairs `K` kept by the
///   quasi-Newton rule.
/// - `wolfe` — parameters for the Wolfe rule.
///
/// Default: `lr0 = 1e-2`, BB short, `K = 10`, default Wolfe options.
#[derive(Debug, Clone, PartialEq)]
pub struct NesterovOptions {
    pub lr0: f64,
    pub step_rule: StepRule,
    pub bb_preference: BbPreference,
    pub history_capacity: usize,
    pub wolfe: WolfeOptions,
}

impl NesterovOptions {
    /// Create validated solver options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLearningRate`] for a non-finite or non-positive `lr0`.
    /// - [`OptError::InvalidHistoryCapacity`] if `history_capacity == 0`.
    pub fn new(
        lr0: f64, step_rule: StepRule, bb_preference: BbPreference, history_capacity: usize,
        wolfe: WolfeOptions,
    ) -> OptResult<Self> {
        verify_learning_rate(lr0)?;
        verify_history_capacity(history_capacity)?;
        Ok(Self { lr0, step_rule, bb_preference, history_capacity, wolfe })
    }

    /// Default options with the given learning rate and step rule.
    pub fn with_rule(lr0: f64, step_rule: StepRule) -> OptResult<Self> {
        Self::new(
            lr0,
            step_rule,
            BbPreference::default(),
            DEFAULT_HISTORY_CAPACITY,
            WolfeOptions::default(),
        )
    }
}

impl Default for NesterovOptions {
    fn default() -> Self {
        Self {
            lr0: DEFAULT_LEARNING_RATE,
            step_rule: StepRule::default(),
            bb_preference: BbPreference::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            wolfe: WolfeOptions::default(),
        }
    }
}

/// Multi-scale schedule.
///
/// - `scales` — number of scales `S`.
/// - `coarse_iter` — inner steps at scale 0.
/// - `fine_iter` — inner steps at every scale `i > 0`.
/// - `convergence_threshold` — gradient-norm level below which the rest of a
///   scale is skipped; `0.0` disables early exit.
///
/// Default: `S = 3`, `coarse_iter = 10`, `fine_iter = 1`, threshold `1e-5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOptions {
    pub scales: usize,
    pub coarse_iter: usize,
    pub fine_iter: usize,
    pub convergence_threshold: f64,
}

impl ScaleOptions {
    /// Construct a validated schedule.
    ///
    /// # Errors
    /// - [`OptError::InvalidScales`] if `scales == 0`.
    /// - [`OptError::InvalidInnerIterations`] if either iteration count is 0.
    /// - [`OptError::InvalidConvergenceThreshold`] for a negative or non-finite
    ///   threshold.
    pub fn new(
        scales: usize, coarse_iter: usize, fine_iter: usize, convergence_threshold: f64,
    ) -> OptResult<Self> {
        verify_scales(scales)?;
        verify_inner_iterations(coarse_iter)?;
        verify_inner_iterations(fine_iter)?;
        verify_convergence_threshold(convergence_threshold)?;
        Ok(Self { scales, coarse_iter, fine_iter, convergence_threshold })
    }

    /// Inner-step budget for `scale`.
    pub fn iterations_for(&self, scale: usize) -> usize {
        if scale == 0 { self.coarse_iter } else { self.fine_iter }
    }
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self {
            scales: DEFAULT_SCALES,
            coarse_iter: DEFAULT_COARSE_ITER,
            fine_iter: DEFAULT_FINE_ITER,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
        }
    }
}

/// Numerical tolerances and iteration limits for argmin-driven runs.
///
/// - `tol_grad`: stop when the gradient norm at the evaluated point falls below this.
/// - `tol_cost`: stop when the change in cost between iterations falls below this.
/// - `max_iter`: hard cap on the number of solver steps.
///
/// Any field can be `None` but **at least one** must be provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for non-finite or non-positive tolerances.
    /// - `OptError::InvalidMaxIter` if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Run-level configuration for [`run_nesterov`](crate::optimization::nesterov::run::run_nesterov).
///
/// - `tols` — stopping rules.
/// - `verbose` — if `true`, attaches a terminal observer (behind the
///   `obs_slog` feature) and prints the initial cost.
///
/// Default: `max_iter = 1000`, `tol_grad = 1e-6`, not verbose.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub tols: Tolerances,
    pub verbose: bool,
}

impl RunOptions {
    pub fn new(tols: Tolerances, verbose: bool) -> Self {
        Self { tols, verbose }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(1000) },
            verbose: false,
        }
    }
}

/// Canonical result of an argmin-driven run.
///
/// - `coords`: best evaluated point.
/// - `cost`: objective at `coords`.
/// - `converged`: `true` if the executor reported any terminating status.
/// - `status`: human-readable termination status.
/// - `iterations`: number of solver steps taken.
/// - `fn_evals`: evaluation counters reported by argmin (`cost_count`,
///   `gradient_count`).
/// - `grad_norm`: norm of the last evaluated gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub coords: Coords,
    pub cost: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl RunOutcome {
    /// Build a validated [`RunOutcome`] from raw executor state.
    ///
    /// # Errors
    /// - [`OptError::MissingSolution`] / [`OptError::InvalidSolution`] for a
    ///   missing or non-finite best point.
    /// - [`OptError::NonFiniteCost`] for a non-finite best cost.
    pub fn new(
        coords_opt: Option<Coords>, cost: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let coords = validate_solution(coords_opt)?;
        validate_value(cost)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            coords,
            cost,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
        })
    }
}
