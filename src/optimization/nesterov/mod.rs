//! nesterov — accelerated-gradient solver core for analytic placement.
//!
//! Purpose
//! -------
//! Advance a (large) coordinate vector toward a local optimum of a smooth
//! placement objective with a Nesterov-style accelerated gradient method
//! whose step size is estimated online. The driver owns the objective, the
//! legality projector and the outer iteration policy; this module owns the
//! per-group iteration state and the arithmetic of one step.
//!
//! Key behaviors
//! -------------
//! - [`NesterovSolver::step`] performs one accelerated step on an
//!   [`IterationState`]: two oracle evaluations (at `v` and `v_prev`), one
//!   step-size estimate, one projection, and a commit that only happens when
//!   everything before it succeeded.
//! - Step sizes come from a closed set of rules ([`StepRule`]): BB
//!   short/long with a Lipschitz fallback, a limited-memory quasi-Newton
//!   scalar backed by a bounded [`CurvaturePairHistory`], or a Wolfe
//!   backtracking search.
//! - [`ScaleScheduler`] re-runs the solver across `S` scales with a `2^-i`
//!   decay of the effective step, leaving a scale early once the gradient
//!   norm falls below a threshold.
//! - [`run_nesterov`] hands the same solver to an argmin `Executor` for
//!   drivers that want ready-made stopping rules and observers.
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective is *minimized*; the oracle's gradient has the length of
//!   the coordinate vector, otherwise the step fails before any mutation.
//! - Every committed step size is strictly positive and finite; degenerate
//!   denominators fall back locally and are never reported as errors.
//! - The acceleration coefficient sequence is strictly increasing.
//!
//! Conventions
//! -----------
//! - Coordinates and gradients are `ndarray::Array1<f64>` ([`Coords`],
//!   [`Grad`]); multi-dimensional placements are flattened by the caller.
//! - All fallible entry points return [`OptResult`](crate::optimization::errors::OptResult).
//! - Solver-level diagnostics go through the `log` facade; run-level
//!   progress through argmin observers.
//!
//! Downstream usage
//! ----------------
//! - Step-at-a-time drivers build a [`NesterovSolver`] from
//!   [`NesterovOptions`], keep one [`IterationState`] per parameter group and
//!   call `step` once per outer placement iteration.
//! - Drivers with a cost-only objective wrap it in [`FiniteDiffOracle`].
//! - Front-ends import the curated surface via `nesterov::prelude::*`.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its local arithmetic; the
//!   `tests/` directory drives the public surface end to end.

pub mod acceleration;
pub mod adapter;
pub mod finite_diff;
pub mod history;
pub mod line_search;
pub mod projectors;
pub mod run;
pub mod scales;
pub mod solver;
pub mod state;
pub mod step_size;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::acceleration::AccelerationScheduler;
pub use self::adapter::{ArgminNesterov, NesterovIterState};
pub use self::finite_diff::FiniteDiffOracle;
pub use self::history::{CurvaturePair, CurvaturePairHistory};
pub use self::projectors::{BoxProjector, IdentityProjector};
pub use self::run::run_nesterov;
pub use self::scales::{ScalePhase, ScaleReport, ScaleScheduler, ScaleSummary};
pub use self::solver::{NesterovSolver, StepDiagnostics, StepReport};
pub use self::state::IterationState;
pub use self::step_size::{StepSizeEstimator, StepSource};
pub use self::traits::{
    BbPreference, ConstraintProjector, Evaluation, NesterovOptions, ObjectiveOracle, RunOptions,
    RunOutcome, ScaleOptions, StepRule, Tolerances, WolfeOptions,
};
pub use self::types::{Coords, Cost, FnEvalMap, Grad};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_placement::optimization::nesterov::prelude::*;
//
// to import the main solver surface in a single line.

pub mod prelude {
    pub use super::projectors::{BoxProjector, IdentityProjector};
    pub use super::run::run_nesterov;
    pub use super::scales::ScaleScheduler;
    pub use super::solver::{NesterovSolver, StepReport};
    pub use super::state::IterationState;
    pub use super::traits::{
        ConstraintProjector, NesterovOptions, ObjectiveOracle, RunOptions, RunOutcome,
        ScaleOptions, StepRule, Tolerances,
    };
    pub use super::types::{Coords, Cost, Grad};
}
