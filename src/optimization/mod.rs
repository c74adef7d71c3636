//! optimization — accelerated placement solver, numerical helpers, and
//! unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer of an analytic placer: a momentum-
//! accelerated gradient solver with online step-size estimation, the guarded
//! arithmetic it relies on, and a single error/result surface. Callers supply
//! an objective oracle and a legality projector, pick a step rule, and drive
//! the solver one step (or one scale) at a time.
//!
//! Key behaviors
//! -------------
//! - Expose the accelerated solver (`nesterov`): per-group iteration state,
//!   BB / quasi-Newton / Wolfe step-size rules, the multi-scale scheduler,
//!   and an argmin-backed runner.
//! - Supply shared scalar guards (`numerical_stability`) so every estimator
//!   treats degenerate denominators the same way.
//! - Normalize configuration issues, oracle and projector failures, and
//!   backend solver errors into a single enum (`errors::OptError`) with a
//!   common result alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - The solver minimizes the oracle's cost; gradients are taken with
//!   respect to the flattened coordinate vector.
//! - Invalid configuration and structural oracle/projector faults are
//!   reported as `OptError`, never as panics. Degenerate step-size
//!   quantities are resolved locally and never surface as errors.
//!
//! Conventions
//! -----------
//! - Coordinates and gradients are `ndarray`-based aliases (`Coords`,
//!   `Grad`); scalar costs are `f64`.
//! - Public entry points that can fail return `OptResult<T>`; callers never
//!   see raw argmin errors.
//!
//! Downstream usage
//! ----------------
//! - Placement drivers keep one `IterationState` per parameter group and call
//!   `NesterovSolver::step` (or `ScaleScheduler::run_scale`) per outer
//!   iteration.
//! - Front-ends typically import the curated surface via
//!   `optimization::prelude::*`, which forwards the submodule preludes and
//!   the core error types.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules focus on local concerns:
//!   - `nesterov`: estimator arithmetic, history bounds, acceleration
//!     recurrence, step commit semantics, scale transitions.
//!   - `numerical_stability`: guarded ratios on degenerate inputs.
//!   - `errors`: conversions from argmin errors into `OptError`.
//! - Integration tests under `tests/` exercise end-to-end solver runs.

pub mod errors;
pub mod nesterov;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_placement::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::nesterov::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
