//! nesterov::types — shared numeric aliases and defaults.
//!
//! Purpose
//! -------
//! Centralize the vector and scalar types used by the accelerated placement
//! solver so the rest of the module stays agnostic to `ndarray` generics.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for coordinate vectors, gradients, and costs
//!   (`Coords`, `Grad`, `Cost`).
//! - Provide the map type used for argmin function-evaluation counters
//!   (`FnEvalMap`).
//! - Hold the default constants shared by option constructors.
//!
//! Invariants & assumptions
//! ------------------------
//! - All vectors are dense `ndarray::Array1<f64>`; a placement with `n`
//!   movable cells in two dimensions is flattened by the caller into one
//!   vector of length `2n`.
//!
//! Testing notes
//! -------------
//! - This module only defines aliases and constants; correctness is
//!   exercised by the surrounding solver tests.
use ndarray::Array1;
use std::collections::HashMap;

/// Coordinate vector being optimized (flattened cell positions).
pub type Coords = Array1<f64>;

/// Gradient of the objective with respect to [`Coords`].
pub type Grad = Array1<f64>;

/// Scalar objective value (e.g. smoothed wirelength plus density penalty).
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin.
///
/// Maps counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default number of curvature pairs kept by the quasi-Newton estimator.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Default base learning rate used when seeding the first extrapolation.
pub const DEFAULT_LEARNING_RATE: f64 = 1e-2;

/// Armijo sufficient-decrease constant.
pub const DEFAULT_WOLFE_C1: f64 = 1e-4;

/// Curvature-condition constant.
pub const DEFAULT_WOLFE_C2: f64 = 0.9;

/// Shrink factor applied to the trial step after a rejected trial.
pub const DEFAULT_BACKTRACK_FACTOR: f64 = 0.5;

/// Trial cap for the Wolfe backtracking search.
pub const DEFAULT_MAX_TRIALS: usize = 30;

/// Default number of scales in the multi-scale schedule.
pub const DEFAULT_SCALES: usize = 3;

/// Inner steps at the coarsest scale.
pub const DEFAULT_COARSE_ITER: usize = 10;

/// Inner steps at every finer scale.
pub const DEFAULT_FINE_ITER: usize = 1;

/// Gradient-norm threshold for leaving a scale early.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 1e-5;
