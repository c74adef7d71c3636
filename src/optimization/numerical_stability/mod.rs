//! numerical_stability — guarded arithmetic shared by the step-size estimators.
//!
//! Purpose
//! -------
//! Keep the degenerate-denominator handling of the accelerated solver in one
//! place, so every estimator agrees on what counts as an admissible step and
//! when a ratio must be replaced by its fallback.
//!
//! Key behaviors
//! -------------
//! - `safe_ratio` / `positive_ratio` turn zero or non-finite denominators and
//!   overflowing quotients into `None`.
//! - `is_positive_finite` is the single admissibility test for step sizes.
//! - `scale_decay` provides the `2^-i` factor applied per scale.
//!
//! Conventions
//! -----------
//! - Pure scalar helpers: no logging, no allocation, no global state.
//! - Callers decide the fallback; this module only reports degeneracy.

pub mod safeguards;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::safeguards::{is_positive_finite, positive_ratio, safe_ratio, scale_decay};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_placement::optimization::numerical_stability::prelude::*;
//
// to import the guarded helpers in a single line.

pub mod prelude {
    pub use super::safeguards::{is_positive_finite, positive_ratio, safe_ratio, scale_decay};
}
