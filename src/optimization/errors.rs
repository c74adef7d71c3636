//! errors — unified error surface for the placement optimizer.
//!
//! Purpose
//! -------
//! Collect every configuration, oracle, projection, and backend failure the
//! optimizer can report into a single [`OptError`] enum with a shared result
//! alias [`OptResult<T>`].
//!
//! Key behaviors
//! -------------
//! - Group variants by origin (options, coordinates, oracle, projector,
//!   line search, run tolerances, argmin backend) so callers can match on
//!   the family they care about.
//! - Convert `argmin::core::Error` into `OptError`, recovering our own
//!   variants when they were boxed by argmin and mapping `ArgminError`
//!   variants one-to-one.
//! - Under `python-bindings`, convert `OptError` into a Python `ValueError`.
//!
//! Conventions
//! -----------
//! - Validation variants carry the offending value plus a static `reason`
//!   string so messages stay precise without allocation.
//! - Degenerate step-size denominators are never errors; estimators resolve
//!   them locally. Only structural problems (dimension mismatches, non-finite
//!   oracle output, invalid configuration) surface here.
use argmin::core::{ArgminError, Error};

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- NesterovOptions ----
    /// Base learning rate must be finite and strictly positive.
    InvalidLearningRate {
        lr: f64,
        reason: &'static str,
    },

    /// Curvature history needs room for at least one pair.
    InvalidHistoryCapacity {
        capacity: usize,
        reason: &'static str,
    },

    /// Invalid step rule name.
    InvalidStepRule {
        name: String,
        reason: &'static str,
    },

    // ---- WolfeOptions ----
    /// Wolfe constants must satisfy 0 < c1 < c2 < 1.
    InvalidWolfeConstants {
        c1: f64,
        c2: f64,
        reason: &'static str,
    },
    /// Backtracking factor must lie in (0, 1).
    InvalidBacktrackFactor {
        factor: f64,
        reason: &'static str,
    },
    /// Line search needs at least one trial.
    InvalidMaxTrials {
        max_trials: usize,
        reason: &'static str,
    },
    /// Initial trial step must be finite and strictly positive.
    InvalidInitialStep {
        step: f64,
        reason: &'static str,
    },

    // ---- ScaleOptions ----
    /// At least one scale is required.
    InvalidScales {
        scales: usize,
        reason: &'static str,
    },
    /// Inner iteration counts must be positive.
    InvalidInnerIterations {
        iterations: usize,
        reason: &'static str,
    },
    /// Convergence threshold must be finite and non-negative.
    InvalidConvergenceThreshold {
        threshold: f64,
        reason: &'static str,
    },

    // ---- Coordinates ----
    /// Coordinate vector has no entries.
    EmptyCoordinates,

    /// Coordinate entries need to be finite.
    InvalidCoordinates {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Box bounds are inconsistent with each other or with the coordinates.
    InvalidBounds {
        index: usize,
        lower: f64,
        upper: f64,
        reason: &'static str,
    },

    /// Bound vectors do not match the coordinate dimension.
    BoundsDimMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Oracle ----
    /// Gradient dimensions do not match coordinate dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Objective returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    /// Oracle failed for a reason of its own (e.g. a foreign callback raised).
    OracleFailure {
        text: String,
    },

    /// Oracle has no gradient for this group at the requested point. The
    /// solver turns this into a skipped step instead of failing.
    GradientUnavailable,

    // ---- Projector ----
    /// Projector changed the length of the coordinate vector.
    ProjectionDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Projector produced a non-finite coordinate.
    InvalidProjection {
        index: usize,
        value: f64,
    },

    /// Projector failed for a reason of its own.
    ProjectorFailure {
        text: String,
    },

    // ---- Line search ----
    /// Search direction is not a descent direction.
    NotDescentDirection {
        slope: f64,
    },

    /// Backtracking ran out of trials without meeting both Wolfe conditions.
    LineSearchFailed {
        trials: usize,
        alpha: f64,
    },

    // ---- RunOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    // ---- Run outcome ----
    /// Final coordinates must be finite.
    InvalidSolution {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Final coordinates are missing
    MissingSolution,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- NesterovOptions ----
            OptError::InvalidLearningRate { lr, reason } => {
                write!(f, "Invalid learning rate {lr}: {reason}")
            }
            OptError::InvalidHistoryCapacity { capacity, reason } => {
                write!(f, "Invalid curvature history capacity {capacity}: {reason}")
            }
            OptError::InvalidStepRule { name, reason } => {
                write!(f, "Invalid step rule '{name}': {reason}")
            }

            // ---- WolfeOptions ----
            OptError::InvalidWolfeConstants { c1, c2, reason } => {
                write!(f, "Invalid Wolfe constants c1 = {c1}, c2 = {c2}: {reason}")
            }
            OptError::InvalidBacktrackFactor { factor, reason } => {
                write!(f, "Invalid backtracking factor {factor}: {reason}")
            }
            OptError::InvalidMaxTrials { max_trials, reason } => {
                write!(f, "Invalid maximum line-search trials {max_trials}: {reason}")
            }
            OptError::InvalidInitialStep { step, reason } => {
                write!(f, "Invalid initial line-search step {step}: {reason}")
            }

            // ---- ScaleOptions ----
            OptError::InvalidScales { scales, reason } => {
                write!(f, "Invalid number of scales {scales}: {reason}")
            }
            OptError::InvalidInnerIterations { iterations, reason } => {
                write!(f, "Invalid inner iteration count {iterations}: {reason}")
            }
            OptError::InvalidConvergenceThreshold { threshold, reason } => {
                write!(f, "Invalid convergence threshold {threshold}: {reason}")
            }

            // ---- Coordinates ----
            OptError::EmptyCoordinates => {
                write!(f, "Coordinate vector must contain at least one entry")
            }
            OptError::InvalidCoordinates { index, value, reason } => {
                write!(f, "Invalid coordinate at index {index}: {value}: {reason}")
            }
            OptError::InvalidBounds { index, lower, upper, reason } => {
                write!(f, "Invalid bounds at index {index}: [{lower}, {upper}]: {reason}")
            }
            OptError::BoundsDimMismatch { expected, found } => {
                write!(f, "Bounds dimension mismatch: expected {expected}, found {found}")
            }

            // ---- Oracle ----
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            OptError::OracleFailure { text } => {
                write!(f, "Objective oracle failed: {text}")
            }
            OptError::GradientUnavailable => {
                write!(f, "Objective oracle has no gradient for this group")
            }

            // ---- Projector ----
            OptError::ProjectionDimMismatch { expected, found } => {
                write!(f, "Projection changed dimension: expected {expected}, found {found}")
            }
            OptError::InvalidProjection { index, value } => {
                write!(f, "Projection produced non-finite coordinate at index {index}: {value}")
            }
            OptError::ProjectorFailure { text } => {
                write!(f, "Constraint projector failed: {text}")
            }

            // ---- Line search ----
            OptError::NotDescentDirection { slope } => {
                write!(f, "Search direction is not a descent direction: g·d = {slope}")
            }
            OptError::LineSearchFailed { trials, alpha } => {
                write!(
                    f,
                    "Wolfe line search failed after {trials} trials (last step {alpha})"
                )
            }

            // ---- RunOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }

            // ---- Run outcome ----
            OptError::InvalidSolution { index, value, reason } => {
                write!(f, "Invalid solution coordinate at index {index}: {value}: {reason}")
            }
            OptError::MissingSolution => {
                write!(f, "Missing solution coordinates")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Errors raised by our own oracle/solver code travel through argmin boxed.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for PyErr {
    fn from(err: OptError) -> PyErr {
        PyValueError::new_err(format!("OptError: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `Display` messages embedding their payload values.
    // - Round-tripping `OptError` through `argmin::core::Error`.
    // - Mapping of `ArgminError` variants and foreign errors.
    //
    // They intentionally DO NOT cover:
    // - The `From<OptError> for PyErr` conversion, which needs the Python C
    //   API and belongs in Python-level tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that validation variants include the offending value and the
    // reason in their `Display` output.
    //
    // Given
    // -----
    // - An `InvalidLearningRate` with lr = -0.5.
    //
    // Expect
    // ------
    // - The message contains "-0.5" and the reason text.
    fn invalid_learning_rate_display_includes_value_and_reason() {
        // Arrange
        let err = OptError::InvalidLearningRate { lr: -0.5, reason: "must be positive" };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("-0.5"), "message was: {msg}");
        assert!(msg.contains("must be positive"), "message was: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Ensure an `OptError` boxed into `argmin::core::Error` comes back out as
    // the same variant instead of a generic backend error.
    //
    // Given
    // -----
    // - `OptError::GradientDimMismatch { expected: 4, found: 3 }` converted
    //   into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - Converting back yields the identical variant.
    fn opt_error_round_trips_through_argmin_error() {
        // Arrange
        let original = OptError::GradientDimMismatch { expected: 4, found: 3 };
        let boxed: Error = original.clone().into();

        // Act
        let recovered = OptError::from(boxed);

        // Assert
        assert_eq!(recovered, original);
    }

    #[test]
    // Purpose
    // -------
    // Check that argmin's own error variants map onto the wrapper variants.
    //
    // Given
    // -----
    // - `ArgminError::NotInitialized` with a text payload.
    //
    // Expect
    // ------
    // - `OptError::NotInitialized` carrying the same text.
    fn argmin_error_maps_to_wrapper_variant() {
        // Arrange
        let boxed: Error = ArgminError::NotInitialized { text: "no param".to_string() }.into();

        // Act
        let err = OptError::from(boxed);

        // Assert
        match err {
            OptError::NotInitialized { text } => assert_eq!(text, "no param"),
            other => panic!("expected NotInitialized, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Confirm that foreign errors become `BackendError` with their message.
    //
    // Given
    // -----
    // - A `std::io::Error` boxed into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - `OptError::BackendError` whose text contains the io message.
    fn foreign_error_maps_to_backend_error() {
        // Arrange
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let boxed: Error = io.into();

        // Act
        let err = OptError::from(boxed);

        // Assert
        match err {
            OptError::BackendError { text } => assert!(text.contains("disk on fire")),
            other => panic!("expected BackendError, got {other:?}"),
        }
    }
}
