//! Step-size estimation for the accelerated solver.
//!
//! Purpose
//! -------
//! Turn the two evaluations of one solver step, `(v, g)` and
//! `(v_prev, g_prev)`, into a strictly positive finite step size. The
//! strategy is a closed set chosen at construction ([`StepSizeEstimator`]).
//!
//! Key behaviors
//! -------------
//! - **Barzilai–Borwein**: with `s = v - v_prev`, `y = g - g_prev`,
//!   `short = s·y / y·y`, `long = s·s / s·y`, `lip = ||s|| / ||y||`. The
//!   preferred BB ratio is used when positive, otherwise
//!   `min(lip, alpha_prev)`. `y·y == 0` returns `alpha_prev` unchanged.
//! - **Quasi-Newton**: `(s, y)` becomes the newest curvature pair and the
//!   two-loop recursion yields `r ≈ H⁻¹ g`; the step is the scalar
//!   `||r|| / ||g||`. Degenerate cases fall back to the BB rule.
//! - **Wolfe**: backtracking along `-g` from `v`; on failure the previous
//!   step `alpha_prev` is reused.
//!
//! Invariants & assumptions
//! ------------------------
//! - `alpha_prev` is strictly positive and finite; every rule returns a value
//!   with the same property.
//! - Inputs have already been validated for dimension and finiteness.
//! - The estimator never mutates the curvature history. The quasi-Newton
//!   rule returns its new pair in [`StepEstimate::pending_pair`] and the
//!   solver stores it when it commits the step.
use crate::optimization::{
    errors::{OptError, OptResult},
    nesterov::{
        history::{CurvaturePair, CurvaturePairHistory, two_loop_recursion},
        line_search::wolfe_backtracking,
        traits::{BbPreference, NesterovOptions, ObjectiveOracle, StepRule, WolfeOptions},
        types::{Coords, Cost, Grad},
    },
    numerical_stability::{is_positive_finite, positive_ratio},
};
use argmin_math::ArgminL2Norm;
use log::{debug, warn};

/// Everything an estimator may look at for one step.
#[derive(Debug, Clone, Copy)]
pub struct StepInputs<'a> {
    pub v: &'a Coords,
    pub v_prev: &'a Coords,
    pub g: &'a Grad,
    pub g_prev: &'a Grad,
    /// Objective at `v`.
    pub cost: Cost,
    /// Previous step size, also the fallback bound.
    pub alpha_prev: f64,
}

/// Which formula produced a step size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSource {
    BbShort,
    BbLong,
    Lipschitz,
    PreviousStep,
    QuasiNewton,
    Wolfe,
}

impl StepSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepSource::BbShort => "bb_short",
            StepSource::BbLong => "bb_long",
            StepSource::Lipschitz => "lipschitz",
            StepSource::PreviousStep => "previous",
            StepSource::QuasiNewton => "lbfgs",
            StepSource::Wolfe => "wolfe",
        }
    }
}

/// Chosen step size plus bookkeeping for the solver.
///
/// - `step`: strictly positive, finite.
/// - `source`: formula that produced `step`.
/// - `line_search_evals`: extra oracle evaluations spent (Wolfe rule only).
/// - `pending_pair`: curvature pair to append to the history on commit
///   (quasi-Newton rule only, `None` if the pair was rejected).
#[derive(Debug, Clone, PartialEq)]
pub struct StepEstimate {
    pub step: f64,
    pub source: StepSource,
    pub line_search_evals: usize,
    pub pending_pair: Option<CurvaturePair>,
}

impl StepEstimate {
    fn plain(step: f64, source: StepSource) -> Self {
        Self { step, source, line_search_evals: 0, pending_pair: None }
    }
}

/// Inner products and ratios of one `(s, y)` pair.
///
/// Ratios are `None` when their denominator is zero, when they overflow, or
/// when they are not strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BbEstimates {
    pub sy: f64,
    pub ss: f64,
    pub yy: f64,
    pub short: Option<f64>,
    pub long: Option<f64>,
    pub lipschitz: Option<f64>,
}

impl BbEstimates {
    pub fn from_pair(s: &Coords, y: &Grad) -> Self {
        let sy = s.dot(y);
        let ss = s.dot(s);
        let yy = y.dot(y);
        Self {
            sy,
            ss,
            yy,
            short: positive_ratio(sy, yy),
            long: positive_ratio(ss, sy),
            lipschitz: positive_ratio(ss.sqrt(), yy.sqrt()),
        }
    }
}

/// Barzilai–Borwein step with Lipschitz fallback.
///
/// Returns `(step, source)`:
/// - `y·y` zero or non-finite: `(alpha_prev, PreviousStep)`.
/// - preferred BB ratio positive: that ratio.
/// - otherwise `min(lip, alpha_prev)`, where a degenerate `lip` leaves
///   `alpha_prev`.
pub fn barzilai_borwein_step(
    est: &BbEstimates, alpha_prev: f64, preference: BbPreference,
) -> (f64, StepSource) {
    if est.yy == 0.0 || !est.yy.is_finite() {
        return (alpha_prev, StepSource::PreviousStep);
    }
    let primary = match preference {
        BbPreference::Short => est.short.map(|a| (a, StepSource::BbShort)),
        BbPreference::Long => est.long.map(|a| (a, StepSource::BbLong)),
    };
    if let Some(choice) = primary {
        return choice;
    }
    match est.lipschitz {
        Some(lip) if lip < alpha_prev => (lip, StepSource::Lipschitz),
        _ => (alpha_prev, StepSource::PreviousStep),
    }
}

/// Step size used before any history exists: `||s|| / ||y||`, or `lr` when
/// that ratio is degenerate.
pub fn initial_step_size(s: &Coords, y: &Grad, lr: f64) -> f64 {
    positive_ratio(s.l2_norm(), y.l2_norm()).unwrap_or(lr)
}

/// Closed set of step-size strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepSizeEstimator {
    BarzilaiBorwein { preference: BbPreference },
    QuasiNewton { preference: BbPreference },
    Wolfe { options: WolfeOptions },
}

impl StepSizeEstimator {
    pub fn from_options(opts: &NesterovOptions) -> Self {
        match opts.step_rule {
            StepRule::BarzilaiBorwein => {
                StepSizeEstimator::BarzilaiBorwein { preference: opts.bb_preference }
            }
            StepRule::QuasiNewton => {
                StepSizeEstimator::QuasiNewton { preference: opts.bb_preference }
            }
            StepRule::Wolfe => StepSizeEstimator::Wolfe { options: opts.wolfe },
        }
    }

    pub fn rule(&self) -> StepRule {
        match self {
            StepSizeEstimator::BarzilaiBorwein { .. } => StepRule::BarzilaiBorwein,
            StepSizeEstimator::QuasiNewton { .. } => StepRule::QuasiNewton,
            StepSizeEstimator::Wolfe { .. } => StepRule::Wolfe,
        }
    }

    /// `true` if this strategy keeps a curvature history.
    pub fn uses_history(&self) -> bool {
        matches!(self, StepSizeEstimator::QuasiNewton { .. })
    }

    /// Produce the step size for one solver step.
    ///
    /// Parameters
    /// ----------
    /// - `inputs`: the two evaluated points, their gradients, the cost at `v`,
    ///   and the fallback bound `alpha_prev`.
    /// - `history`: the group's curvature history, `None` before the first
    ///   committed quasi-Newton step.
    /// - `oracle`: used only by the Wolfe rule for trial evaluations.
    ///
    /// Returns
    /// -------
    /// A [`StepEstimate`] whose `step` is strictly positive and finite.
    ///
    /// Errors
    /// ------
    /// - Oracle failures during Wolfe trials (including gradient dimension
    ///   mismatches) are propagated. A Wolfe search that merely runs out of
    ///   trials is not an error here; it falls back to `alpha_prev`.
    pub fn estimate<O>(
        &self, inputs: &StepInputs<'_>, history: Option<&CurvaturePairHistory>, oracle: &mut O,
    ) -> OptResult<StepEstimate>
    where
        O: ObjectiveOracle + ?Sized,
    {
        let alpha_prev = inputs.alpha_prev;
        let estimate = match self {
            StepSizeEstimator::BarzilaiBorwein { preference } => {
                let s = inputs.v - inputs.v_prev;
                let y = inputs.g - inputs.g_prev;
                let est = BbEstimates::from_pair(&s, &y);
                let (step, source) = barzilai_borwein_step(&est, alpha_prev, *preference);
                if source == StepSource::PreviousStep {
                    debug!("BB ratios degenerate (yy = {:.3e}); keeping step {alpha_prev:.3e}", est.yy);
                }
                StepEstimate::plain(step, source)
            }
            StepSizeEstimator::QuasiNewton { preference } => {
                quasi_newton_step(inputs, history, *preference)
            }
            StepSizeEstimator::Wolfe { options } => {
                let direction = -inputs.g;
                match wolfe_backtracking(
                    oracle,
                    inputs.v,
                    inputs.cost,
                    inputs.g,
                    &direction,
                    options,
                ) {
                    Ok(out) => StepEstimate {
                        step: out.alpha,
                        source: StepSource::Wolfe,
                        line_search_evals: out.evals,
                        pending_pair: None,
                    },
                    Err(OptError::LineSearchFailed { trials, alpha }) => {
                        warn!(
                            "Wolfe search failed after {trials} trials (last step {alpha:.3e}); \
                             keeping step {alpha_prev:.3e}"
                        );
                        StepEstimate {
                            step: alpha_prev,
                            source: StepSource::PreviousStep,
                            line_search_evals: trials,
                            pending_pair: None,
                        }
                    }
                    Err(OptError::NotDescentDirection { slope }) => {
                        debug!("Wolfe search skipped, g·d = {slope:.3e}; keeping step {alpha_prev:.3e}");
                        StepEstimate::plain(alpha_prev, StepSource::PreviousStep)
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        if is_positive_finite(estimate.step) {
            Ok(estimate)
        } else {
            debug!("Rejected step {:.3e} from {:?}", estimate.step, estimate.source);
            Ok(StepEstimate { step: alpha_prev, source: StepSource::PreviousStep, ..estimate })
        }
    }
}

fn quasi_newton_step(
    inputs: &StepInputs<'_>, history: Option<&CurvaturePairHistory>, preference: BbPreference,
) -> StepEstimate {
    let s = inputs.v - inputs.v_prev;
    let y = inputs.g - inputs.g_prev;
    let est = BbEstimates::from_pair(&s, &y);
    let pending = CurvaturePair::new(s, y);
    if pending.is_none() {
        debug!("Curvature pair rejected (s·y = {:.3e})", est.sy);
    }

    let direction = match (&pending, history) {
        (Some(pair), Some(hist)) => Some(hist.two_loop_with(pair, inputs.g)),
        (Some(pair), None) => Some(two_loop_recursion(std::iter::once(pair), inputs.g)),
        (None, Some(hist)) if !hist.is_empty() => Some(hist.two_loop(inputs.g)),
        (None, _) => None,
    };

    let qn_step = direction.and_then(|r| positive_ratio(r.l2_norm(), inputs.g.l2_norm()));
    match qn_step {
        Some(step) => StepEstimate {
            step,
            source: StepSource::QuasiNewton,
            line_search_evals: 0,
            pending_pair: pending,
        },
        None => {
            let (step, source) = barzilai_borwein_step(&est, inputs.alpha_prev, preference);
            debug!("Quasi-Newton step degenerate; BB fallback {step:.3e} ({})", source.as_str());
            StepEstimate { step, source, line_search_evals: 0, pending_pair: pending }
        }
    }
}
