//! nesterov::state — per-group iteration state.
//!
//! Purpose
//! -------
//! Hold everything the accelerated solver carries between steps for one
//! parameter group: the accepted solution `u`, the extrapolated point `v`
//! where the oracle is evaluated, the previous extrapolated point `v_prev`,
//! the adaptive step size, the momentum scalar, the optional curvature
//! history, and the completed-step counter.
//!
//! Key behaviors
//! -------------
//! - Construction is explicit: [`IterationState::new`] yields a state in the
//!   [`Phase::Fresh`] phase (no `v_prev`, no step size). The first committed
//!   step moves it into [`Phase::Running`].
//! - Scratch buffers for `u_next` / `v_next` are allocated once and reused;
//!   committing a step rotates buffers with `std::mem::swap` instead of
//!   copying or allocating.
//! - Only the solver mutates the state (through crate-private methods). An
//!   aborted step leaves every observable field untouched.
//!
//! Invariants & assumptions
//! ------------------------
//! - `u`, `v`, `v_prev`, and the scratch buffers share one dimension.
//! - Once running, `step_size` is strictly positive and finite.
//! - `a >= 1` and never decreases.
//!
//! Downstream usage
//! ----------------
//! - Drivers read [`IterationState::v`] after each step as the current
//!   placement and [`IterationState::u`] as the accepted solution.
use crate::optimization::{
    errors::OptResult,
    nesterov::{
        acceleration::{AccelerationScheduler, Momentum},
        history::{CurvaturePair, CurvaturePairHistory},
        types::{Coords, Grad},
        validation::validate_coords,
    },
};
use ndarray::Zip;

/// Data that only exists once the first step has been committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Running {
    pub(crate) v_prev: Coords,
    pub(crate) step_size: f64,
    pub(crate) base_step: f64,
    pub(crate) history: Option<CurvaturePairHistory>,
}

/// Lifecycle of an [`IterationState`].
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Fresh,
    Running(Running),
}

/// Per-group solver state; see the module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationState {
    u: Coords,
    v: Coords,
    u_next: Coords,
    v_next: Coords,
    phase: Phase,
    accel: AccelerationScheduler,
    eval_count: usize,
}

impl IterationState {
    /// Fresh state with `u = v = x0`.
    ///
    /// # Errors
    /// - `OptError::EmptyCoordinates` for a zero-length `x0`.
    /// - `OptError::InvalidCoordinates` if `x0` has a non-finite entry.
    pub fn new(x0: Coords) -> OptResult<Self> {
        validate_coords(&x0)?;
        let dim = x0.len();
        Ok(Self {
            u: x0.clone(),
            v: x0,
            u_next: Coords::zeros(dim),
            v_next: Coords::zeros(dim),
            phase: Phase::Fresh,
            accel: AccelerationScheduler::new(),
            eval_count: 0,
        })
    }

    pub fn dim(&self) -> usize {
        self.v.len()
    }

    /// Accepted solution `u`.
    pub fn u(&self) -> &Coords {
        &self.u
    }

    /// Extrapolated point `v`; the next step evaluates the oracle here.
    pub fn v(&self) -> &Coords {
        &self.v
    }

    pub fn v_prev(&self) -> Option<&Coords> {
        match &self.phase {
            Phase::Fresh => None,
            Phase::Running(r) => Some(&r.v_prev),
        }
    }

    pub fn step_size(&self) -> Option<f64> {
        match &self.phase {
            Phase::Fresh => None,
            Phase::Running(r) => Some(r.step_size),
        }
    }

    /// Step size with the scale factor of the committing step divided out.
    ///
    /// The next step's fallback bound is this value times its own scale
    /// factor. Equals [`step_size`](Self::step_size) for unscaled steps.
    pub fn base_step(&self) -> Option<f64> {
        match &self.phase {
            Phase::Fresh => None,
            Phase::Running(r) => Some(r.base_step),
        }
    }

    pub fn history(&self) -> Option<&CurvaturePairHistory> {
        match &self.phase {
            Phase::Fresh => None,
            Phase::Running(r) => r.history.as_ref(),
        }
    }

    /// Momentum scalar `a_k`.
    pub fn a(&self) -> f64 {
        self.accel.a()
    }

    pub fn acceleration(&self) -> &AccelerationScheduler {
        &self.accel
    }

    /// Number of committed steps.
    pub fn eval_count(&self) -> usize {
        self.eval_count
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self.phase, Phase::Fresh)
    }

    // ---- Solver-only mutation ----

    /// Fill the scratch buffers:
    /// `u_next = v - step·g`, `v_next = u_next + coef (u_next - u)`.
    ///
    /// Returns `v_next` for in-place projection.
    pub(crate) fn stage(&mut self, step: f64, coef: f64, g: &Grad) -> &mut Coords {
        Zip::from(&mut self.u_next).and(&self.v).and(g).for_each(|un, &v, &g| *un = v - step * g);
        Zip::from(&mut self.v_next)
            .and(&self.u_next)
            .and(&self.u)
            .for_each(|vn, &un, &u| *vn = un + coef * (un - u));
        &mut self.v_next
    }

    /// Restore a scratch buffer a projector resized or corrupted.
    pub(crate) fn reset_scratch(&mut self) {
        let dim = self.dim();
        if self.v_next.len() != dim {
            self.v_next = Coords::zeros(dim);
        }
    }

    /// Commit a staged step.
    ///
    /// `v_prev ← v`, `u ← u_next`, `v ← v_next`, `a ← a_next`,
    /// `step_size ← step`, `base_step ← base`, `eval_count += 1`. On the
    /// first commit, `seed`
    /// (the buffer that held the seeded `v_prev`) becomes the new scratch
    /// and a history is created when `history_capacity` is `Some`.
    pub(crate) fn commit(
        &mut self, step: f64, base: f64, momentum: Momentum, pending: Option<CurvaturePair>,
        seed: Option<Coords>, history_capacity: Option<usize>,
    ) -> OptResult<()> {
        // Fallible work first; nothing below may fail.
        let new_history = match (&self.phase, history_capacity) {
            (Phase::Fresh, Some(cap)) => Some(CurvaturePairHistory::new(cap)?),
            _ => None,
        };

        std::mem::swap(&mut self.u, &mut self.u_next);
        let started = match &mut self.phase {
            Phase::Running(r) => {
                std::mem::swap(&mut r.v_prev, &mut self.v);
                std::mem::swap(&mut self.v, &mut self.v_next);
                r.step_size = step;
                r.base_step = base;
                if let (Some(hist), Some(pair)) = (r.history.as_mut(), pending) {
                    hist.push_pair(pair);
                }
                None
            }
            Phase::Fresh => {
                let mut history = new_history;
                if let (Some(hist), Some(pair)) = (history.as_mut(), pending) {
                    hist.push_pair(pair);
                }
                let scratch = seed.unwrap_or_else(|| Coords::zeros(self.u.len()));
                let v_next = std::mem::replace(&mut self.v_next, scratch);
                let v_prev = std::mem::replace(&mut self.v, v_next);
                Some(Running { v_prev, step_size: step, base_step: base, history })
            }
        };
        if let Some(running) = started {
            self.phase = Phase::Running(running);
        }
        self.accel.advance(momentum);
        self.eval_count += 1;
        Ok(())
    }
}
