//! Bounded curvature-pair history for the limited-memory quasi-Newton rule.
//!
//! Purpose
//! -------
//! Keep the `K` most recent `(s, y, ρ)` triples with `s = v - v_prev`,
//! `y = g - g_prev`, `ρ = 1 / (y·s)` and run the L-BFGS two-loop recursion
//! over them.
//!
//! Key behaviors
//! -------------
//! - FIFO eviction: pushing into a full history drops the oldest pair first,
//!   so the history never holds more than `K` pairs.
//! - Pairs whose curvature `y·s` is not strictly positive and finite are
//!   rejected. Accepting them would make `ρ` undefined (`y·s == 0`) or turn
//!   the implicit inverse-Hessian indefinite.
//! - [`two_loop_recursion`] works on any ordered pair sequence, so callers
//!   can evaluate the recursion with a pending pair that is only committed
//!   later (see [`CurvaturePairHistory::two_loop_with`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Iteration order is oldest → newest.
//! - All stored vectors share one dimension (the group dimension); the
//!   solver guarantees this by validating oracle output before building a
//!   pair.
use crate::optimization::{
    errors::OptResult,
    nesterov::{
        types::{Coords, Grad},
        validation::verify_history_capacity,
    },
};
use std::collections::VecDeque;

/// One curvature pair and its cached `ρ = 1 / (y·s)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvaturePair {
    s: Coords,
    y: Grad,
    rho: f64,
}

impl CurvaturePair {
    /// Build a pair, or `None` when `y·s` is not strictly positive and finite.
    pub fn new(s: Coords, y: Grad) -> Option<Self> {
        let ys = y.dot(&s);
        if !(ys.is_finite() && ys > 0.0) {
            return None;
        }
        let rho = 1.0 / ys;
        rho.is_finite().then_some(Self { s, y, rho })
    }

    pub fn s(&self) -> &Coords {
        &self.s
    }

    pub fn y(&self) -> &Grad {
        &self.y
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }
}

/// FIFO of at most `capacity` curvature pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvaturePairHistory {
    pairs: VecDeque<CurvaturePair>,
    capacity: usize,
}

impl CurvaturePairHistory {
    /// Empty history holding at most `capacity` pairs.
    ///
    /// # Errors
    /// - `OptError::InvalidHistoryCapacity` if `capacity == 0`.
    pub fn new(capacity: usize) -> OptResult<Self> {
        verify_history_capacity(capacity)?;
        Ok(Self { pairs: VecDeque::with_capacity(capacity), capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Pairs from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &CurvaturePair> + Clone {
        self.pairs.iter()
    }

    /// Try to append `(s, y)`; returns `false` if the pair was rejected for
    /// non-positive curvature.
    pub fn push(&mut self, s: Coords, y: Grad) -> bool {
        match CurvaturePair::new(s, y) {
            Some(pair) => {
                self.push_pair(pair);
                true
            }
            None => false,
        }
    }

    /// Append an already validated pair, evicting the oldest when full.
    pub fn push_pair(&mut self, pair: CurvaturePair) {
        if self.pairs.len() == self.capacity {
            self.pairs.pop_front();
        }
        self.pairs.push_back(pair);
    }

    /// Two-loop recursion over the stored pairs with right-hand side `g`.
    ///
    /// An empty history returns `g` unchanged.
    pub fn two_loop(&self, g: &Grad) -> Grad {
        two_loop_recursion(self.pairs.iter(), g)
    }

    /// Two-loop recursion over the history as it would look after pushing
    /// `pending`, without mutating it.
    ///
    /// When the history is full, the oldest stored pair is left out, exactly
    /// as [`push_pair`](Self::push_pair) would evict it.
    pub fn two_loop_with(&self, pending: &CurvaturePair, g: &Grad) -> Grad {
        let evicted = (self.pairs.len() + 1).saturating_sub(self.capacity);
        let pairs = self.pairs.iter().skip(evicted).chain(std::iter::once(pending));
        two_loop_recursion(pairs, g)
    }
}

/// L-BFGS two-loop recursion.
///
/// `pairs` must iterate oldest → newest. With `q = g`:
/// - newest → oldest: `αᵢ = ρᵢ (sᵢ·q)`, `q -= αᵢ yᵢ`;
/// - `r = q`;
/// - oldest → newest: `β = ρᵢ (yᵢ·r)`, `r += sᵢ (αᵢ - β)`.
///
/// Returns `r`, the implicit inverse-Hessian applied to `g`. No initial
/// Hessian scaling is applied.
pub fn two_loop_recursion<'a, I>(pairs: I, g: &Grad) -> Grad
where
    I: DoubleEndedIterator<Item = &'a CurvaturePair> + Clone,
{
    let mut q = g.clone();
    let mut alphas = Vec::new();
    for pair in pairs.clone().rev() {
        let alpha = pair.rho * pair.s.dot(&q);
        q.scaled_add(-alpha, &pair.y);
        alphas.push(alpha);
    }

    let mut r = q;
    for (pair, alpha) in pairs.zip(alphas.into_iter().rev()) {
        let beta = pair.rho * pair.y.dot(&r);
        r.scaled_add(alpha - beta, &pair.s);
    }
    r
}
