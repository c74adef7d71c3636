//! Nesterov momentum sequence.
//!
//! The accelerated solver carries a scalar `a_k` that starts at `1` and grows
//! by the recurrence
//!
//! ```text
//! a_{k+1} = (1 + sqrt(4 a_k² + 1)) / 2
//! coef_k  = (a_k - 1) / a_{k+1}
//! ```
//!
//! `coef_k` weights the extrapolation `v_{k+1} = u_{k+1} + coef_k (u_{k+1} - u_k)`.
//! It is `0` on the first step and tends to `1` from below.
//!
//! [`AccelerationScheduler::peek`] computes the next pair without mutating;
//! the solver calls [`AccelerationScheduler::advance`] only when it commits
//! a step, so a failed step never moves the sequence.

/// Next value of the momentum sequence.
#[inline]
pub fn next_acceleration(a: f64) -> f64 {
    (1.0 + (4.0 * a * a + 1.0).sqrt()) / 2.0
}

/// Extrapolation weight for the transition `a -> a_next`.
#[inline]
pub fn momentum_coefficient(a: f64, a_next: f64) -> f64 {
    (a - 1.0) / a_next
}

/// One transition of the momentum sequence, computed but not yet applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    pub a_next: f64,
    pub coef: f64,
}

/// Per-group momentum state. Invariant: `a >= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelerationScheduler {
    a: f64,
}

impl AccelerationScheduler {
    pub fn new() -> Self {
        Self { a: 1.0 }
    }

    /// Current `a_k`.
    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn peek(&self) -> Momentum {
        let a_next = next_acceleration(self.a);
        Momentum { a_next, coef: momentum_coefficient(self.a, a_next) }
    }

    /// Apply a transition previously obtained from [`peek`](Self::peek).
    pub fn advance(&mut self, momentum: Momentum) {
        self.a = momentum.a_next;
    }
}

impl Default for AccelerationScheduler {
    fn default() -> Self {
        Self::new()
    }
}
