//! Ready-made constraint projectors.
//!
//! - [`IdentityProjector`]: leaves the candidate untouched (unconstrained
//!   problems, tests).
//! - [`BoxProjector`]: clamps every coordinate into `[lower_i, upper_i]`,
//!   the usual legality restoration for cells that must stay inside the
//!   placement region.
//!
//! Drivers with richer legality rules implement
//! [`ConstraintProjector`] themselves or pass a closure.
use crate::optimization::{
    errors::{OptError, OptResult},
    nesterov::{traits::ConstraintProjector, types::Coords},
};
use ndarray::Zip;

/// No-op projector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityProjector;

impl ConstraintProjector for IdentityProjector {
    fn project(&mut self, _x: &mut Coords) -> OptResult<()> {
        Ok(())
    }
}

/// Coordinate-wise clamp into `[lower, upper]`.
///
/// Infinite bounds are allowed and leave that side open.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxProjector {
    lower: Coords,
    upper: Coords,
}

impl BoxProjector {
    /// Validated box.
    ///
    /// # Errors
    /// - [`OptError::BoundsDimMismatch`] if `lower` and `upper` differ in length.
    /// - [`OptError::InvalidBounds`] for a `NaN` bound or `lower_i > upper_i`.
    pub fn new(lower: Coords, upper: Coords) -> OptResult<Self> {
        if lower.len() != upper.len() {
            return Err(OptError::BoundsDimMismatch { expected: lower.len(), found: upper.len() });
        }
        for (index, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if lo.is_nan() || hi.is_nan() {
                return Err(OptError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                    reason: "Bounds must not be NaN.",
                });
            }
            if lo > hi {
                return Err(OptError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                    reason: "Lower bound must not exceed the upper bound.",
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Same `[lower, upper]` interval for all `dim` coordinates.
    pub fn uniform(dim: usize, lower: f64, upper: f64) -> OptResult<Self> {
        Self::new(Coords::from_elem(dim, lower), Coords::from_elem(dim, upper))
    }

    pub fn lower(&self) -> &Coords {
        &self.lower
    }

    pub fn upper(&self) -> &Coords {
        &self.upper
    }
}

impl ConstraintProjector for BoxProjector {
    fn project(&mut self, x: &mut Coords) -> OptResult<()> {
        if x.len() != self.lower.len() {
            return Err(OptError::BoundsDimMismatch { expected: self.lower.len(), found: x.len() });
        }
        Zip::from(x).and(&self.lower).and(&self.upper).for_each(|v, &lo, &hi| *v = (*v).clamp(lo, hi));
        Ok(())
    }
}
