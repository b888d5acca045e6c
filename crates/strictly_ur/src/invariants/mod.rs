//! First-class invariants for game positions.
//!
//! Invariants are logical properties that must hold at every reachable
//! position. They are checked after each move in debug builds and can be
//! tested independently.

use crate::error::InvariantViolation;
use crate::rules::RuleSet;

/// A logical property that must hold for a given state under a rule set.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(rules: &RuleSet, state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// A set of invariants that can be checked together.
///
/// Implementations are provided for tuples.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set.
    ///
    /// Returns Ok(()) if all invariants hold, or Err with a list of
    /// violations if any invariant fails.
    fn check_all(rules: &RuleSet, state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(rules: &RuleSet, state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if !I1::holds(rules, state) {
            violations.push(InvariantViolation::new(I1::description()));
        }

        if !I2::holds(rules, state) {
            violations.push(InvariantViolation::new(I2::description()));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

pub mod path_occupancy;
pub mod piece_conservation;

pub use path_occupancy::PathOccupancyInvariant;
pub use piece_conservation::PieceConservationInvariant;

/// All position invariants as a composable set.
pub type PositionInvariants = (PieceConservationInvariant, PathOccupancyInvariant);
