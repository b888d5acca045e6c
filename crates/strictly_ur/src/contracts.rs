//! Contract-based validation for state transitions.
//!
//! Contracts define correctness through preconditions and postconditions:
//! {P(state, action)} action {Q(before, after)}.

use crate::action::Move;
use crate::error::InvariantViolation;
use crate::invariants::{InvariantSet, PositionInvariants};
use crate::rules::RuleSet;
use crate::typestate::{Position, WaitingForMove};
use tracing::{instrument, warn};

/// A contract defines preconditions and postconditions for state transitions.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(rules: &RuleSet, state: &S, action: &A) -> Result<(), InvariantViolation>;

    /// Checks postconditions on the position the action produced.
    fn post(rules: &RuleSet, before: &S, after: &Position) -> Result<(), InvariantViolation>;
}

// ─────────────────────────────────────────────────────────────
//  Move Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: It must be the mover's turn.
pub struct MoversTurn;

impl MoversTurn {
    /// Validates the precondition.
    #[instrument(level = "trace", skip(state))]
    pub fn check(mv: &Move, state: &WaitingForMove) -> Result<(), InvariantViolation> {
        if mv.mover() != state.position().turn() {
            Err(InvariantViolation::new(format!(
                "It is not {}'s turn",
                mv.mover()
            )))
        } else {
            Ok(())
        }
    }
}

/// Precondition: The move must be one the rules offered for this roll.
pub struct MoveIsOffered;

impl MoveIsOffered {
    /// Validates the precondition.
    #[instrument(level = "trace", skip(state))]
    pub fn check(mv: &Move, state: &WaitingForMove) -> Result<(), InvariantViolation> {
        if state.moves().contains(mv) {
            Ok(())
        } else {
            Err(InvariantViolation::new(format!(
                "The move \"{}\" was not offered for a roll of {}",
                mv,
                state.roll()
            )))
        }
    }
}

/// Composite precondition: a move is legal if it is the mover's turn and
/// the rules offered it.
pub struct LegalMove;

impl LegalMove {
    /// Validates all preconditions for a move.
    #[instrument(level = "trace", skip(state))]
    pub fn check(mv: &Move, state: &WaitingForMove) -> Result<(), InvariantViolation> {
        MoversTurn::check(mv, state)?;
        MoveIsOffered::check(mv, state)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Move Contract (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for move actions.
///
/// Preconditions:
/// - Must be the mover's turn
/// - Move must have been offered
///
/// Postconditions:
/// - Pieces are conserved
/// - Pieces stand on their paths
pub struct MoveContract;

impl Contract<WaitingForMove, Move> for MoveContract {
    fn pre(_rules: &RuleSet, state: &WaitingForMove, action: &Move) -> Result<(), InvariantViolation> {
        LegalMove::check(action, state)
    }

    fn post(rules: &RuleSet, _before: &WaitingForMove, after: &Position) -> Result<(), InvariantViolation> {
        PositionInvariants::check_all(rules, after).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%descriptions, "Postcondition failed");
            InvariantViolation::new(format!("Postcondition failed: {}", descriptions))
        })
    }
}
