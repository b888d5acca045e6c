//! Path occupancy: every piece stands where its path index says it does.

use super::Invariant;
use crate::rules::RuleSet;
use crate::typestate::Position;

/// Invariant: a piece with path index `i` stands on tile `i` of its
/// owner's path.
pub struct PathOccupancyInvariant;

impl Invariant<Position> for PathOccupancyInvariant {
    fn holds(rules: &RuleSet, position: &Position) -> bool {
        position.board().pieces().all(|(tile, piece)| {
            rules
                .paths()
                .get(piece.owner)
                .get(usize::from(piece.path_index))
                == Some(tile)
        })
    }

    fn description() -> &'static str {
        "Every piece stands on its owner's path at its path index"
    }
}
