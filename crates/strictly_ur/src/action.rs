//! First-class move values.
//!
//! A move describes one legal transition: introducing a piece, moving it
//! along its path, capturing an opposing piece, or scoring it off the end.

use crate::board::Board;
use crate::error::InvariantViolation;
use crate::shape::BoardShape;
use crate::types::{Piece, Player, Tile};
use serde::{Deserialize, Serialize};

/// A move offered by the rules for a particular roll.
///
/// `origin == None` introduces a new piece; `dest == None` scores the piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    mover: Player,
    origin: Option<Tile>,
    origin_piece: Option<Piece>,
    dest: Option<Tile>,
    dest_piece: Option<Piece>,
    captured_piece: Option<Piece>,
}

impl Move {
    /// Creates a move. Origin and destination tiles must come with their pieces.
    pub(crate) fn new(
        mover: Player,
        origin: Option<(Tile, Piece)>,
        dest: Option<(Tile, Piece)>,
        captured_piece: Option<Piece>,
    ) -> Self {
        Self {
            mover,
            origin: origin.map(|(tile, _)| tile),
            origin_piece: origin.map(|(_, piece)| piece),
            dest: dest.map(|(tile, _)| tile),
            dest_piece: dest.map(|(_, piece)| piece),
            captured_piece,
        }
    }

    /// The player making the move.
    pub fn mover(&self) -> Player {
        self.mover
    }

    /// Tile the piece leaves, `None` when introducing.
    pub fn origin(&self) -> Option<Tile> {
        self.origin
    }

    /// The piece before it moved.
    pub fn origin_piece(&self) -> Option<Piece> {
        self.origin_piece
    }

    /// Tile the piece lands on, `None` when scoring.
    pub fn dest(&self) -> Option<Tile> {
        self.dest
    }

    /// The piece after it moved.
    pub fn dest_piece(&self) -> Option<Piece> {
        self.dest_piece
    }

    /// The opposing piece knocked off the board, if any.
    pub fn captured_piece(&self) -> Option<Piece> {
        self.captured_piece
    }

    /// Returns true if the move brings a new piece onto the board.
    pub fn is_introducing(&self) -> bool {
        self.origin.is_none()
    }

    /// Returns true if the move takes a piece off the end of its path.
    pub fn is_scoring(&self) -> bool {
        self.dest.is_none()
    }

    /// Returns true if the move captures an opposing piece.
    pub fn captures(&self) -> bool {
        self.captured_piece.is_some()
    }

    /// Returns true if the piece lands on a rosette.
    pub fn is_landing_on_rosette(&self, shape: &BoardShape) -> bool {
        self.dest.is_some_and(|tile| shape.is_rosette(tile))
    }

    /// Applies the move to a board in place.
    pub fn apply(&self, board: &mut Board) -> Result<(), InvariantViolation> {
        if let Some(origin) = self.origin {
            let removed = board.set(origin, None)?;
            if removed != self.origin_piece {
                return Err(InvariantViolation::new(format!(
                    "Expected {:?} on {}, found {:?}",
                    self.origin_piece, origin, removed
                )));
            }
        }
        if let Some(dest) = self.dest {
            let replaced = board.set(dest, self.dest_piece)?;
            if replaced != self.captured_piece {
                return Err(InvariantViolation::new(format!(
                    "Expected {:?} to be captured on {}, found {:?}",
                    self.captured_piece, dest, replaced
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.origin, self.dest) {
            (None, Some(dest)) => write!(f, "{} introduces a piece to {}", self.mover, dest)?,
            (Some(origin), Some(dest)) => write!(f, "{} moves {} -> {}", self.mover, origin, dest)?,
            (Some(origin), None) => write!(f, "{} scores the piece on {}", self.mover, origin)?,
            (None, None) => write!(f, "{} passes", self.mover)?,
        }
        if self.captures() {
            write!(f, ", capturing")?;
        }
        Ok(())
    }
}
