//! The board: a shape plus the pieces currently standing on it.

use crate::error::InvariantViolation;
use crate::shape::BoardShape;
use crate::types::{Piece, Player, Tile};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Pieces on a board of a given shape.
///
/// At most one piece stands on a tile. Boards are owned by the game state
/// that created them and copied, never mutated, when a state advances.
#[derive(Debug, Clone)]
pub struct Board {
    shape: Arc<BoardShape>,
    cells: Vec<Option<Piece>>,
}

impl Board {
    /// Creates an empty board.
    pub fn new(shape: Arc<BoardShape>) -> Self {
        let cells = vec![None; usize::from(shape.width()) * usize::from(shape.height())];
        Self { shape, cells }
    }

    /// The shape of the board.
    pub fn shape(&self) -> &BoardShape {
        &self.shape
    }

    /// Shared handle to the shape.
    pub fn shape_handle(&self) -> &Arc<BoardShape> {
        &self.shape
    }

    fn cell_index(&self, tile: Tile) -> Option<usize> {
        if !self.shape.contains(tile) {
            return None;
        }
        Some(usize::from(tile.iy()) * usize::from(self.shape.width()) + usize::from(tile.ix()))
    }

    /// The piece on a tile, if any. Tiles off the board are always empty.
    pub fn get(&self, tile: Tile) -> Option<Piece> {
        self.cell_index(tile).and_then(|index| self.cells[index])
    }

    /// Places or clears a piece, returning whatever stood there before.
    pub fn set(&mut self, tile: Tile, piece: Option<Piece>) -> Result<Option<Piece>, InvariantViolation> {
        let index = self.cell_index(tile).ok_or_else(|| {
            InvariantViolation::new(format!(
                "Tile {} is not part of the {} board",
                tile,
                self.shape.name()
            ))
        })?;
        Ok(std::mem::replace(&mut self.cells[index], piece))
    }

    /// Iterates over every occupied tile.
    pub fn pieces(&self) -> impl Iterator<Item = (Tile, Piece)> + '_ {
        let width = usize::from(self.shape.width());
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            cell.map(|piece| {
                let tile = Tile::new((index % width) as u8, (index / width) as u8);
                (tile, piece)
            })
        })
    }

    /// Number of pieces the player has on the board.
    pub fn count_pieces(&self, player: Player) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|piece| piece.owner == player)
            .count()
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells && self.shape == other.shape
    }
}

impl Eq for Board {}

impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cells.hash(state);
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for iy in 0..self.shape.height() {
            for ix in 0..self.shape.width() {
                let tile = Tile::new(ix, iy);
                let symbol = match self.get(tile) {
                    Some(piece) => piece.owner.symbol(),
                    None if self.shape.is_rosette(tile) => '*',
                    None if self.shape.contains(tile) => '.',
                    None => ' ',
                };
                write!(f, "{}", symbol)?;
            }
            if iy + 1 < self.shape.height() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::BoardType;

    fn standard_board() -> Board {
        Board::new(Arc::new(BoardType::Standard.create_shape().expect("valid shape")))
    }

    #[test]
    fn test_set_and_get() {
        let mut board = standard_board();
        let piece = Piece::new(Player::Light, 3);
        let previous = board.set(Tile::new(0, 0), Some(piece)).expect("on board");
        assert_eq!(previous, None);
        assert_eq!(board.get(Tile::new(0, 0)), Some(piece));
        assert_eq!(board.count_pieces(Player::Light), 1);
        assert_eq!(board.count_pieces(Player::Dark), 0);
    }

    #[test]
    fn test_set_off_board_fails() {
        let mut board = standard_board();
        let result = board.set(Tile::new(0, 4), Some(Piece::new(Player::Dark, 0)));
        assert!(result.is_err());
        assert_eq!(board.get(Tile::new(0, 4)), None);
    }

    #[test]
    fn test_pieces_iterates_occupied_tiles() {
        let mut board = standard_board();
        board.set(Tile::new(1, 5), Some(Piece::new(Player::Dark, 9))).expect("on board");
        board.set(Tile::new(2, 7), Some(Piece::new(Player::Dark, 11))).expect("on board");
        let pieces: Vec<_> = board.pieces().collect();
        assert_eq!(
            pieces,
            vec![
                (Tile::new(1, 5), Piece::new(Player::Dark, 9)),
                (Tile::new(2, 7), Piece::new(Player::Dark, 11)),
            ]
        );
    }

    #[test]
    fn test_copy_is_independent() {
        let mut board = standard_board();
        let copy = board.clone();
        board.set(Tile::new(1, 1), Some(Piece::new(Player::Light, 5))).expect("on board");
        assert_ne!(board, copy);
        assert_eq!(copy.count_pieces(Player::Light), 0);
    }

    #[test]
    fn test_display_marks_rosettes() {
        let board = standard_board();
        let rendered = board.to_string();
        let first_row = rendered.lines().next().expect("has rows");
        assert_eq!(first_row, "*.*");
        assert_eq!(rendered.lines().nth(4), Some(" . "));
    }
}
