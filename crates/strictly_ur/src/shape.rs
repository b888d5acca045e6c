//! Board shapes: which tiles exist and which of them are rosettes.

use crate::error::ConfigError;
use crate::path::PathPair;
use crate::types::Tile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// The set of tiles making up a board, with its rosette subset.
///
/// Shapes are normalised so that the smallest column and row coordinate
/// are both 1 (index 0). Two shapes with the same tiles and rosettes are
/// equal regardless of name.
#[derive(Debug, Clone)]
pub struct BoardShape {
    name: String,
    tiles: BTreeSet<Tile>,
    rosettes: BTreeSet<Tile>,
    width: u8,
    height: u8,
}

impl BoardShape {
    /// Creates a board shape, validating normalisation and rosette placement.
    #[instrument(skip(tiles, rosettes), fields(name = %name.as_ref()))]
    pub fn new(
        name: impl AsRef<str>,
        tiles: impl IntoIterator<Item = Tile>,
        rosettes: impl IntoIterator<Item = Tile>,
    ) -> Result<Self, ConfigError> {
        let tiles: BTreeSet<Tile> = tiles.into_iter().collect();
        let rosettes: BTreeSet<Tile> = rosettes.into_iter().collect();

        let (Some(min_x), Some(min_y)) = (
            tiles.iter().map(Tile::ix).min(),
            tiles.iter().map(Tile::iy).min(),
        ) else {
            return Err(ConfigError::new("A board shape requires at least one tile"));
        };
        if min_x != 0 || min_y != 0 {
            return Err(ConfigError::new(format!(
                "The board shape must have tiles at x = 1 and y = 1, \
                 but its minimum coordinates are x = {}, y = {}",
                min_x + 1,
                min_y + 1
            )));
        }

        if let Some(stray) = rosettes.iter().find(|tile| !tiles.contains(tile)) {
            return Err(ConfigError::new(format!(
                "Rosette {} is not a tile of the board",
                stray
            )));
        }

        let width = tiles.iter().map(Tile::ix).max().unwrap_or(0) + 1;
        let height = tiles.iter().map(Tile::iy).max().unwrap_or(0) + 1;
        debug!(width, height, area = tiles.len(), "Board shape created");

        Ok(Self {
            name: name.as_ref().to_string(),
            tiles,
            rosettes,
            width,
            height,
        })
    }

    /// Human-readable name of the shape.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All tiles of the board.
    pub fn tiles(&self) -> &BTreeSet<Tile> {
        &self.tiles
    }

    /// Rosette tiles.
    pub fn rosettes(&self) -> &BTreeSet<Tile> {
        &self.rosettes
    }

    /// Number of columns.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of tiles.
    pub fn area(&self) -> usize {
        self.tiles.len()
    }

    /// Returns true if the tile is part of the board.
    pub fn contains(&self, tile: Tile) -> bool {
        self.tiles.contains(&tile)
    }

    /// Returns true if the tile is a rosette.
    pub fn is_rosette(&self, tile: Tile) -> bool {
        self.rosettes.contains(&tile)
    }

    /// Returns true if every tile is on the board.
    pub fn contains_all(&self, tiles: &[Tile]) -> bool {
        tiles.iter().all(|tile| self.contains(*tile))
    }

    /// Returns true if both paths of the pair stay on the board.
    pub fn is_compatible(&self, paths: &PathPair) -> bool {
        self.contains_all(paths.light().tiles()) && self.contains_all(paths.dark().tiles())
    }

    /// Tiles ordered row by row, then column.
    pub fn tiles_by_row(&self) -> Vec<Tile> {
        let mut tiles: Vec<Tile> = self.tiles.iter().copied().collect();
        tiles.sort_by_key(|tile| (tile.iy(), tile.ix()));
        tiles
    }
}

impl PartialEq for BoardShape {
    fn eq(&self, other: &Self) -> bool {
        self.tiles == other.tiles && self.rosettes == other.rosettes
    }
}

impl Eq for BoardShape {}

/// Named board shapes with stable numeric ids.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum BoardType {
    /// The standard 3x8 board with a narrow bridge and five rosettes.
    Standard,
    /// The Aseb board: 3x4 start area and a long 12 tile central lane.
    Aseb,
}

impl BoardType {
    /// Stable numeric id.
    pub fn id(self) -> u8 {
        match self {
            BoardType::Standard => 1,
            BoardType::Aseb => 2,
        }
    }

    /// Looks up a board type by its id.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(BoardType::Standard),
            2 => Some(BoardType::Aseb),
            _ => None,
        }
    }

    /// Builds the shape described by this type.
    #[instrument]
    pub fn create_shape(self) -> Result<BoardShape, ConfigError> {
        match self {
            BoardType::Standard => {
                let tiles = (0..3u8)
                    .flat_map(|ix| (0..8u8).map(move |iy| Tile::new(ix, iy)))
                    .filter(|tile| tile.ix() == 1 || !(4..=5).contains(&tile.iy()));
                let rosettes = [
                    Tile::new(0, 0),
                    Tile::new(2, 0),
                    Tile::new(1, 3),
                    Tile::new(0, 6),
                    Tile::new(2, 6),
                ];
                BoardShape::new("Standard", tiles, rosettes)
            }
            BoardType::Aseb => {
                let tiles = (0..3u8)
                    .flat_map(|ix| (0..12u8).map(move |iy| Tile::new(ix, iy)))
                    .filter(|tile| tile.ix() == 1 || tile.iy() < 4);
                let rosettes = [
                    Tile::new(0, 3),
                    Tile::new(2, 3),
                    Tile::new(1, 7),
                    Tile::new(1, 11),
                ];
                BoardShape::new("Aseb", tiles, rosettes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn test_standard_shape() {
        let shape = BoardType::Standard.create_shape().expect("valid shape");
        assert_eq!(shape.area(), 20);
        assert_eq!(shape.width(), 3);
        assert_eq!(shape.height(), 8);
        assert!(shape.is_rosette(Tile::new(1, 3)));
        assert!(!shape.contains(Tile::new(0, 4)));
        assert!(shape.contains(Tile::new(1, 4)));
    }

    #[test]
    fn test_aseb_shape() {
        let shape = BoardType::Aseb.create_shape().expect("valid shape");
        assert_eq!(shape.area(), 20);
        assert_eq!(shape.height(), 12);
        assert!(!shape.contains(Tile::new(0, 4)));
    }

    #[test]
    fn test_unnormalised_shape_rejected() {
        let result = BoardShape::new("shifted", [Tile::new(1, 1), Tile::new(2, 1)], []);
        assert!(result.is_err());
    }

    #[test]
    fn test_rosette_off_board_rejected() {
        let result = BoardShape::new("bad", [Tile::new(0, 0)], [Tile::new(1, 1)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_shape_rejected() {
        assert!(BoardShape::new("empty", [], []).is_err());
    }

    #[test]
    fn test_equality_ignores_name() {
        let a = BoardShape::new("a", [Tile::new(0, 0)], []).expect("valid");
        let b = BoardShape::new("b", [Tile::new(0, 0)], []).expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn test_board_type_names_and_ids_unique() {
        let names: HashSet<String> = BoardType::iter().map(|t| t.to_string()).collect();
        let ids: HashSet<u8> = BoardType::iter().map(BoardType::id).collect();
        assert_eq!(names.len(), BoardType::iter().count());
        assert_eq!(ids.len(), BoardType::iter().count());
        for board in BoardType::iter() {
            assert_eq!(BoardType::from_id(board.id()), Some(board));
            assert_eq!(board.to_string().parse::<BoardType>().ok(), Some(board));
        }
    }
}
