//! The routes pieces take around the board.

use crate::error::ConfigError;
use crate::types::{Player, Tile};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// The ordered tiles one player's pieces traverse, from entry to exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    player: Player,
    tiles: Vec<Tile>,
}

impl Path {
    /// Creates a path. Paths must have at least one tile and fewer than 255.
    pub fn new(player: Player, tiles: Vec<Tile>) -> Result<Self, ConfigError> {
        if tiles.is_empty() || tiles.len() >= usize::from(u8::MAX) {
            return Err(ConfigError::new(format!(
                "A path must have between 1 and 254 tiles, not {}",
                tiles.len()
            )));
        }
        Ok(Self { player, tiles })
    }

    /// The player walking this path.
    pub fn player(&self) -> Player {
        self.player
    }

    /// Tiles in walking order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Number of tiles; reaching this index scores the piece.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false, paths are never empty.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile at a path index.
    pub fn get(&self, index: usize) -> Option<Tile> {
        self.tiles.get(index).copied()
    }
}

/// Light and dark paths used together in one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    name: String,
    light: Path,
    dark: Path,
}

impl PathPair {
    /// Creates a pair, checking each path belongs to the right player.
    pub fn new(name: impl Into<String>, light: Path, dark: Path) -> Result<Self, ConfigError> {
        if light.player() != Player::Light || dark.player() != Player::Dark {
            return Err(ConfigError::new("Path pair players are swapped"));
        }
        Ok(Self {
            name: name.into(),
            light,
            dark,
        })
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Light's path.
    pub fn light(&self) -> &Path {
        &self.light
    }

    /// Dark's path.
    pub fn dark(&self) -> &Path {
        &self.dark
    }

    /// Path for the given player.
    pub fn get(&self, player: Player) -> &Path {
        match player {
            Player::Light => &self.light,
            Player::Dark => &self.dark,
        }
    }
}

/// Named path pairs with stable numeric ids.
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
pub enum PathType {
    /// R. C. Bell's path: up the own side, along the middle, back down the own side.
    Bell,
    /// The Masters Traditional Games path, finishing on the opponent's side.
    Masters,
    /// H. J. R. Murray's path: a long loop that walks the middle lane twice.
    Murray,
    /// The path for the Aseb board.
    Aseb,
}

impl PathType {
    /// Stable numeric id.
    pub fn id(self) -> u8 {
        match self {
            PathType::Bell => 1,
            PathType::Masters => 2,
            PathType::Murray => 3,
            PathType::Aseb => 4,
        }
    }

    /// Looks up a path type by its id.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(PathType::Bell),
            2 => Some(PathType::Masters),
            3 => Some(PathType::Murray),
            4 => Some(PathType::Aseb),
            _ => None,
        }
    }

    /// Builds the path pair. Dark's path mirrors Light's across the middle column.
    #[instrument]
    pub fn create_paths(self) -> Result<PathPair, ConfigError> {
        let light = self.light_tiles();
        let dark = light.iter().map(|tile| mirror(*tile)).collect();
        PathPair::new(
            self.to_string(),
            Path::new(Player::Light, light)?,
            Path::new(Player::Dark, dark)?,
        )
    }

    fn light_tiles(self) -> Vec<Tile> {
        let entry: [(u8, u8); 4] = [(0, 3), (0, 2), (0, 1), (0, 0)];
        let coords: Vec<(u8, u8)> = match self {
            PathType::Bell => entry
                .into_iter()
                .chain((0..8).map(|iy| (1, iy)))
                .chain([(0, 7), (0, 6)])
                .collect(),
            PathType::Masters => entry
                .into_iter()
                .chain((0..8).map(|iy| (1, iy)))
                .chain([(2, 7), (2, 6)])
                .collect(),
            PathType::Murray => entry
                .into_iter()
                .chain((0..7).map(|iy| (1, iy)))
                .chain([(2, 6), (2, 7), (1, 7), (0, 7), (0, 6)])
                .chain((0..7).rev().map(|iy| (1, iy)))
                .chain([(2, 0), (2, 1), (2, 2), (2, 3)])
                .collect(),
            PathType::Aseb => entry
                .into_iter()
                .chain((0..12).map(|iy| (1, iy)))
                .collect(),
        };
        coords.into_iter().map(|(ix, iy)| Tile::new(ix, iy)).collect()
    }
}

fn mirror(tile: Tile) -> Tile {
    Tile::new(2 - tile.ix(), tile.iy())
}
