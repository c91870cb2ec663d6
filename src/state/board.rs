//! Board geometry, cell states and player identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of categories (board columns).
pub const CATEGORY_COUNT: usize = 6;
/// Number of clue value tiers (board rows).
pub const TIER_COUNT: usize = 5;
/// Number of contestants.
pub const PLAYER_COUNT: usize = 4;

/// Index of one of the four contestants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Build a player id from a zero-based index, rejecting anything past the last seat.
    pub fn new(index: usize) -> Option<Self> {
        (index < PLAYER_COUNT).then_some(Self(index as u8))
    }

    /// Map a buzzer button byte (`'1'..='4'`) to the matching player.
    pub fn from_button(byte: u8) -> Option<Self> {
        byte.checked_sub(b'1').and_then(|index| Self::new(index as usize))
    }

    /// Zero-based index usable for per-player arrays.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All players in seat order.
    pub fn all() -> impl Iterator<Item = PlayerId> {
        (0..PLAYER_COUNT as u8).map(PlayerId)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0 + 1)
    }
}

impl TryFrom<i64> for PlayerId {
    type Error = InvalidPlayer;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(PlayerId::new)
            .ok_or(InvalidPlayer(value))
    }
}

/// Raised when a persisted value does not name one of the four players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("`{0}` is not a player index (expected 0..{PLAYER_COUNT})")]
pub struct InvalidPlayer(pub i64);

/// State of a single board cell.
///
/// Persisted as `null` (unrevealed), `-1` (ignored) or the owning player's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Option<i64>", into = "Option<i64>")]
pub enum Cell {
    /// Clue has not been played yet.
    #[default]
    Unrevealed,
    /// Clue was answered correctly by this player.
    Claimed(PlayerId),
    /// Clue was revealed without a winner and can no longer be claimed.
    Ignored,
}

impl Cell {
    /// Whether the clue behind this cell can still be selected.
    pub fn is_unrevealed(self) -> bool {
        matches!(self, Cell::Unrevealed)
    }
}

impl TryFrom<Option<i64>> for Cell {
    type Error = InvalidPlayer;

    fn try_from(value: Option<i64>) -> Result<Self, Self::Error> {
        match value {
            None => Ok(Cell::Unrevealed),
            Some(-1) => Ok(Cell::Ignored),
            Some(index) => PlayerId::try_from(index).map(Cell::Claimed),
        }
    }
}

impl From<Cell> for Option<i64> {
    fn from(value: Cell) -> Self {
        match value {
            Cell::Unrevealed => None,
            Cell::Ignored => Some(-1),
            Cell::Claimed(player) => Some(player.index() as i64),
        }
    }
}

/// Coordinates of a board cell: column is the category, row the value tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPos {
    /// Category index.
    pub column: usize,
    /// Value tier index, `0` being the cheapest clue.
    pub row: usize,
}

impl CellPos {
    /// Validate coordinates against the board dimensions.
    pub fn new(column: usize, row: usize) -> Option<Self> {
        (column < CATEGORY_COUNT && row < TIER_COUNT).then_some(Self { column, row })
    }

    /// Points won or lost on this clue.
    pub fn value(self) -> i32 {
        100 * (self.row as i32 + 1)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Shape violations found while rebuilding a board from nested lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardShapeError {
    /// Wrong number of categories.
    #[error("board must have {CATEGORY_COUNT} columns, found {0}")]
    Columns(usize),
    /// A category with the wrong number of clues.
    #[error("board column {column} must have {TIER_COUNT} rows, found {rows}")]
    Rows {
        /// Offending column.
        column: usize,
        /// Rows found in that column.
        rows: usize,
    },
}

/// Fixed 6×5 grid of cells, indexed column-major like the category layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Cell; TIER_COUNT]; CATEGORY_COUNT],
}

impl Board {
    /// Fresh board with every clue unrevealed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a cell.
    pub fn get(&self, pos: CellPos) -> Cell {
        self.cells[pos.column][pos.row]
    }

    pub(crate) fn set(&mut self, pos: CellPos, cell: Cell) {
        self.cells[pos.column][pos.row] = cell;
    }

    /// Clues still waiting to be picked.
    pub fn remaining(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_unrevealed()).count()
    }

    /// True once no cell is left unrevealed.
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Board {
    type Error = BoardShapeError;

    fn try_from(value: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        if value.len() != CATEGORY_COUNT {
            return Err(BoardShapeError::Columns(value.len()));
        }

        let mut board = Board::new();
        for (column, cells) in value.into_iter().enumerate() {
            board.cells[column] = cells
                .try_into()
                .map_err(|cells: Vec<Cell>| BoardShapeError::Rows {
                    column,
                    rows: cells.len(),
                })?;
        }
        Ok(board)
    }
}

impl From<&Board> for Vec<Vec<Cell>> {
    fn from(value: &Board) -> Self {
        value.cells.iter().map(|column| column.to_vec()).collect()
    }
}
