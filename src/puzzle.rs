//! Puzzle representation types shared by the solver and the JSON front end.
//!
//! Everything here is plain data: cell tags, edge states, the endpoint policy
//! and the serializable puzzle description read and written by the CLI.

use serde::{Deserialize, Serialize};

use crate::error::PuzzleError;
use crate::grid::{Grid, Snapshot};
use crate::solver::is_solved;

/// Position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Step vector from `self` to `other`
    pub fn step_to(self, other: Position) -> (i32, i32) {
        (other.row - self.row, other.col - self.col)
    }
}

/// Clue tag carried by a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    /// Interior or free cell
    #[default]
    Unmarked,
    /// Start of a trail
    Head,
    /// End of a trail
    Tail,
    /// Head and tail coincide: the cell is a trail of its own
    HeadTail,
}

impl CellType {
    pub fn is_clue(self) -> bool {
        self != CellType::Unmarked
    }

    /// Check if a trail may start here
    pub fn is_head(self) -> bool {
        matches!(self, CellType::Head | CellType::HeadTail)
    }
}

/// State of a single edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeState {
    #[default]
    Undecided,
    Included,
    Excluded,
    /// Permanently excluded; survives the reset at the start of a search round
    Deleted,
}

impl EdgeState {
    pub fn is_undecided(self) -> bool {
        self == EdgeState::Undecided
    }

    pub fn is_included(self) -> bool {
        self == EdgeState::Included
    }
}

/// How trails are allowed to terminate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointPolicy {
    /// Every trail runs from a HEAD clue to a TAIL clue
    #[default]
    HeadTail,
    /// Only HEAD clues are given; a trail ends at any unmarked cell
    HeadOnly,
}

impl EndpointPolicy {
    /// Allowed degree range `(min, max)` for a cell of the given type
    pub fn degree_range(self, cell_type: CellType) -> (u8, u8) {
        match (cell_type, self) {
            (CellType::Head, _) | (CellType::Tail, _) => (1, 1),
            (CellType::HeadTail, _) => (0, 0),
            (CellType::Unmarked, EndpointPolicy::HeadTail) => (2, 2),
            (CellType::Unmarked, EndpointPolicy::HeadOnly) => (1, 2),
        }
    }

    /// Whether derived clues mark the far end of each trail as TAIL
    pub fn marks_tails(self) -> bool {
        self == EndpointPolicy::HeadTail
    }
}

/// A clue placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub position: Position,
    #[serde(rename = "type")]
    pub cell_type: CellType,
}

/// Serializable puzzle: grid size, clues and the reference solution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleFile {
    pub size: usize,
    #[serde(default)]
    pub policy: EndpointPolicy,
    pub clues: Vec<Clue>,
    /// Edge states in canonical order
    pub solution: Snapshot,
}

impl PuzzleFile {
    /// Capture the clues of `grid` together with its reference solution
    pub fn from_grid(grid: &Grid, solution: &Snapshot, policy: EndpointPolicy) -> Self {
        let clues = grid
            .clue_cells()
            .into_iter()
            .map(|cell| Clue {
                position: grid.position(cell),
                cell_type: grid.cell_type(cell),
            })
            .collect();

        Self {
            size: grid.size(),
            policy,
            clues,
            solution: solution.clone(),
        }
    }

    /// Build a fresh grid carrying the clues, and return it with the reference
    /// solution. The grid's edges are left undecided.
    ///
    /// The solution must assign every edge Included or Excluded and satisfy
    /// the clues under the file's policy.
    pub fn build(&self) -> Result<(Grid, Snapshot), PuzzleError> {
        let expected = Grid::edge_count(self.size)?;
        if self.solution.len() != expected {
            return Err(PuzzleError::SnapshotSizeMismatch {
                expected,
                actual: self.solution.len(),
            });
        }

        let mut grid = Grid::new(self.size)?;
        for clue in &self.clues {
            let cell = grid
                .cell_at(clue.position.row, clue.position.col)
                .ok_or(PuzzleError::ClueOutOfBounds {
                    row: clue.position.row,
                    col: clue.position.col,
                    size: self.size,
                })?;
            grid.set_cell_type(cell, clue.cell_type);
        }

        if let Some((edge, &state)) = self
            .solution
            .states()
            .iter()
            .enumerate()
            .find(|(_, s)| !matches!(s, EdgeState::Included | EdgeState::Excluded))
        {
            return Err(PuzzleError::UnsettledSolution { edge, state });
        }

        grid.restore(&self.solution)?;
        let solved = is_solved(&mut grid, self.policy);
        grid.reset_for_search();
        if !solved {
            return Err(PuzzleError::UnsolvedReference);
        }

        Ok((grid, self.solution.clone()))
    }
}
