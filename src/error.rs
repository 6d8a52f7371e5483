//! Error types surfaced at the library boundary.
//!
//! Contradictions found while searching are not errors; they are reported as
//! [`SearchOutcome::NoSolution`](crate::solver::SearchOutcome) and recovered
//! by backtracking. Only precondition violations end up here.

use std::error;
use std::fmt;

use crate::puzzle::EdgeState;

/// Errors returned by grid construction, clue loading and snapshot comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    /// Grid size is 0, or so large its cell or edge count overflows.
    InvalidSize(usize),

    /// Two edge-state snapshots of different length were compared, or a
    /// snapshot was applied to a grid of a different size.
    SnapshotSizeMismatch { expected: usize, actual: usize },

    /// A clue refers to a cell outside the grid.
    ClueOutOfBounds { row: i32, col: i32, size: usize },

    /// A reference solution holds a state other than Included or Excluded.
    UnsettledSolution { edge: usize, state: EdgeState },

    /// A reference solution does not satisfy its own clues.
    UnsolvedReference,
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleError::InvalidSize(size) => {
                write!(f, "invalid grid size {} (must be at least 1 and fit in memory)", size)
            }
            PuzzleError::SnapshotSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "snapshot has {} edge states, expected {}",
                    actual, expected
                )
            }
            PuzzleError::ClueOutOfBounds { row, col, size } => {
                write!(
                    f,
                    "clue at ({}, {}) is outside the {}x{} grid",
                    row, col, size, size
                )
            }
            PuzzleError::UnsettledSolution { edge, state } => {
                write!(f, "solution edge {} is {:?}, expected included or excluded", edge, state)
            }
            PuzzleError::UnsolvedReference => {
                write!(f, "solution does not satisfy the clues")
            }
        }
    }
}

impl error::Error for PuzzleError {}
