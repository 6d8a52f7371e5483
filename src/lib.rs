//! Generator and uniqueness verifier for turn-constrained path puzzles.
//!
//! A puzzle is a square grid with HEAD/TAIL clue cells. A solution joins the
//! clues with trails that touch every cell exactly once and never turn both
//! left and right. This crate grows random reference solutions, derives their
//! clues, and proves or disproves that the clues admit no other solution.

pub mod error;
pub mod generator;
pub mod grid;
pub mod pairer;
pub mod propagation;
pub mod puzzle;
pub mod solver;
pub mod trail;

// Re-export main types
pub use error::PuzzleError;
pub use generator::generate;
pub use grid::{CellId, EdgeId, Grid, Snapshot};
pub use pairer::{pair_heads_and_tails, Pairing};
pub use propagation::{propagate, SolveOutput};
pub use puzzle::{CellType, Clue, EdgeState, EndpointPolicy, Position, PuzzleFile};
pub use solver::{
    eliminate_ambiguity, find_alternate_solution, find_any_solution, is_solved, Alternate,
    EliminationReport, SearchStats, SolverConfig,
};
pub use trail::{classify_turns, Trail, TurnType};
