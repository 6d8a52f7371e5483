//! Grid topology and edge-state bookkeeping.
//!
//! Cells and edges live in two arenas addressed by index. A cell knows the ids
//! of its incident edges, an edge knows the ids of its two cells. Cell degree
//! is never set directly: it follows from edge-state transitions in
//! [`Grid::set_state`] and [`Grid::restore`].

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::PuzzleError;
use crate::puzzle::{CellType, EdgeState, Position};

/// Index of a cell in the grid arena (`row * size + col`)
pub type CellId = usize;

/// Index of an edge in canonical order
pub type EdgeId = usize;

/// A grid cell
#[derive(Debug, Clone)]
pub struct Cell {
    position: Position,
    cell_type: CellType,
    degree: u8,
    visited: bool,
    edges: SmallVec<[EdgeId; 4]>,
}

/// An edge between two side-adjacent cells
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    cells: (CellId, CellId),
    state: EdgeState,
}

/// Edge states in canonical edge order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Vec<EdgeState>);

impl Snapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn states(&self) -> &[EdgeState] {
        &self.0
    }

    pub fn get(&self, edge: EdgeId) -> Option<EdgeState> {
        self.0.get(edge).copied()
    }

    pub fn included_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_included()).count()
    }

    /// Copy with every Undecided edge turned Excluded
    pub fn settled(&self) -> Snapshot {
        Snapshot(
            self.0
                .iter()
                .map(|&s| if s.is_undecided() { EdgeState::Excluded } else { s })
                .collect(),
        )
    }

    /// First edge that is Included here but not in `other`.
    ///
    /// Snapshots of different length come from different grids and cannot
    /// be compared.
    pub fn first_difference(&self, other: &Snapshot) -> Result<Option<EdgeId>, PuzzleError> {
        if self.len() != other.len() {
            return Err(PuzzleError::SnapshotSizeMismatch {
                expected: other.len(),
                actual: self.len(),
            });
        }
        Ok(self
            .0
            .iter()
            .zip(&other.0)
            .position(|(mine, theirs)| mine.is_included() && !theirs.is_included()))
    }
}

impl From<Vec<EdgeState>> for Snapshot {
    fn from(states: Vec<EdgeState>) -> Self {
        Snapshot(states)
    }
}

/// Cell and edge counts for a grid side, rejecting 0 and overflowing sizes
fn dimensions(size: usize) -> Result<(usize, usize), PuzzleError> {
    let invalid = || PuzzleError::InvalidSize(size);
    if size == 0 {
        return Err(invalid());
    }
    let cells = size.checked_mul(size).ok_or_else(invalid)?;
    let edges = (size - 1)
        .checked_mul(size)
        .and_then(|n| n.checked_mul(2))
        .ok_or_else(invalid)?;
    Ok((cells, edges))
}

/// Square grid of cells with all horizontal and vertical adjacency edges
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
    edges: Vec<Edge>,
}

impl Grid {
    /// Build a `size` x `size` grid. Edges are numbered horizontal row-major
    /// first, then vertical row-major.
    pub fn new(size: usize) -> Result<Self, PuzzleError> {
        let (num_cells, num_edges) = dimensions(size)?;

        let mut cells = Vec::with_capacity(num_cells);
        for row in 0..size {
            for col in 0..size {
                cells.push(Cell {
                    position: Position::new(row as i32, col as i32),
                    cell_type: CellType::Unmarked,
                    degree: 0,
                    visited: false,
                    edges: SmallVec::new(),
                });
            }
        }

        let mut grid = Self {
            size,
            cells,
            edges: Vec::with_capacity(num_edges),
        };

        for row in 0..size {
            for col in 0..size - 1 {
                let a = row * size + col;
                grid.add_edge(a, a + 1);
            }
        }
        for row in 0..size - 1 {
            for col in 0..size {
                let a = row * size + col;
                grid.add_edge(a, a + size);
            }
        }

        Ok(grid)
    }

    /// Number of edges a `size` x `size` grid has, without building it
    pub fn edge_count(size: usize) -> Result<usize, PuzzleError> {
        dimensions(size).map(|(_, edges)| edges)
    }

    fn add_edge(&mut self, a: CellId, b: CellId) {
        let id = self.edges.len();
        self.edges.push(Edge {
            cells: (a, b),
            state: EdgeState::Undecided,
        });
        self.cells[a].edges.push(id);
        self.cells[b].edges.push(id);
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Cell at `(row, col)`, or `None` outside the grid
    pub fn cell_at(&self, row: i32, col: i32) -> Option<CellId> {
        let n = self.size as i32;
        if row < 0 || col < 0 || row >= n || col >= n {
            return None;
        }
        Some(row as usize * self.size + col as usize)
    }

    pub fn position(&self, cell: CellId) -> Position {
        self.cells[cell].position
    }

    pub fn degree(&self, cell: CellId) -> u8 {
        self.cells[cell].degree
    }

    pub fn cell_type(&self, cell: CellId) -> CellType {
        self.cells[cell].cell_type
    }

    pub fn set_cell_type(&mut self, cell: CellId, cell_type: CellType) {
        self.cells[cell].cell_type = cell_type;
    }

    /// Reset every cell to Unmarked
    pub fn clear_cell_types(&mut self) {
        for cell in &mut self.cells {
            cell.cell_type = CellType::Unmarked;
        }
    }

    /// Incident edges in construction order
    pub fn adjacent_edges(&self, cell: CellId) -> &[EdgeId] {
        &self.cells[cell].edges
    }

    pub fn endpoints(&self, edge: EdgeId) -> (CellId, CellId) {
        self.edges[edge].cells
    }

    /// The cell across `edge` from `cell`
    pub fn other_end(&self, edge: EdgeId, cell: CellId) -> CellId {
        let (a, b) = self.edges[edge].cells;
        if a == cell {
            b
        } else {
            a
        }
    }

    pub fn state(&self, edge: EdgeId) -> EdgeState {
        self.edges[edge].state
    }

    /// Change the state of `edge`, keeping both endpoint degrees in step.
    ///
    /// Returns `true` if the state changed. A Deleted edge stays Deleted;
    /// only [`Grid::restore`] and [`Grid::clear_deleted`] bring it back.
    pub fn set_state(&mut self, edge: EdgeId, new_state: EdgeState) -> bool {
        let current = self.edges[edge].state;
        if current == new_state || current == EdgeState::Deleted {
            return false;
        }
        self.transition(edge, new_state);
        true
    }

    fn transition(&mut self, edge: EdgeId, new_state: EdgeState) {
        let Edge { cells: (a, b), state } = self.edges[edge];
        if state == new_state {
            return;
        }
        if state == EdgeState::Included {
            self.cells[a].degree -= 1;
            self.cells[b].degree -= 1;
        }
        if new_state == EdgeState::Included {
            self.cells[a].degree += 1;
            self.cells[b].degree += 1;
        }
        self.edges[edge].state = new_state;
    }

    /// Number of Undecided edges around `cell`
    pub fn undecided_count(&self, cell: CellId) -> usize {
        self.cells[cell]
            .edges
            .iter()
            .filter(|&&e| self.edges[e].state.is_undecided())
            .count()
    }

    pub fn first_undecided(&self) -> Option<EdgeId> {
        self.edges.iter().position(|e| e.state.is_undecided())
    }

    /// Cells carrying any clue, in id order
    pub fn clue_cells(&self) -> Vec<CellId> {
        (0..self.cells.len())
            .filter(|&c| self.cells[c].cell_type.is_clue())
            .collect()
    }

    pub fn is_visited(&self, cell: CellId) -> bool {
        self.cells[cell].visited
    }

    pub fn mark_visited(&mut self, cell: CellId) {
        self.cells[cell].visited = true;
    }

    pub fn reset_visited(&mut self) {
        for cell in &mut self.cells {
            cell.visited = false;
        }
    }

    /// Start of a search round: every edge except Deleted ones becomes Undecided
    pub fn reset_for_search(&mut self) {
        for edge in 0..self.edges.len() {
            self.set_state(edge, EdgeState::Undecided);
        }
    }

    /// Turn every Deleted edge back into an Undecided one
    pub fn clear_deleted(&mut self) {
        for edge in 0..self.edges.len() {
            if self.edges[edge].state == EdgeState::Deleted {
                self.transition(edge, EdgeState::Undecided);
            }
        }
    }

    /// Mark every remaining Undecided edge Excluded
    pub fn exclude_undecided(&mut self) {
        for edge in 0..self.edges.len() {
            if self.edges[edge].state.is_undecided() {
                self.transition(edge, EdgeState::Excluded);
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.edges.iter().map(|e| e.state).collect())
    }

    /// Re-establish exactly the states recorded in `snapshot`
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), PuzzleError> {
        self.check_len(snapshot)?;
        self.rewind(snapshot);
        Ok(())
    }

    /// Roll back to a snapshot taken from this same grid
    pub(crate) fn rewind(&mut self, snapshot: &Snapshot) {
        debug_assert_eq!(snapshot.len(), self.edges.len());
        for (edge, &state) in snapshot.0.iter().enumerate() {
            self.transition(edge, state);
        }
    }

    /// Apply a solution while keeping currently Deleted edges deleted
    pub fn load_solution(&mut self, solution: &Snapshot) -> Result<(), PuzzleError> {
        self.check_len(solution)?;
        for (edge, &state) in solution.0.iter().enumerate() {
            self.set_state(edge, state);
        }
        Ok(())
    }

    fn check_len(&self, snapshot: &Snapshot) -> Result<(), PuzzleError> {
        if snapshot.len() != self.edges.len() {
            return Err(PuzzleError::SnapshotSizeMismatch {
                expected: self.edges.len(),
                actual: snapshot.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_degrees_derived(grid: &Grid) {
        for cell in 0..grid.num_cells() {
            let included = grid
                .adjacent_edges(cell)
                .iter()
                .filter(|&&e| grid.state(e).is_included())
                .count();
            assert_eq!(grid.degree(cell) as usize, included, "cell {}", cell);
        }
    }

    #[test]
    fn test_grid_shape() {
        let grid = Grid::new(4).unwrap();
        assert_eq!(grid.num_cells(), 16);
        assert_eq!(grid.num_edges(), 24);

        // corners have 2 edges, border cells 3, inner cells 4
        assert_eq!(grid.adjacent_edges(0).len(), 2);
        assert_eq!(grid.adjacent_edges(1).len(), 3);
        assert_eq!(grid.adjacent_edges(5).len(), 4);

        // horizontal edges first, then vertical
        assert_eq!(grid.endpoints(0), (0, 1));
        assert_eq!(grid.endpoints(12), (0, 4));
        assert_eq!(grid.other_end(12, 4), 0);
    }

    #[test]
    fn test_single_cell_grid() {
        let grid = Grid::new(1).unwrap();
        assert_eq!(grid.num_cells(), 1);
        assert_eq!(grid.num_edges(), 0);
        assert_eq!(Grid::new(0).unwrap_err(), PuzzleError::InvalidSize(0));
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let huge = 1usize << (usize::BITS / 2 + 1);
        assert_eq!(Grid::new(huge).unwrap_err(), PuzzleError::InvalidSize(huge));
        assert_eq!(Grid::edge_count(huge).unwrap_err(), PuzzleError::InvalidSize(huge));
        assert_eq!(Grid::edge_count(usize::MAX).unwrap_err(), PuzzleError::InvalidSize(usize::MAX));
        assert_eq!(Grid::edge_count(3).unwrap(), 12);
    }

    #[test]
    fn test_set_state_updates_degrees() {
        let mut grid = Grid::new(3).unwrap();
        assert!(grid.set_state(0, EdgeState::Included));
        assert_eq!(grid.degree(0), 1);
        assert_eq!(grid.degree(1), 1);

        // same state is a no-op
        assert!(!grid.set_state(0, EdgeState::Included));
        assert_eq!(grid.degree(0), 1);

        grid.set_state(0, EdgeState::Excluded);
        assert_eq!(grid.degree(0), 0);
        assert_eq!(grid.degree(1), 0);
    }

    #[test]
    fn test_deleted_survives_reset() {
        let mut grid = Grid::new(3).unwrap();
        grid.set_state(2, EdgeState::Deleted);
        grid.set_state(3, EdgeState::Included);
        assert!(!grid.set_state(2, EdgeState::Included));

        grid.reset_for_search();
        assert_eq!(grid.state(2), EdgeState::Deleted);
        assert_eq!(grid.state(3), EdgeState::Undecided);

        grid.clear_deleted();
        assert_eq!(grid.state(2), EdgeState::Undecided);
    }

    #[test]
    fn test_snapshot_restore_and_compare() {
        let mut grid = Grid::new(2).unwrap();
        let empty = grid.snapshot();
        grid.set_state(0, EdgeState::Included);
        grid.set_state(3, EdgeState::Included);
        let saved = grid.snapshot();
        assert_eq!(saved.first_difference(&empty).unwrap(), Some(0));
        assert_eq!(empty.first_difference(&saved).unwrap(), None);

        grid.restore(&empty).unwrap();
        assert_eq!(grid.degree(1), 0);
        grid.restore(&saved).unwrap();
        assert_eq!(grid.degree(1), 2);
        assert_degrees_derived(&grid);

        let other = Grid::new(3).unwrap().snapshot();
        assert!(saved.first_difference(&other).is_err());
        assert!(grid.restore(&other).is_err());
    }

    proptest! {
        #[test]
        fn prop_degree_matches_included_edges(
            ops in prop::collection::vec((0usize..24, 0u8..5), 0..60)
        ) {
            let mut grid = Grid::new(4).unwrap();
            let mut saved = grid.snapshot();
            for (edge, op) in ops {
                match op {
                    0 => { grid.set_state(edge, EdgeState::Included); }
                    1 => { grid.set_state(edge, EdgeState::Excluded); }
                    2 => { grid.set_state(edge, EdgeState::Deleted); }
                    3 => saved = grid.snapshot(),
                    _ => grid.restore(&saved).unwrap(),
                }
                if edge % 7 == 0 {
                    grid.reset_for_search();
                }
                assert_degrees_derived(&grid);
            }
        }
    }
}
