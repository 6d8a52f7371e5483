//! Local degree deductions, iterated to a fixpoint.
//!
//! Each cell has a required degree range (see
//! [`EndpointPolicy::degree_range`]). A cell that is already full excludes its
//! remaining undecided edges; a cell that needs exactly as many edges as it has
//! undecided ones includes them all; a cell that can no longer reach its
//! minimum is a contradiction.

use tracing::trace;

use crate::grid::{CellId, Grid};
use crate::puzzle::{CellType, EdgeState, EndpointPolicy};

/// Outcome of a propagation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutput {
    NoChange,
    Updated,
    /// Contradiction: the current branch has no solution
    Failed,
}

impl SolveOutput {
    /// Combine the results of two independent steps
    fn merge(self, other: SolveOutput) -> SolveOutput {
        match (self, other) {
            (SolveOutput::Failed, _) | (_, SolveOutput::Failed) => SolveOutput::Failed,
            (SolveOutput::Updated, _) | (_, SolveOutput::Updated) => SolveOutput::Updated,
            _ => SolveOutput::NoChange,
        }
    }
}

/// Set every undecided edge around `cell` to `state`
fn decide_undecided(grid: &mut Grid, cell: CellId, state: EdgeState) -> SolveOutput {
    let mut changed = false;
    for i in 0..grid.adjacent_edges(cell).len() {
        let edge = grid.adjacent_edges(cell)[i];
        if grid.state(edge).is_undecided() {
            changed |= grid.set_state(edge, state);
        }
    }
    if changed {
        SolveOutput::Updated
    } else {
        SolveOutput::NoChange
    }
}

/// Apply the local deduction rules to one cell
pub fn propagate_cell(grid: &mut Grid, cell: CellId, policy: EndpointPolicy) -> SolveOutput {
    let cell_type = grid.cell_type(cell);
    let (min_degree, max_degree) = policy.degree_range(cell_type);
    let degree = grid.degree(cell);

    if degree > max_degree {
        return SolveOutput::Failed;
    }
    if degree == max_degree {
        return decide_undecided(grid, cell, EdgeState::Excluded);
    }

    let undecided = grid.undecided_count(cell);

    // An empty cell with a single way out has to take it.
    if cell_type == CellType::Unmarked && degree == 0 && undecided == 1 {
        return decide_undecided(grid, cell, EdgeState::Included);
    }

    let needed = min_degree.saturating_sub(degree) as usize;
    if undecided < needed {
        SolveOutput::Failed
    } else if needed > 0 && undecided == needed {
        decide_undecided(grid, cell, EdgeState::Included)
    } else {
        SolveOutput::NoChange
    }
}

/// One pass of [`propagate_cell`] over every cell
pub fn propagate_round(grid: &mut Grid, policy: EndpointPolicy) -> SolveOutput {
    let mut result = SolveOutput::NoChange;
    for cell in 0..grid.num_cells() {
        result = result.merge(propagate_cell(grid, cell, policy));
        if result == SolveOutput::Failed {
            trace!(cell, "propagation failed");
            return SolveOutput::Failed;
        }
    }
    result
}

/// Repeat rounds until nothing changes. Returns `NoChange` at the fixpoint or
/// `Failed` on contradiction.
pub fn propagate(grid: &mut Grid, policy: EndpointPolicy) -> SolveOutput {
    loop {
        match propagate_round(grid, policy) {
            SolveOutput::Updated => continue,
            terminal => return terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_corner_is_forced() {
        // an unmarked corner has exactly two edges and needs both
        let mut grid = Grid::new(3).unwrap();
        assert_eq!(
            propagate_cell(&mut grid, 0, EndpointPolicy::HeadTail),
            SolveOutput::Updated
        );
        assert_eq!(grid.degree(0), 2);
        assert_eq!(
            propagate_cell(&mut grid, 0, EndpointPolicy::HeadTail),
            SolveOutput::NoChange
        );
    }

    #[test]
    fn test_full_cell_excludes_rest() {
        let mut grid = Grid::new(3).unwrap();
        grid.set_cell_type(4, CellType::Head);
        let first = grid.adjacent_edges(4)[0];
        grid.set_state(first, EdgeState::Included);

        assert_eq!(
            propagate_cell(&mut grid, 4, EndpointPolicy::HeadTail),
            SolveOutput::Updated
        );
        for &edge in grid.adjacent_edges(4) {
            if edge != first {
                assert_eq!(grid.state(edge), EdgeState::Excluded);
            }
        }
    }

    #[test]
    fn test_overfull_and_starved_cells_fail() {
        let mut grid = Grid::new(3).unwrap();
        grid.set_cell_type(4, CellType::Tail);
        let edges: Vec<_> = grid.adjacent_edges(4).to_vec();
        grid.set_state(edges[0], EdgeState::Included);
        grid.set_state(edges[1], EdgeState::Included);
        assert_eq!(
            propagate_cell(&mut grid, 4, EndpointPolicy::HeadTail),
            SolveOutput::Failed
        );

        let mut grid = Grid::new(3).unwrap();
        for &edge in grid.adjacent_edges(4).to_vec().iter() {
            grid.set_state(edge, EdgeState::Excluded);
        }
        grid.set_state(grid.adjacent_edges(4)[0], EdgeState::Undecided);
        // 2 needed but only 1 left: the single-exit rule fires first
        assert_eq!(
            propagate_cell(&mut grid, 4, EndpointPolicy::HeadTail),
            SolveOutput::Updated
        );
        assert_eq!(
            propagate_cell(&mut grid, 4, EndpointPolicy::HeadTail),
            SolveOutput::Failed
        );
    }

    #[test]
    fn test_head_only_allows_trail_ends() {
        let mut grid = Grid::new(3).unwrap();
        let edges: Vec<_> = grid.adjacent_edges(4).to_vec();
        grid.set_state(edges[0], EdgeState::Included);
        for &edge in &edges[1..3] {
            grid.set_state(edge, EdgeState::Excluded);
        }
        // degree 1, one undecided edge left
        assert_eq!(
            propagate_cell(&mut grid, 4, EndpointPolicy::HeadOnly),
            SolveOutput::NoChange
        );
        assert_eq!(
            propagate_cell(&mut grid, 4, EndpointPolicy::HeadTail),
            SolveOutput::Updated
        );
    }

    #[test]
    fn test_fixpoint_is_stable() {
        let mut grid = Grid::new(4).unwrap();
        grid.set_cell_type(0, CellType::Head);
        grid.set_cell_type(3, CellType::Tail);

        let result = propagate(&mut grid, EndpointPolicy::HeadTail);
        assert_ne!(result, SolveOutput::Updated);
        if result == SolveOutput::NoChange {
            assert_eq!(
                propagate_round(&mut grid, EndpointPolicy::HeadTail),
                SolveOutput::NoChange
            );
        }
    }

    const STATES: [EdgeState; 3] = [EdgeState::Undecided, EdgeState::Included, EdgeState::Excluded];
    const TYPES: [CellType; 4] = [
        CellType::Unmarked,
        CellType::Head,
        CellType::Tail,
        CellType::HeadTail,
    ];

    fn board() -> impl Strategy<Value = (usize, Vec<usize>, Vec<usize>, bool)> {
        (2usize..=4).prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec(0..STATES.len(), 2 * n * (n - 1)),
                prop::collection::vec(0..TYPES.len(), n * n),
                any::<bool>(),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_fixpoint_is_idempotent((n, states, types, head_only) in board()) {
            let policy = if head_only { EndpointPolicy::HeadOnly } else { EndpointPolicy::HeadTail };
            let mut grid = Grid::new(n).unwrap();
            for (edge, &s) in states.iter().enumerate() {
                grid.set_state(edge, STATES[s]);
            }
            for (cell, &t) in types.iter().enumerate() {
                grid.set_cell_type(cell, TYPES[t]);
            }

            let result = propagate(&mut grid, policy);
            prop_assert_ne!(result, SolveOutput::Updated);
            if result == SolveOutput::NoChange {
                let before = grid.snapshot();
                prop_assert_eq!(propagate_round(&mut grid, policy), SolveOutput::NoChange);
                prop_assert_eq!(grid.snapshot(), before);
            }
        }
    }
}
