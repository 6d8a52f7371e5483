//! Random reference-solution construction and clue derivation.
//!
//! The generator grows a maximal set of turn-consistent trails by adding one
//! randomly chosen feasible edge at a time. Trail endpoints then become the
//! puzzle's HEAD/TAIL clues and the final edge assignment is the reference
//! solution.

use rand::Rng;
use tracing::debug;

use crate::grid::{EdgeId, Grid, Snapshot};
use crate::puzzle::{CellType, EdgeState, EndpointPolicy};
use crate::trail::trace;

/// Check whether including `edge` keeps every trail simple, open and
/// turn-consistent
pub fn can_add_edge(grid: &mut Grid, edge: EdgeId) -> bool {
    if !grid.state(edge).is_undecided() {
        return false;
    }

    let (a, b) = grid.endpoints(edge);
    if grid.degree(a) >= 2 || grid.degree(b) >= 2 {
        return false;
    }

    grid.reset_visited();
    let trail_a = trace(grid, a);
    let trail_b = trace(grid, b);

    if trail_a.is_empty() || trail_b.is_empty() {
        return false;
    }

    // Both ends of the same trail: the edge would close a loop
    if grid.degree(a) == 1 && grid.degree(b) == 1 && trail_a.contains(b) {
        return false;
    }

    !trail_a.joined(&trail_b).turn_type().is_mixed()
}

/// Include randomly chosen feasible edges until none is left, then exclude the
/// rest. Returns the number of edges included.
pub fn grow_solution<R: Rng>(grid: &mut Grid, rng: &mut R) -> usize {
    let mut added = 0;

    loop {
        let mut addable = Vec::new();
        for edge in 0..grid.num_edges() {
            if can_add_edge(grid, edge) {
                addable.push(edge);
            }
        }

        if addable.is_empty() {
            break;
        }

        let chosen = addable[rng.gen_range(0..addable.len())];
        grid.set_state(chosen, EdgeState::Included);
        added += 1;
    }

    grid.exclude_undecided();
    added
}

/// Mark trail endpoints as clues. Returns the number of trails.
///
/// Each trail is traced once from its lower-numbered endpoint: the first cell
/// becomes HEAD and, when the policy marks tails, the last one TAIL. A cell
/// with no edges is a trail of its own and gets the coincident marker.
pub fn derive_clues(grid: &mut Grid, policy: EndpointPolicy) -> usize {
    grid.clear_cell_types();
    grid.reset_visited();

    let mut trails = 0;
    for cell in 0..grid.num_cells() {
        if grid.is_visited(cell) {
            continue;
        }
        match grid.degree(cell) {
            0 => {
                grid.mark_visited(cell);
                grid.set_cell_type(cell, CellType::HeadTail);
                trails += 1;
            }
            1 => {
                let trail = trace(grid, cell);
                if let (Some(first), Some(last)) = (trail.first(), trail.last()) {
                    grid.set_cell_type(first, CellType::Head);
                    if policy.marks_tails() {
                        grid.set_cell_type(last, CellType::Tail);
                    }
                    trails += 1;
                }
            }
            _ => {}
        }
    }
    trails
}

/// Build a random reference solution on a fresh grid, place its clues and
/// return the solution snapshot
pub fn generate<R: Rng>(grid: &mut Grid, rng: &mut R, policy: EndpointPolicy) -> Snapshot {
    let added = grow_solution(grid, rng);
    let trails = derive_clues(grid, policy);
    debug!(
        size = grid.size(),
        edges = added,
        trails,
        clues = grid.clue_cells().len(),
        "generated reference solution"
    );
    grid.snapshot()
}
