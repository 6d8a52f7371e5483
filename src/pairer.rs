//! Backtracking HEAD–TAIL matcher.
//!
//! Realizes a pairing of heads to tails directly: each head in turn is joined
//! to an unpaired tail along a shortest path of fresh cells, and the rest of the
//! pairing is attempted on top of it. Independent of the generate/verify
//! pipeline.

use std::collections::VecDeque;

use tracing::trace;

use crate::grid::{CellId, EdgeId, Grid};
use crate::puzzle::{CellType, EdgeState};
use crate::trail::Trail;

/// A head joined to a tail, with the cells in between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub head: CellId,
    pub tail: CellId,
    /// Cells from head to tail inclusive
    pub cells: Vec<CellId>,
}

/// Shortest path from `head` to `tail` over Undecided edges whose interior
/// cells are unmarked and untouched. Returns the cells and edges in order.
///
/// Both ends must still be free: joining them adds an edge to each.
fn shortest_path(grid: &Grid, head: CellId, tail: CellId) -> Option<(Vec<CellId>, Vec<EdgeId>)> {
    if grid.degree(head) != 0 || grid.degree(tail) != 0 {
        return None;
    }

    let mut parent: Vec<Option<(CellId, EdgeId)>> = vec![None; grid.num_cells()];
    let mut seen = vec![false; grid.num_cells()];
    let mut queue = VecDeque::new();

    seen[head] = true;
    queue.push_back(head);

    while let Some(cell) = queue.pop_front() {
        if cell == tail {
            break;
        }
        for &edge in grid.adjacent_edges(cell) {
            if !grid.state(edge).is_undecided() {
                continue;
            }
            let next = grid.other_end(edge, cell);
            if seen[next] {
                continue;
            }
            let passable = next == tail
                || (grid.cell_type(next) == CellType::Unmarked && grid.degree(next) == 0);
            if !passable {
                continue;
            }
            seen[next] = true;
            parent[next] = Some((cell, edge));
            queue.push_back(next);
        }
    }

    if !seen[tail] {
        return None;
    }

    let mut cells = vec![tail];
    let mut edges = Vec::new();
    let mut cur = tail;
    while let Some((prev, edge)) = parent[cur] {
        cells.push(prev);
        edges.push(edge);
        cur = prev;
    }
    cells.reverse();
    edges.reverse();
    Some((cells, edges))
}

fn set_edges(grid: &mut Grid, edges: &[EdgeId], state: EdgeState) {
    for &edge in edges {
        grid.set_state(edge, state);
    }
}

fn pair_rest(grid: &mut Grid, heads: &[CellId], tails: &mut Vec<CellId>) -> Option<Vec<Pairing>> {
    let Some((&head, rest)) = heads.split_first() else {
        return tails.is_empty().then(Vec::new);
    };

    for i in 0..tails.len() {
        let tail = tails[i];
        let Some((cells, edges)) = shortest_path(grid, head, tail) else {
            continue;
        };

        let mut path = Trail::new();
        for &cell in &cells {
            path.push(cell, grid.position(cell));
        }
        if path.turn_type().is_mixed() {
            trace!(head, tail, "shortest path turns both ways");
            continue;
        }

        set_edges(grid, &edges, EdgeState::Included);
        tails.remove(i);

        if let Some(mut pairings) = pair_rest(grid, rest, tails) {
            pairings.insert(0, Pairing { head, tail, cells });
            return Some(pairings);
        }

        tails.insert(i, tail);
        set_edges(grid, &edges, EdgeState::Undecided);
    }

    None
}

/// Join every head to a distinct tail with turn-consistent paths.
///
/// On success the path edges are left Included and the pairings are returned
/// in head order. On failure the grid is unchanged.
pub fn pair_heads_and_tails(
    grid: &mut Grid,
    heads: &[CellId],
    tails: &[CellId],
) -> Option<Vec<Pairing>> {
    if heads.len() != tails.len() {
        return None;
    }
    let mut remaining = tails.to_vec();
    pair_rest(grid, heads, &mut remaining)
}
