//! Trail tracing and turn classification.
//!
//! A trail is a simple sequence of side-adjacent cells joined by Included
//! edges. Valid trails turn only one rotational way; a trail that turns both
//! left and right is [`TurnType::Mixed`] and invalidates the position.

use crate::grid::{CellId, Grid};
use crate::puzzle::Position;

/// Turning behaviour of a trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnType {
    /// No turns at all
    Straight,
    RightOnly,
    LeftOnly,
    /// Both left and right turns
    Mixed,
}

impl TurnType {
    pub fn is_mixed(self) -> bool {
        self == TurnType::Mixed
    }

    /// Classification of the same trail walked backwards
    pub fn reversed(self) -> TurnType {
        match self {
            TurnType::RightOnly => TurnType::LeftOnly,
            TurnType::LeftOnly => TurnType::RightOnly,
            other => other,
        }
    }
}

/// Classify a sequence of positions by the sign of the cross product of
/// consecutive step vectors: positive is a left turn, negative a right turn.
pub fn classify_turns(positions: &[Position]) -> TurnType {
    let mut left = false;
    let mut right = false;

    for window in positions.windows(3) {
        let (r1, c1) = window[0].step_to(window[1]);
        let (r2, c2) = window[1].step_to(window[2]);
        let cross = r1 * c2 - c1 * r2;

        if cross > 0 {
            left = true;
        } else if cross < 0 {
            right = true;
        }
        if left && right {
            return TurnType::Mixed;
        }
    }

    match (left, right) {
        (true, false) => TurnType::LeftOnly,
        (false, true) => TurnType::RightOnly,
        _ => TurnType::Straight,
    }
}

/// Ordered cells of a trail with a lazily computed turn classification
#[derive(Debug, Clone, Default)]
pub struct Trail {
    cells: Vec<CellId>,
    positions: Vec<Position>,
    turn_type: Option<TurnType>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell; invalidates the cached classification
    pub fn push(&mut self, cell: CellId, position: Position) {
        self.cells.push(cell);
        self.positions.push(position);
        self.turn_type = None;
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn first(&self) -> Option<CellId> {
        self.cells.first().copied()
    }

    pub fn last(&self) -> Option<CellId> {
        self.cells.last().copied()
    }

    pub fn contains(&self, cell: CellId) -> bool {
        self.cells.contains(&cell)
    }

    pub fn reversed(&self) -> Trail {
        let mut out = Trail::new();
        for (&cell, &pos) in self.cells.iter().zip(&self.positions).rev() {
            out.push(cell, pos);
        }
        out
    }

    /// `self` walked backwards, followed by `other`
    pub fn joined(&self, other: &Trail) -> Trail {
        let mut out = self.reversed();
        for (&cell, &pos) in other.cells.iter().zip(&other.positions) {
            out.push(cell, pos);
        }
        out
    }

    pub fn turn_type(&mut self) -> TurnType {
        if let Some(t) = self.turn_type {
            return t;
        }
        let t = classify_turns(&self.positions);
        self.turn_type = Some(t);
        t
    }
}

/// Trace the trail that starts at `start`.
///
/// A degree-0 cell is a trail of its own. A degree-2 cell is not an endpoint
/// and yields an empty trail. From a degree-1 cell the walk follows Included
/// edges to unvisited neighbours, marking every cell it passes. Visited flags
/// must be reset before a tracing pass.
pub fn trace(grid: &mut Grid, start: CellId) -> Trail {
    let mut trail = Trail::new();

    match grid.degree(start) {
        0 => {
            grid.mark_visited(start);
            trail.push(start, grid.position(start));
        }
        1 => {
            let mut current = Some(start);
            while let Some(cell) = current {
                grid.mark_visited(cell);
                trail.push(cell, grid.position(cell));

                current = grid
                    .adjacent_edges(cell)
                    .iter()
                    .filter(|&&e| grid.state(e).is_included())
                    .map(|&e| grid.other_end(e, cell))
                    .find(|&next| !grid.is_visited(next));
            }
        }
        _ => {}
    }

    trail
}
