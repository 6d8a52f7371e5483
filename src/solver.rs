//! Backtracking search for solutions consistent with the clues.
//!
//! The search alternates propagation rounds with trail checks until nothing
//! changes, then case-splits on the first undecided edge: Included first,
//! Excluded second. Each branch point keeps a full snapshot of edge states and
//! restores it before trying the other side.
//!
//! The uniqueness check looks for any solved position that includes an edge
//! the reference solution does not. Finding one proves the clues ambiguous.

use std::time::Instant;

use tracing::{debug, info, trace};

use crate::error::PuzzleError;
use crate::grid::{EdgeId, Grid, Snapshot};
use crate::propagation::{propagate_round, SolveOutput};
use crate::puzzle::{CellType, EdgeState, EndpointPolicy};
use crate::trail;

/// Configuration for the solver
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    /// How trails may terminate
    pub policy: EndpointPolicy,
}

/// Counters collected during one search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Search nodes entered (one per branch attempt)
    pub nodes: usize,
    /// Deepest case-split level reached
    pub max_depth: usize,
    pub elapsed_ms: u64,
}

impl SearchStats {
    fn absorb(&mut self, other: SearchStats) {
        self.nodes += other.nodes;
        self.max_depth = self.max_depth.max(other.max_depth);
        self.elapsed_ms += other.elapsed_ms;
    }
}

/// Result of a (sub)search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// No acceptable solution along this branch
    NoSolution,
    /// A solved position; `edge` is the first Included edge missing from the
    /// reference when searching for an alternate
    Found {
        snapshot: Snapshot,
        edge: Option<EdgeId>,
    },
}

/// A solution that differs from the reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternate {
    pub snapshot: Snapshot,
    /// First edge Included here but not in the reference
    pub edge: EdgeId,
}

/// Result of one alternate search
#[derive(Debug, Clone)]
pub struct AlternateSearch {
    pub alternate: Option<Alternate>,
    pub stats: SearchStats,
}

/// Summary of repeated alternate elimination
#[derive(Debug, Clone, Default)]
pub struct EliminationReport {
    /// Number of alternates found (and edges retired)
    pub alternates: usize,
    /// Retired edges in the order they were found
    pub retired_edges: Vec<EdgeId>,
    pub stats: SearchStats,
}

impl EliminationReport {
    pub fn is_unique(&self) -> bool {
        self.alternates == 0
    }
}

/// Which solved positions end the search
enum Goal<'a> {
    Any,
    DifferentFrom(&'a Snapshot),
}

impl Goal<'_> {
    /// A solved position may leave edges undecided between adjacent trail
    /// ends; those are reported as Excluded.
    fn accept(&self, grid: &Grid) -> Option<SearchOutcome> {
        let snapshot = grid.snapshot().settled();
        let edge = match self {
            Goal::Any => None,
            Goal::DifferentFrom(reference) => {
                Some(snapshot.first_difference(reference).ok().flatten()?)
            }
        };
        Some(SearchOutcome::Found { snapshot, edge })
    }
}

struct Search<'a> {
    policy: EndpointPolicy,
    goal: Goal<'a>,
    stats: SearchStats,
}

impl<'a> Search<'a> {
    fn new(policy: EndpointPolicy, goal: Goal<'a>) -> Self {
        Self {
            policy,
            goal,
            stats: SearchStats::default(),
        }
    }

    fn run(&mut self, grid: &mut Grid, depth: usize) -> SearchOutcome {
        self.stats.nodes += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        loop {
            let round = propagate_round(grid, self.policy);
            if round == SolveOutput::Failed || !trails_consistent(grid) {
                return SearchOutcome::NoSolution;
            }
            if round == SolveOutput::NoChange {
                break;
            }
        }

        if is_solved(grid, self.policy) {
            if let Some(found) = self.goal.accept(grid) {
                grid.exclude_undecided();
                return found;
            }
        }

        let Some(edge) = grid.first_undecided() else {
            return SearchOutcome::NoSolution;
        };

        let saved = grid.snapshot();
        for state in [EdgeState::Included, EdgeState::Excluded] {
            trace!(edge, ?state, depth, "branch");
            grid.set_state(edge, state);
            if let found @ SearchOutcome::Found { .. } = self.run(grid, depth + 1) {
                return found;
            }
            grid.rewind(&saved);
        }

        SearchOutcome::NoSolution
    }
}

/// Check the trails that start at a HEAD or TAIL clue: none may turn both
/// ways, and none may end on a clue of its own kind.
fn trails_consistent(grid: &mut Grid) -> bool {
    grid.reset_visited();

    for cell in 0..grid.num_cells() {
        let start = grid.cell_type(cell);
        if grid.degree(cell) != 1 || grid.is_visited(cell) {
            continue;
        }
        if !matches!(start, CellType::Head | CellType::Tail) {
            continue;
        }

        let mut path = trail::trace(grid, cell);
        if path.turn_type().is_mixed() {
            return false;
        }

        let end = path.last().map(|c| grid.cell_type(c));
        let bad_end = match (start, end) {
            (CellType::Head, Some(end)) => end.is_head(),
            (CellType::Tail, Some(end)) => matches!(end, CellType::Tail | CellType::HeadTail),
            _ => false,
        };
        if bad_end {
            return false;
        }
    }

    true
}

/// Check whether the grid is a complete solution for its clues.
///
/// Every degree must lie in the range its cell type allows, and the trails
/// traced from head cells must cover every cell exactly once without mixed
/// turns or head-to-head connections.
pub fn is_solved(grid: &mut Grid, policy: EndpointPolicy) -> bool {
    for cell in 0..grid.num_cells() {
        let (min, max) = policy.degree_range(grid.cell_type(cell));
        let degree = grid.degree(cell);
        if degree < min || degree > max {
            return false;
        }
    }

    grid.reset_visited();
    let mut covered = 0;
    for cell in 0..grid.num_cells() {
        if !grid.cell_type(cell).is_head() {
            continue;
        }
        if grid.is_visited(cell) {
            return false;
        }

        let mut path = trail::trace(grid, cell);
        if path.is_empty() || path.turn_type().is_mixed() {
            return false;
        }
        if path.len() > 1 && path.last().map_or(false, |c| grid.cell_type(c).is_head()) {
            return false;
        }
        covered += path.len();
    }

    covered == grid.num_cells()
}

fn check_reference(grid: &Grid, reference: &Snapshot) -> Result<(), PuzzleError> {
    if reference.len() != grid.num_edges() {
        return Err(PuzzleError::SnapshotSizeMismatch {
            expected: grid.num_edges(),
            actual: reference.len(),
        });
    }
    Ok(())
}

/// [`find_alternate_solution`] together with the search counters
pub fn search_alternate(
    grid: &mut Grid,
    reference: &Snapshot,
    config: &SolverConfig,
) -> Result<AlternateSearch, PuzzleError> {
    check_reference(grid, reference)?;

    let start_time = Instant::now();
    let mut search = Search::new(config.policy, Goal::DifferentFrom(reference));

    grid.reset_for_search();
    let outcome = search.run(grid, 0);
    grid.load_solution(reference)?;

    let mut stats = search.stats;
    stats.elapsed_ms = start_time.elapsed().as_millis() as u64;

    let alternate = match outcome {
        SearchOutcome::Found {
            snapshot,
            edge: Some(edge),
        } => Some(Alternate { snapshot, edge }),
        _ => None,
    };

    debug!(
        nodes = stats.nodes,
        max_depth = stats.max_depth,
        elapsed_ms = stats.elapsed_ms,
        found = alternate.is_some(),
        "alternate search finished"
    );

    Ok(AlternateSearch { alternate, stats })
}

/// Look for a solution of the clues on `grid` that differs from `reference`.
///
/// Returns `Ok(None)` when the clues admit no other solution over the edges
/// that are not Deleted. The grid holds the reference solution afterwards.
pub fn find_alternate_solution(
    grid: &mut Grid,
    reference: &Snapshot,
    config: &SolverConfig,
) -> Result<Option<Alternate>, PuzzleError> {
    search_alternate(grid, reference, config).map(|search| search.alternate)
}

/// Repeatedly find an alternate and retire its differing edge as Deleted
/// until the reference is the only solution left.
pub fn eliminate_ambiguity(
    grid: &mut Grid,
    reference: &Snapshot,
    config: &SolverConfig,
) -> Result<EliminationReport, PuzzleError> {
    let mut report = EliminationReport::default();

    loop {
        let search = search_alternate(grid, reference, config)?;
        report.stats.absorb(search.stats);

        let Some(alternate) = search.alternate else {
            break;
        };

        grid.set_state(alternate.edge, EdgeState::Deleted);
        report.retired_edges.push(alternate.edge);
        info!(
            edge = alternate.edge,
            round = report.retired_edges.len(),
            "retired ambiguous edge"
        );
    }

    report.alternates = report.retired_edges.len();
    Ok(report)
}

/// Find any solution of the clues on `grid`.
///
/// On success the grid is left holding the solution; otherwise every
/// non-Deleted edge is Undecided again.
pub fn find_any_solution(grid: &mut Grid, config: &SolverConfig) -> Option<Snapshot> {
    let mut search = Search::new(config.policy, Goal::Any);

    grid.reset_for_search();
    match search.run(grid, 0) {
        SearchOutcome::Found { snapshot, .. } => Some(snapshot),
        SearchOutcome::NoSolution => {
            grid.reset_for_search();
            None
        }
    }
}
