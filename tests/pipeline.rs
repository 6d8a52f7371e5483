use rand::rngs::StdRng;
use rand::SeedableRng;

use turn_puzzle::{
    eliminate_ambiguity, find_alternate_solution, find_any_solution, generate, is_solved,
    EdgeId, EndpointPolicy, Grid, PuzzleFile, Snapshot, SolverConfig,
};

fn included(snapshot: &Snapshot) -> Vec<EdgeId> {
    (0..snapshot.len())
        .filter(|&e| snapshot.get(e).map_or(false, |s| s.is_included()))
        .collect()
}

fn generated(size: usize, seed: u64, policy: EndpointPolicy) -> (Grid, Snapshot) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = Grid::new(size).unwrap();
    let reference = generate(&mut grid, &mut rng, policy);
    (grid, reference)
}

#[test]
fn test_reference_is_solved() {
    for policy in [EndpointPolicy::HeadTail, EndpointPolicy::HeadOnly] {
        for seed in 0..5 {
            let (mut grid, _) = generated(4, seed, policy);
            assert!(is_solved(&mut grid, policy), "seed {seed} {policy:?}");
        }
    }
}

#[test]
fn test_alternates_are_sound() {
    let config = SolverConfig::default();
    for size in 2..=4 {
        for seed in 0..4 {
            let (mut grid, reference) = generated(size, seed, config.policy);
            let Some(alternate) = find_alternate_solution(&mut grid, &reference, &config).unwrap()
            else {
                continue;
            };

            assert_eq!(alternate.snapshot.get(alternate.edge), Some(turn_puzzle::EdgeState::Included));
            assert!(!reference.get(alternate.edge).unwrap().is_included());

            // the grid is handed back holding the reference
            assert_eq!(grid.snapshot(), reference);

            grid.restore(&alternate.snapshot).unwrap();
            assert!(is_solved(&mut grid, config.policy));
        }
    }
}

#[test]
fn test_reference_is_rederived_after_elimination() {
    let config = SolverConfig::default();
    for seed in 0..4 {
        let (mut grid, reference) = generated(4, seed, config.policy);

        let report = eliminate_ambiguity(&mut grid, &reference, &config).unwrap();
        assert_eq!(report.alternates, report.retired_edges.len());
        assert!(find_alternate_solution(&mut grid, &reference, &config)
            .unwrap()
            .is_none());

        let solution = find_any_solution(&mut grid, &config).expect("reference is reachable");
        assert_eq!(included(&solution), included(&reference));
    }
}

#[test]
fn test_puzzle_file_round_trip() {
    let config = SolverConfig {
        policy: EndpointPolicy::HeadOnly,
    };
    let (mut grid, reference) = generated(3, 7, config.policy);
    let expected = find_alternate_solution(&mut grid, &reference, &config)
        .unwrap()
        .map(|a| a.edge);

    let json = serde_json::to_string(&PuzzleFile::from_grid(&grid, &reference, config.policy)).unwrap();
    let file: PuzzleFile = serde_json::from_str(&json).unwrap();
    let (mut rebuilt, solution) = file.build().unwrap();
    assert_eq!(solution, reference);
    assert_eq!(rebuilt.clue_cells(), grid.clue_cells());

    let found = find_alternate_solution(&mut rebuilt, &solution, &config)
        .unwrap()
        .map(|a| a.edge);
    assert_eq!(found, expected);
}
