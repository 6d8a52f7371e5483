//! CLI entry point for the turn puzzle tool.
//!
//! Usage:
//!   turn-puzzle generate --size <n> [options]
//!   turn-puzzle verify <puzzle.json> [options]
//!   turn-puzzle verify --stdin [options]
//!
//! Options:
//!   --attempts <n>     Puzzles to generate before giving up on uniqueness (default: 10)
//!   --seed <n>         Seed for the random generator
//!   --policy <p>       head-tail or head-only (default: head-tail)
//!   --eliminate        Retire ambiguous edges until the reference is unique
//!   --verbose / -v     More log output on stderr (repeatable)

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::SubscriberBuilder;

use turn_puzzle::solver::search_alternate;
use turn_puzzle::{
    eliminate_ambiguity, generate, EdgeId, EndpointPolicy, Grid, PuzzleFile, SearchStats,
    Snapshot, SolverConfig,
};

#[derive(Parser)]
#[command(name = "turn-puzzle")]
#[command(about = "Generate and verify turn-constrained path puzzles")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a puzzle and check that its clues have a unique solution
    Generate {
        /// Grid side length
        #[arg(long)]
        size: usize,

        /// Maximum number of puzzles to try
        #[arg(long, default_value = "10")]
        attempts: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, value_enum, default_value = "head-tail")]
        policy: PolicyArg,

        /// Retire ambiguous edges instead of discarding ambiguous puzzles
        #[arg(long)]
        eliminate: bool,
    },
    /// Verify that a puzzle's clues admit only its reference solution
    Verify {
        /// Path to puzzle JSON file (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read puzzle from stdin instead of file
        #[arg(long)]
        stdin: bool,

        /// Keep retiring ambiguous edges and report all of them
        #[arg(long)]
        eliminate: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    HeadTail,
    HeadOnly,
}

impl From<PolicyArg> for EndpointPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::HeadTail => EndpointPolicy::HeadTail,
            PolicyArg::HeadOnly => EndpointPolicy::HeadOnly,
        }
    }
}

/// Uniqueness verdict for one puzzle
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerificationOutput {
    unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    differing_edge: Option<EdgeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alternate_solution: Option<Snapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    retired_edges: Vec<EdgeId>,
    nodes: usize,
    max_depth: usize,
    time_elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationOutput {
    attempts: usize,
    puzzle: PuzzleFile,
    verification: VerificationOutput,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            size,
            attempts,
            seed,
            policy,
            eliminate,
        } => run_generate(size, attempts, seed, policy.into(), eliminate),
        Commands::Verify {
            file,
            stdin,
            eliminate,
        } => run_verify(file, stdin, eliminate),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    SubscriberBuilder::default()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Check `grid` against `reference`, retiring ambiguous edges when asked
fn check_uniqueness(
    grid: &mut Grid,
    reference: &Snapshot,
    config: &SolverConfig,
    eliminate: bool,
) -> Result<VerificationOutput> {
    if eliminate {
        let report = eliminate_ambiguity(grid, reference, config)?;
        return Ok(format_result(report.is_unique(), None, report.retired_edges, report.stats));
    }

    let search = search_alternate(grid, reference, config)?;
    Ok(match search.alternate {
        Some(alternate) => format_result(
            false,
            Some((alternate.edge, alternate.snapshot)),
            Vec::new(),
            search.stats,
        ),
        None => format_result(true, None, Vec::new(), search.stats),
    })
}

fn run_generate(
    size: usize,
    attempts: usize,
    seed: Option<u64>,
    policy: EndpointPolicy,
    eliminate: bool,
) -> Result<bool> {
    if attempts == 0 {
        bail!("--attempts must be at least 1");
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let config = SolverConfig { policy };

    let mut last = None;
    for attempt in 1..=attempts {
        let mut grid = Grid::new(size)?;
        let reference = generate(&mut grid, &mut rng, policy);
        let puzzle = PuzzleFile::from_grid(&grid, &reference, policy);

        let verification = check_uniqueness(&mut grid, &reference, &config, eliminate)?;
        let unique = verification.unique;
        info!(attempt, unique, nodes = verification.nodes, "attempt finished");

        let output = GenerationOutput {
            attempts: attempt,
            puzzle,
            verification,
        };
        if unique || eliminate {
            return print_json(&output).map(|_| true);
        }
        last = Some(output);
    }

    warn!(attempts, "no unique puzzle found");
    if let Some(output) = last {
        print_json(&output)?;
    }
    Ok(false)
}

fn run_verify(file: Option<PathBuf>, stdin: bool, eliminate: bool) -> Result<bool> {
    let json_content = if stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        buffer
    } else if let Some(path) = file {
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?
    } else {
        bail!("must provide either a file path or --stdin");
    };

    let puzzle: PuzzleFile =
        serde_json::from_str(&json_content).context("failed to parse puzzle JSON")?;
    let (mut grid, reference) = puzzle.build().context("invalid puzzle")?;
    let config = SolverConfig {
        policy: puzzle.policy,
    };

    let output = check_uniqueness(&mut grid, &reference, &config, eliminate)?;
    print_json(&output)?;
    Ok(output.unique)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_result(
    unique: bool,
    alternate: Option<(EdgeId, Snapshot)>,
    retired_edges: Vec<EdgeId>,
    stats: SearchStats,
) -> VerificationOutput {
    let (differing_edge, alternate_solution) = alternate.unzip();
    VerificationOutput {
        unique,
        differing_edge,
        alternate_solution,
        retired_edges,
        nodes: stats.nodes,
        max_depth: stats.max_depth,
        time_elapsed_ms: stats.elapsed_ms,
    }
}
