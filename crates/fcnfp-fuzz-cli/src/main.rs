//! CLI for generating, filtering and analyzing FCNFP fuzz corpora

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use fcnfp_fuzz_core::analysis::DEFAULT_OUTLIER_RATIO;
use fcnfp_fuzz_core::codec::HeaderStyle;
use fcnfp_fuzz_core::filter::DEFAULT_TOLERANCE;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "fcnfp-fuzz")]
#[command(about = "Difficulty-controlled fixed-charge network flow fuzzing", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); overrides RUST_LOG
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate constrained instances with optimality certificates
    Generate {
        /// Number of nodes; 0 emits only the end-of-stream record
        #[arg(long)]
        nodes: usize,

        /// Number of arcs
        #[arg(long)]
        arcs: usize,

        /// Largest arc capacity (drawn from 1..=max)
        #[arg(long)]
        max_capacity: i64,

        /// Largest unit cost (drawn from 0..=max)
        #[arg(long)]
        max_cost: i64,

        /// Largest fixed activation charge (drawn from 0..=max)
        #[arg(long, default_value_t = 0)]
        max_fixed_cost: i64,

        /// One difficulty in (0, 1] per side constraint
        #[arg(long, num_args = 1..)]
        difficulty: Vec<f64>,

        /// Number of generation attempts
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// RNG seed; random when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Redraws per instance before giving up
        #[arg(long, default_value_t = fcnfp_fuzz_core::generator::DEFAULT_MAX_ATTEMPTS)]
        max_attempts: usize,

        /// Leave the stream open so further runs can append to it
        #[arg(long)]
        append: bool,

        /// Write only `n m k d` headers for fixed-token readers
        #[arg(long)]
        compact_header: bool,
    },

    /// Generate plain min-cost flow cases (source 0, target 1)
    GenerateMcf {
        /// Number of nodes; 0 emits only the end-of-stream record
        #[arg(long)]
        nodes: usize,

        /// Number of arcs
        #[arg(long)]
        arcs: usize,

        /// Largest arc capacity
        #[arg(long)]
        max_capacity: i64,

        /// Largest unit cost
        #[arg(long)]
        max_cost: i64,

        /// Largest fixed charge; omit for an uncharged corpus
        #[arg(long)]
        max_fixed_cost: Option<i64>,

        /// Number of cases
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// RNG seed; random when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Leave the stream open so further runs can append to it
        #[arg(long)]
        append: bool,
    },

    /// Run a TOML-described batch of generation jobs in parallel
    Sweep {
        /// Path to the sweep configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Write only `n m k d` headers for fixed-token readers
        #[arg(long)]
        compact_header: bool,
    },

    /// Keep the instances an approximate solver handled badly
    Filter {
        /// Instance stream
        data: PathBuf,

        /// Result stream, one record per instance in the same order
        results: PathBuf,

        /// Relative cost slack before an answer counts as suboptimal
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
    },

    /// Summarize approximation accuracy per difficulty
    Analyze {
        /// Result stream; stdin when omitted
        results: Option<PathBuf>,

        /// Cost ratio above which a record is printed as an outlier
        #[arg(long, default_value_t = DEFAULT_OUTLIER_RATIO)]
        outlier_ratio: f64,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the optimality certificates stored in an instance stream
    Verify {
        /// Instance stream
        data: PathBuf,

        /// Also re-solve each instance with the exact oracle
        #[arg(long)]
        reoptimize: bool,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // stdout carries record streams
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn header_style(compact: bool) -> HeaderStyle {
    if compact {
        HeaderStyle::Compact
    } else {
        HeaderStyle::Full
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            nodes,
            arcs,
            max_capacity,
            max_cost,
            max_fixed_cost,
            difficulty,
            count,
            seed,
            max_attempts,
            append,
            compact_header,
        } => {
            let params = fcnfp_fuzz_core::generator::GeneratorParams {
                nodes,
                arcs,
                max_capacity,
                max_cost,
                max_fixed_cost,
                constraints: difficulty.len(),
                difficulty,
            };
            let style = header_style(compact_header);
            commands::generate(&params, count, seed, max_attempts, append, style)
        }
        Commands::GenerateMcf {
            nodes,
            arcs,
            max_capacity,
            max_cost,
            max_fixed_cost,
            count,
            seed,
            append,
        } => {
            let params = fcnfp_fuzz_core::generator::mcf::McfCaseParams {
                nodes,
                arcs,
                max_capacity,
                max_cost,
                max_fixed_cost,
            };
            commands::generate_mcf(&params, count, seed, append)
        }
        Commands::Sweep {
            config,
            compact_header,
        } => commands::sweep(&config, header_style(compact_header)),
        Commands::Filter {
            data,
            results,
            tolerance,
        } => commands::filter(&data, &results, tolerance),
        Commands::Analyze {
            results,
            outlier_ratio,
            json,
        } => commands::analyze(results.as_deref(), outlier_ratio, json),
        Commands::Verify { data, reoptimize } => commands::verify(&data, reoptimize),
    }
}
