mod chunk;
mod cli;
mod error;
mod filter;
mod merge;
mod model;
mod output;
mod plot;
mod reader;

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;

use crate::error::Result;

/// Run, merge, filter, and plot km find_mutation results.
#[derive(Parser, Debug)]
#[command(name = "kmtools", version, about)]
struct Cli {
    /// Enable verbose output.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk input data and run km find_mutation on each chunk
    Chunk(cli::ChunkArgs),
    /// Merge per-chunk results into one dataset
    Merge(cli::MergeArgs),
    /// Filter merged results against a reference
    Filter(cli::FilterArgs),
    /// Plot summary charts from filtered results
    Plot(cli::PlotArgs),
    /// Run the full pipeline: chunk -> merge -> filter -> plot
    Runall(cli::RunallArgs),
}

fn init_logger(verbose: bool) {
    // RUST_LOG still overrides the --verbose default
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match &cli.command {
        Command::Chunk(args) => args.run(),
        Command::Merge(args) => args.run(),
        Command::Filter(args) => args.run(),
        Command::Plot(args) => args.run(),
        Command::Runall(args) => args.run(),
    }
}

fn main() -> miette::Result<()> {
    try_main().into_diagnostic()
}
