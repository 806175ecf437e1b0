//! Command-line interface for the dispersion planner.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod solve;

pub use error::CliError;
use solve::{SolveArgs, run_solve};

const ARG_INSTANCE: &str = "instance";
const ARG_BACKEND: &str = "backend";
const ARG_MODEL_TYPE: &str = "model-type";
const ARG_TIME_LIMIT: &str = "time-limit";
const ARG_WORKERS: &str = "workers";
const ARG_VERBOSITY: &str = "verbosity";
const ARG_PRESOLVE: &str = "presolve";
const ARG_MAX_PRESOLVE_ITERATIONS: &str = "max-presolve-iterations";
const ARG_LINEARIZATION_LEVEL: &str = "linearization-level";
const ARG_PROBING_LEVEL: &str = "probing-level";
const ARG_ORDERING: &str = "ordering";
const ARG_DECIMAL_POINTS: &str = "decimal-points";
const ARG_DISTINCT_SITES: &str = "distinct-sites";
const ARG_OUTPUT: &str = "output";
const ENV_INSTANCE: &str = "DISPERSION_CMDS_SOLVE_INSTANCE_PATH";

/// Run the dispersion CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Solve(args) => run_solve(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "dispersion",
    about = "Place facilities on candidate sites so the closest pair is as far apart as possible",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve a p-dispersion instance and print the result as JSON.
    Solve(SolveArgs),
}

#[cfg(test)]
mod tests;
