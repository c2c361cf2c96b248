use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "On-site power capacity planning", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Heuristic planners (greenfield, brownfield, land, grid services, bridge)
    Heuristic {
        #[command(subcommand)]
        command: HeuristicCommands,
    },
    /// Multi-year capacity expansion MILP
    Milp {
        #[command(subcommand)]
        command: MilpCommands,
    },
    /// Print the default catalog, site constraints, economics and tuning as TOML
    Catalog {
        /// Write to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HeuristicCommands {
    /// Run one heuristic planner on a run file
    Run {
        /// Run file (TOML or JSON)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Problem type 1..5 (overrides the run file)
        #[arg(short, long)]
        problem_type: Option<u8>,
        /// Attach a year-by-year deployment stack
        #[arg(long)]
        stack: bool,
        /// Write the result JSON here instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Check a run file without planning
    Validate {
        /// Run file (TOML or JSON)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum MilpCommands {
    /// Build and solve the capacity expansion model
    Solve {
        /// Run file (TOML or JSON)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Backend: highs, cbc or clarabel (best available when omitted)
        #[arg(long)]
        solver: Option<String>,
        /// Wall-clock limit in seconds
        #[arg(long)]
        time_limit: Option<f64>,
        /// Relative MIP gap
        #[arg(long)]
        gap: Option<f64>,
        /// Emit the unified result record instead of the per-year solution
        #[arg(long)]
        unified: bool,
        /// Write the solution JSON here instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// List solver backends and whether they were compiled in
    Solvers,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
