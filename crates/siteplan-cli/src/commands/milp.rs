//! Capacity expansion commands

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use siteplan_algo::expansion::{CapacityExpansionModel, SolverKind};
use siteplan_cli::cli::MilpCommands;
use siteplan_cli::runfile::{self, MilpRun};
use siteplan_core::OptimizationResult;

use crate::commands::output::write_json;

pub fn handle(command: &MilpCommands) -> Result<()> {
    match command {
        MilpCommands::Solve {
            input,
            solver,
            time_limit,
            gap,
            unified,
            out,
        } => handle_solve(
            input,
            solver.as_deref(),
            *time_limit,
            *gap,
            *unified,
            out.as_deref(),
        ),
        MilpCommands::Solvers => list_solvers(),
    }
}

fn handle_solve(
    input: &Path,
    solver: Option<&str>,
    time_limit: Option<f64>,
    gap: Option<f64>,
    unified: bool,
    out: Option<&Path>,
) -> Result<()> {
    let run: MilpRun = runfile::load(input)?;
    let mut options = run.solve;
    if let Some(seconds) = time_limit {
        options = options.with_time_limit(seconds);
    }
    if let Some(gap) = gap {
        options = options.with_gap(gap);
    }
    let solver = solver.map(str::to_string).or(run.solver);

    let mut model = CapacityExpansionModel::new();
    model.build(run.inputs).context("building expansion model")?;
    if let Some(problem) = model.problem() {
        info!(
            "Expansion model: {} years, {} sampled hours, ~{} variables",
            problem.years.len(),
            problem.hours.len(),
            problem.variable_count()
        );
    }

    let solution = model
        .solve(solver.as_deref(), &options)
        .context("solving expansion model")?;
    info!(
        "Solver {} finished with {} in {:.2}s",
        solution.solver, solution.status, solution.solve_time_seconds
    );
    if !solution.is_optimal() {
        warn!("No optimal plan: {}", solution.message);
    }
    for warning in &solution.warnings {
        warn!("{warning}");
    }

    if out.is_some() {
        print!("{}", solution.summary());
    }
    if unified {
        let result: OptimizationResult = solution.into();
        write_json(&result, out)
    } else {
        write_json(&solution, out)
    }
}

fn list_solvers() -> Result<()> {
    let preferred = SolverKind::preferred();
    println!("Solver backends:");
    for kind in SolverKind::PRIORITY {
        let state = if kind.is_available() {
            "available"
        } else {
            "not compiled in"
        };
        let mode = if kind.supports_integers() {
            "MILP"
        } else {
            "LP relaxation"
        };
        let marker = if Some(kind) == preferred { " (default)" } else { "" };
        println!("  {:<10} {:<16} {}{}", kind.as_str(), state, mode, marker);
    }
    Ok(())
}
