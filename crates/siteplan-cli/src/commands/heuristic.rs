//! Heuristic planner commands

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

use siteplan_algo::heuristic::{create_optimizer, ProblemType};
use siteplan_cli::cli::HeuristicCommands;
use siteplan_cli::runfile::{self, HeuristicRun};

use crate::commands::output::write_json;

pub fn handle(command: &HeuristicCommands) -> Result<()> {
    match command {
        HeuristicCommands::Run {
            input,
            problem_type,
            stack,
            out,
        } => handle_run(input, *problem_type, *stack, out.as_deref()),
        HeuristicCommands::Validate { input } => handle_validate(input),
    }
}

fn handle_run(
    input: &Path,
    problem_type: Option<u8>,
    with_stack: bool,
    out: Option<&Path>,
) -> Result<()> {
    let run: HeuristicRun = runfile::load(input)?;
    let problem_type = problem_type.unwrap_or(run.problem_type);
    info!(
        "Planning {} ({} load years, peak {:.1} MW) with problem type {}",
        input.display(),
        run.inputs.load_trajectory.len(),
        run.inputs.peak_mw(),
        problem_type
    );

    let strategy =
        create_optimizer(problem_type, run.inputs, run.params).context("configuring planner")?;
    debug!("Strategy: {}", strategy.problem_type());

    let result = if with_stack {
        strategy.optimize_with_stack(&run.stack)
    } else {
        strategy.optimize()
    };
    info!(
        "{} finished in {:.3}s",
        result.strategy, result.solve_time_seconds
    );
    for violation in &result.violations {
        warn!("Violation: {violation}");
    }
    for warning in &result.warnings {
        debug!("Warning: {warning}");
    }

    write_json(&result, out)?;
    if out.is_some() {
        let eq = &result.equipment_config;
        println!("\nPlan ({}):", result.strategy);
        println!("  Feasible: {}", result.feasible);
        println!("  LCOE: ${:.2}/MWh", result.lcoe);
        println!("  Capex: ${:.0}", result.capex_total);
        println!(
            "  Fleet: {} recip, {} turbine, {:.1} MW solar, {:.1} MWh BESS, {:.1} MW grid",
            eq.n_recip, eq.n_turbine, eq.solar_mw, eq.bess_mwh, eq.grid_mw
        );
        println!("  Firm capacity: {:.1} MW", eq.firm_capacity_mw);
        if let Some(binding) = &result.binding_constraint {
            println!("  Binding: {binding}");
        }
    }
    Ok(())
}

fn handle_validate(input: &Path) -> Result<()> {
    let run: HeuristicRun = runfile::load(input)?;
    let problem_type = ProblemType::try_from(run.problem_type)?;
    run.inputs.validate().context("validating planning inputs")?;
    if problem_type == ProblemType::GridServices {
        run.params
            .workload_mix
            .validate()
            .context("validating workload mix")?;
    }

    println!("Run file is valid");
    println!("  Problem type: {} ({})", problem_type.number(), problem_type);
    println!("  Load years: {}", run.inputs.load_trajectory.len());
    println!("  Peak load: {:.1} MW", run.inputs.peak_mw());
    if run.inputs.constraints.grid_available_year.is_none() {
        println!("  Grid year: not set");
    }
    Ok(())
}
