//! Capacity expansion MILP solver
//!
//! Formulates [`ExpansionProblem`] with `good_lp` and hands it to the best
//! compiled-in backend. HiGHS and CBC solve the true MILP; Clarabel solves
//! the LP relaxation and unit counts are rounded up afterwards.

use std::fmt;
use std::str::FromStr;

use good_lp::{
    constraint, variable, variables, Constraint, Expression, ProblemVariables, ResolutionError,
    Solution, SolutionStatus, SolverModel, Variable, VariableDefinition,
};
use serde::{Deserialize, Serialize};
use web_time::Instant;

use siteplan_core::{
    ConstraintKind, ConstraintStatus, DrService, EquipmentConfiguration, PlanError, PlanResult, Technology, LB_PER_TON,
};

use super::problem::{solar_availability, ExpansionInputs, ExpansionProblem};
use super::solution::{ExpansionSolution, TerminationStatus, YearPlan};
use crate::constraints::{ConstraintCheck, ConstraintChecker, GAS, LAND, NOX};
use crate::lcoe::LcoeCalculator;

/// Available MILP backends, in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    Highs,
    Cbc,
    Clarabel,
}

impl SolverKind {
    pub const PRIORITY: [SolverKind; 3] = [SolverKind::Highs, SolverKind::Cbc, SolverKind::Clarabel];

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Highs => "highs",
            SolverKind::Cbc => "cbc",
            SolverKind::Clarabel => "clarabel",
        }
    }

    /// Whether this backend was compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            SolverKind::Highs => cfg!(feature = "solver-highs"),
            SolverKind::Cbc => cfg!(feature = "solver-coin_cbc"),
            SolverKind::Clarabel => cfg!(feature = "solver-clarabel"),
        }
    }

    /// Clarabel is an interior-point conic solver with no branch and bound.
    pub fn supports_integers(&self) -> bool {
        !matches!(self, SolverKind::Clarabel)
    }

    pub fn available() -> Vec<SolverKind> {
        Self::PRIORITY
            .into_iter()
            .filter(|s| s.is_available())
            .collect()
    }

    pub fn preferred() -> Option<SolverKind> {
        Self::PRIORITY.into_iter().find(|s| s.is_available())
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highs" => Ok(SolverKind::Highs),
            "cbc" | "coin_cbc" | "coin-cbc" => Ok(SolverKind::Cbc),
            "clarabel" => Ok(SolverKind::Clarabel),
            _ => Err(format!("Unknown solver: {}", s)),
        }
    }
}

/// Solver run configuration
///
/// Clarabel honours the time limit and verbosity; the gap only applies to
/// the branch-and-bound backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Wall-clock limit (seconds)
    pub time_limit_seconds: f64,
    /// Relative MIP gap
    pub mip_gap: f64,
    pub verbose: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit_seconds: 120.0,
            mip_gap: 0.05,
            verbose: false,
        }
    }
}

impl SolveOptions {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_seconds = seconds;
        self
    }

    pub fn with_gap(mut self, gap: f64) -> Self {
        self.mip_gap = gap;
        self
    }
}

#[derive(Debug)]
enum ModelState {
    Unbuilt,
    Built(Box<ExpansionProblem>),
    Solved,
}

/// Multi-year capacity expansion model.
///
/// `build` once, then `solve` once:
///
/// ```no_run
/// use siteplan_algo::expansion::{CapacityExpansionModel, ExpansionInputs, SolveOptions};
/// use siteplan_core::LoadTrajectory;
///
/// let inputs = ExpansionInputs {
///     load_trajectory: LoadTrajectory::flat(2027, 50.0).with_year(2028, 80.0),
///     ..ExpansionInputs::default()
/// };
/// let mut model = CapacityExpansionModel::new();
/// model.build(inputs)?;
/// let solution = model.solve(None, &SolveOptions::default())?;
/// println!("{}", solution.summary());
/// # Ok::<(), siteplan_core::PlanError>(())
/// ```
#[derive(Debug)]
pub struct CapacityExpansionModel {
    state: ModelState,
}

impl Default for CapacityExpansionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CapacityExpansionModel {
    pub fn new() -> Self {
        Self {
            state: ModelState::Unbuilt,
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state, ModelState::Built(_))
    }

    pub fn problem(&self) -> Option<&ExpansionProblem> {
        match &self.state {
            ModelState::Built(problem) => Some(problem),
            _ => None,
        }
    }

    pub fn build(&mut self, inputs: ExpansionInputs) -> PlanResult<()> {
        if !matches!(self.state, ModelState::Unbuilt) {
            return Err(PlanError::Config("Model already built".into()));
        }
        if SolverKind::preferred().is_none() {
            return Err(PlanError::Config(
                "No solver found; enable solver-highs, solver-coin_cbc or solver-clarabel".into(),
            ));
        }
        let problem = ExpansionProblem::from_inputs(inputs)?;
        self.state = ModelState::Built(Box::new(problem));
        Ok(())
    }

    /// Solve with `solver` (or the preferred backend). Solver failures come
    /// back as a non-optimal [`ExpansionSolution`], not as `Err`.
    pub fn solve(
        &mut self,
        solver: Option<&str>,
        options: &SolveOptions,
    ) -> PlanResult<ExpansionSolution> {
        match self.state {
            ModelState::Unbuilt => return Err(PlanError::Config("Model not built".into())),
            ModelState::Solved => return Err(PlanError::Config("Model already solved".into())),
            ModelState::Built(_) => {}
        }
        let (kind, fallback) = resolve_solver(solver)?;
        let ModelState::Built(problem) = std::mem::replace(&mut self.state, ModelState::Solved)
        else {
            return Err(PlanError::Config("Model not built".into()));
        };

        let start = Instant::now();
        let mut solution = solve_problem(&problem, kind, options)?;
        solution.solve_time_seconds = start.elapsed().as_secs_f64();
        if let Some(warning) = fallback {
            solution.warnings.insert(0, warning);
        }
        Ok(solution)
    }
}

fn resolve_solver(name: Option<&str>) -> PlanResult<(SolverKind, Option<String>)> {
    let preferred =
        SolverKind::preferred().ok_or_else(|| PlanError::Config("No solver found".into()))?;
    let Some(name) = name else {
        return Ok((preferred, None));
    };
    let requested = SolverKind::from_str(name).map_err(PlanError::Config)?;
    if requested.is_available() {
        Ok((requested, None))
    } else {
        Ok((
            preferred,
            Some(format!(
                "Solver {requested} not compiled in; using {preferred}"
            )),
        ))
    }
}

/// Annualized cost coefficients shared by the objective and the reported
/// per-year costs.
struct CostModel {
    recip_capex_per_unit: f64,
    recip_fom_per_unit: f64,
    turbine_capex_per_unit: f64,
    turbine_fom_per_unit: f64,
    solar_capex_per_mw: f64,
    bess_capex_per_mwh: f64,
    bess_degradation_per_mwh: f64,
    interconnect: f64,
    recip_per_mwh: f64,
    turbine_per_mwh: f64,
    solar_per_mwh: f64,
    grid_per_mwh: f64,
    unserved_per_mwh: f64,
}

impl CostModel {
    fn new(inputs: &ExpansionInputs) -> Self {
        let c = &inputs.catalog;
        let e = &inputs.economics;
        let crf = e.capital_recovery_factor();
        let itc = 1.0 - e.itc_rate;
        Self {
            recip_capex_per_unit: crf * c.recip.unit_mw * 1000.0 * c.recip.capex_per_kw,
            recip_fom_per_unit: c.recip.unit_mw * 1000.0 * c.recip.fom_per_kw_yr,
            turbine_capex_per_unit: crf * c.turbine.unit_mw * 1000.0 * c.turbine.capex_per_kw,
            turbine_fom_per_unit: c.turbine.unit_mw * 1000.0 * c.turbine.fom_per_kw_yr,
            solar_capex_per_mw: crf * 1e6 * c.solar.capex_per_w_dc * itc,
            bess_capex_per_mwh: crf * 1000.0 * c.battery.capex_per_kwh * itc,
            bess_degradation_per_mwh: c.battery.cycles_per_year
                * 1000.0
                * c.battery.degradation_per_kwh,
            interconnect: crf * c.grid.interconnect_capex,
            recip_per_mwh: c.recip.mmbtu_per_mwh() * e.fuel_price_mmbtu + c.recip.vom_per_mwh,
            turbine_per_mwh: c.turbine.mmbtu_per_mwh() * e.fuel_price_mmbtu
                + c.turbine.vom_per_mwh,
            solar_per_mwh: c.solar.vom_per_mwh,
            grid_per_mwh: c.grid.energy_price_mwh,
            unserved_per_mwh: e.unserved_penalty_mwh,
        }
    }
}

/// Decision variables for one modeled hour.
struct HourVars {
    recip: Variable,
    turbine: Variable,
    solar: Variable,
    grid: Variable,
    charge: Variable,
    discharge: Variable,
    soc: Variable,
    unserved: Variable,
    curtail: Vec<Variable>,
    cooling: Variable,
}

impl HourVars {
    fn curtailment(&self) -> Expression {
        self.curtail.iter().copied().sum::<Expression>() + self.cooling
    }
}

/// Decision variables for one planning year.
struct YearVars {
    n_recip: Variable,
    n_turbine: Variable,
    bess_mw: Variable,
    bess_mwh: Variable,
    solar_mw: Variable,
    grid_mw: Variable,
    grid_active: Variable,
    dr: Vec<(DrService, Variable)>,
    hours: Vec<HourVars>,
}

struct Formulation {
    vars: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    years: Vec<YearVars>,
}

fn unit_count(integer: bool, min: u32, max: u32) -> VariableDefinition {
    let def = variable().min(min as f64).max(max.max(min) as f64);
    if integer {
        def.integer()
    } else {
        def
    }
}

fn formulate(problem: &ExpansionProblem, integer: bool) -> Formulation {
    let inputs = &problem.inputs;
    let catalog = &inputs.catalog;
    let limits = &inputs.limits;
    let existing = &problem.existing;
    let costs = CostModel::new(inputs);
    let recip = &catalog.recip;
    let turbine = &catalog.turbine;
    let battery = &catalog.battery;
    let caps = &inputs.constraints;
    let existing_active = existing.grid_mw > 0.0;
    let existing_bess_mwh = existing.bess_mwh.max(existing.bess_mw * battery.duration_hours);

    let mut vars = variables!();
    let mut constraints: Vec<Constraint> = Vec::new();
    let mut years: Vec<YearVars> = Vec::with_capacity(problem.years.len());
    let mut cost = Expression::from(0.0);
    let mut energy = 0.0;

    for (yi, loads) in problem.hourly_load.iter().enumerate() {
        let df = problem.discount(yi);
        energy += df * problem.required_energy[yi];

        // === Build decisions ===
        let n_recip = vars.add(unit_count(integer, existing.n_recip, limits.max_recip_units));
        let n_turbine =
            vars.add(unit_count(integer, existing.n_turbine, limits.max_turbine_units));
        let bess_mwh = vars.add(
            variable()
                .min(existing_bess_mwh)
                .max(limits.max_bess_mwh.max(existing_bess_mwh)),
        );
        let bess_mw = vars.add(variable().min(0.0).max(limits.max_bess_mw.max(existing.bess_mw)));
        let solar_mw = vars.add(
            variable()
                .min(existing.solar_mw)
                .max(limits.max_solar_mw.max(existing.solar_mw)),
        );
        let grid_max = problem.grid_max_mw.max(existing.grid_mw);
        let grid_mw = vars.add(variable().min(existing.grid_mw).max(grid_max));
        let active_min = if existing_active { 1.0 } else { 0.0 };
        let active_max = if problem.grid_allowed(yi) { 1.0 } else { 0.0 };
        let grid_active = if integer && active_max > active_min {
            vars.add(variable().binary())
        } else {
            vars.add(variable().min(active_min).max(active_max))
        };

        constraints.push(constraint!(bess_mwh == battery.duration_hours * bess_mw));
        constraints.push(constraint!(grid_mw <= grid_max * grid_active));
        constraints.push(constraint!(
            recip.unit_mw * recip.land_acres_per_mw * n_recip
                + turbine.unit_mw * turbine.land_acres_per_mw * n_turbine
                + catalog.solar.land_acres_per_mw * solar_mw
                + battery.land_acres_per_mwh * bess_mwh
                <= caps.land_acres
        ));

        if let Some(prev) = years.last() {
            constraints.push(constraint!(n_recip >= prev.n_recip));
            constraints.push(constraint!(n_turbine >= prev.n_turbine));
            constraints.push(constraint!(bess_mwh >= prev.bess_mwh));
            constraints.push(constraint!(solar_mw >= prev.solar_mw));
            constraints.push(constraint!(grid_mw >= prev.grid_mw));
            constraints.push(constraint!(grid_active >= prev.grid_active));
        }

        if inputs.require_n1 {
            let largest = recip.unit_mw.max(turbine.unit_mw);
            constraints.push(constraint!(
                recip.unit_mw * n_recip + turbine.unit_mw * n_turbine + grid_mw - largest
                    >= problem.n1_load[yi]
            ));
        }

        // Fixed cost: annualized capex of new capacity plus fixed O&M
        let mut year_cost = costs.recip_capex_per_unit * (n_recip - existing.n_recip as f64)
            + costs.recip_fom_per_unit * n_recip
            + costs.turbine_capex_per_unit * (n_turbine - existing.n_turbine as f64)
            + costs.turbine_fom_per_unit * n_turbine
            + costs.solar_capex_per_mw * (solar_mw - existing.solar_mw)
            + costs.bess_capex_per_mwh * (bess_mwh - existing_bess_mwh)
            + costs.bess_degradation_per_mwh * bess_mwh
            + costs.interconnect * (grid_active - active_min);

        // === Hourly dispatch ===
        let mut hours: Vec<HourVars> = Vec::with_capacity(problem.hours.len());
        let mut nox = Expression::from(0.0);
        let mut gas = Expression::from(0.0);
        let mut curtailed = Expression::from(0.0);

        for (ti, hour) in problem.hours.iter().enumerate() {
            let load = loads[ti];
            let w = hour.weight;
            let h = HourVars {
                recip: vars.add(variable().min(0.0)),
                turbine: vars.add(variable().min(0.0)),
                solar: vars.add(variable().min(0.0)),
                grid: vars.add(variable().min(0.0)),
                charge: vars.add(variable().min(0.0)),
                discharge: vars.add(variable().min(0.0)),
                soc: vars.add(variable().min(0.0)),
                unserved: vars.add(variable().min(0.0).max(load)),
                curtail: problem
                    .curtailment
                    .classes
                    .iter()
                    .map(|(_, share)| vars.add(variable().min(0.0).max(share * load)))
                    .collect(),
                cooling: vars.add(variable().min(0.0).max(problem.curtailment.cooling * load)),
            };

            constraints.push(constraint!(
                h.recip <= recip.unit_mw * recip.availability * n_recip
            ));
            constraints.push(constraint!(
                h.turbine <= turbine.unit_mw * turbine.availability * n_turbine
            ));
            let solar_cf = solar_availability(hour.hour_of_day, catalog.solar.capacity_factor);
            constraints.push(constraint!(h.solar <= solar_cf * solar_mw));
            constraints.push(constraint!(h.grid <= catalog.grid.availability * grid_mw));
            constraints.push(constraint!(h.charge <= bess_mw));
            constraints.push(constraint!(h.discharge <= bess_mw));
            constraints.push(constraint!(h.soc <= bess_mwh));
            constraints.push(constraint!(h.soc >= battery.min_soc_fraction * bess_mwh));

            let eff = battery.charge_efficiency;
            let soc_prev: Expression = match hours.last() {
                Some(prev) if !hour.week_start => Expression::from(prev.soc),
                _ => battery.initial_soc_fraction * bess_mwh,
            };
            constraints.push(constraint!(
                h.soc == soc_prev + eff * h.charge - (1.0 / eff) * h.discharge
            ));

            let curtail = h.curtailment();
            constraints.push(constraint!(
                curtail.clone() <= limits.max_hourly_curtailment * load
            ));
            constraints.push(constraint!(
                h.recip + h.turbine + h.solar + h.grid + h.discharge + h.unserved
                    + curtail.clone()
                    - h.charge
                    == load
            ));

            nox += w * recip.nox_lb_per_mwh() / LB_PER_TON * h.recip
                + w * turbine.nox_lb_per_mwh() / LB_PER_TON * h.turbine;
            gas += w * recip.mcf_per_mwh() / 365.0 * h.recip
                + w * turbine.mcf_per_mwh() / 365.0 * h.turbine;
            curtailed += w * curtail;

            year_cost += w * costs.recip_per_mwh * h.recip
                + w * costs.turbine_per_mwh * h.turbine
                + w * costs.solar_per_mwh * h.solar
                + w * costs.grid_per_mwh * h.grid
                + w * costs.unserved_per_mwh * h.unserved;

            hours.push(h);
        }

        constraints.push(constraint!(nox <= caps.nox_tpy));
        constraints.push(constraint!(gas <= caps.gas_mcf_day));
        constraints.push(constraint!(
            curtailed <= limits.max_annual_curtailment * problem.required_energy[yi]
        ));

        // === Demand response ===
        let dr: Vec<(DrService, Variable)> = problem
            .dr
            .services
            .iter()
            .map(|s| (*s, vars.add(variable().min(0.0))))
            .collect();
        if !dr.is_empty() {
            let enrolled: Expression = dr.iter().map(|(_, v)| *v).sum();
            for (ti, hour) in problem.hours.iter().enumerate() {
                if hour.is_peak() {
                    constraints.push(constraint!(enrolled.clone() <= hours[ti].curtailment()));
                }
            }
            for (service, v) in &dr {
                let payment = problem.dr.terms_for(*service).payment_per_mw_hr;
                year_cost -= payment * siteplan_core::HOURS_PER_YEAR * *v;
            }
        }

        cost += df * year_cost;
        years.push(YearVars {
            n_recip,
            n_turbine,
            bess_mw,
            bess_mwh,
            solar_mw,
            grid_mw,
            grid_active,
            dr,
            hours,
        });
    }

    let objective = if energy > 0.0 { cost * (1.0 / energy) } else { cost };
    Formulation {
        vars,
        objective,
        constraints,
        years,
    }
}

/// Termination status for a solve that produced no usable solution.
///
/// A backend that stops on its time limit before finding an incumbent
/// reports an error rather than a solution: Clarabel as "Time limit
/// reached", HiGHS as "NoSolutionFound".
fn termination(err: &ResolutionError) -> TerminationStatus {
    match err {
        ResolutionError::Infeasible => TerminationStatus::Infeasible,
        ResolutionError::Unbounded => TerminationStatus::Unbounded,
        ResolutionError::Other("Time limit reached" | "NoSolutionFound") => {
            TerminationStatus::TimeLimit
        }
        _ => TerminationStatus::SolverError,
    }
}

fn status_of(status: SolutionStatus) -> TerminationStatus {
    match status {
        SolutionStatus::Optimal => TerminationStatus::Optimal,
        SolutionStatus::GapLimit => TerminationStatus::GapLimit,
        SolutionStatus::TimeLimit => TerminationStatus::TimeLimit,
    }
}

fn solve_problem(
    problem: &ExpansionProblem,
    kind: SolverKind,
    options: &SolveOptions,
) -> PlanResult<ExpansionSolution> {
    let relaxed = !kind.supports_integers();
    let Formulation {
        vars,
        objective,
        constraints,
        years,
    } = formulate(problem, !relaxed);

    let outcome: Result<ExpansionSolution, ResolutionError> = match kind {
        #[cfg(feature = "solver-highs")]
        SolverKind::Highs => {
            let mut model = vars
                .minimise(objective)
                .using(good_lp::solvers::highs::highs);
            model.set_verbose(options.verbose);
            let mut model = model
                .set_option("time_limit", options.time_limit_seconds)
                .set_option("mip_rel_gap", options.mip_gap);
            for c in constraints {
                model = model.with(c);
            }
            model
                .solve()
                .map(|s| extract(problem, &years, &s, kind, relaxed))
        }
        #[cfg(feature = "solver-coin_cbc")]
        SolverKind::Cbc => {
            let mut model = vars
                .minimise(objective)
                .using(good_lp::solvers::coin_cbc::coin_cbc);
            model.set_parameter("seconds", &options.time_limit_seconds.to_string());
            model.set_parameter("ratioGap", &options.mip_gap.to_string());
            if !options.verbose {
                model.set_parameter("log", "0");
            }
            for c in constraints {
                model = model.with(c);
            }
            model
                .solve()
                .map(|s| extract(problem, &years, &s, kind, relaxed))
        }
        #[cfg(feature = "solver-clarabel")]
        SolverKind::Clarabel => {
            let mut model = vars
                .minimise(objective)
                .using(good_lp::solvers::clarabel::clarabel);
            model
                .settings()
                .time_limit(options.time_limit_seconds)
                .verbose(options.verbose);
            for c in constraints {
                model = model.with(c);
            }
            model
                .solve()
                .map(|s| extract(problem, &years, &s, kind, relaxed))
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(PlanError::Config(format!("Solver {other} not compiled in")));
        }
    };

    Ok(match outcome {
        Ok(solution) => solution,
        Err(err) => {
            let mut solution = ExpansionSolution::new(termination(&err), kind.as_str());
            solution.relaxed = relaxed;
            solution.grid_year = problem.grid_year;
            solution.message = err.to_string();
            solution
        }
    })
}

fn round_units(value: f64, relaxed: bool) -> u32 {
    let units = if relaxed {
        (value - 1e-6).ceil()
    } else {
        value.round()
    };
    units.max(0.0) as u32
}

fn extract<S: Solution>(
    problem: &ExpansionProblem,
    years: &[YearVars],
    sol: &S,
    kind: SolverKind,
    relaxed: bool,
) -> ExpansionSolution {
    let inputs = &problem.inputs;
    let catalog = &inputs.catalog;
    let costs = CostModel::new(inputs);
    let existing = &problem.existing;
    let existing_bess_mwh = existing
        .bess_mwh
        .max(existing.bess_mw * catalog.battery.duration_hours);

    let status = status_of(sol.status());
    let mut solution = ExpansionSolution::new(status, kind.as_str());
    solution.relaxed = relaxed;
    solution.grid_year = problem.grid_year;
    solution.message = match (status, relaxed) {
        (TerminationStatus::TimeLimit, _) => "Time limit reached; best incumbent".to_string(),
        (_, true) => format!("{status} (LP relaxation)"),
        (_, false) => status.to_string(),
    };

    let mut prev_units = (existing.n_recip, existing.n_turbine);
    let mut discounted_cost = 0.0;
    let mut discounted_energy = 0.0;

    for (yi, yv) in years.iter().enumerate() {
        let year = problem.years[yi];
        let loads = &problem.hourly_load[yi];
        let required = problem.required_energy[yi];

        let n_recip = round_units(sol.value(yv.n_recip), relaxed).max(prev_units.0);
        let n_turbine = round_units(sol.value(yv.n_turbine), relaxed).max(prev_units.1);
        prev_units = (n_recip, n_turbine);
        let grid_active = sol.value(yv.grid_active) > 1e-6;
        let equipment = EquipmentConfiguration::from_units(
            catalog,
            n_recip,
            n_turbine,
            sol.value(yv.solar_mw).max(0.0),
            sol.value(yv.bess_mw).max(0.0),
            sol.value(yv.bess_mwh).max(0.0),
            if grid_active {
                sol.value(yv.grid_mw).max(0.0)
            } else {
                0.0
            },
        );

        let mut recip_mwh = 0.0;
        let mut turbine_mwh = 0.0;
        let mut solar_mwh = 0.0;
        let mut grid_mwh = 0.0;
        let mut unserved = 0.0;
        let mut curtailed = 0.0;
        let mut sampled_load = 0.0;
        for (ti, hour) in problem.hours.iter().enumerate() {
            let w = hour.weight;
            let h = &yv.hours[ti];
            recip_mwh += w * sol.value(h.recip);
            turbine_mwh += w * sol.value(h.turbine);
            solar_mwh += w * sol.value(h.solar);
            grid_mwh += w * sol.value(h.grid);
            unserved += w * sol.value(h.unserved);
            curtailed += w * (h.curtail.iter().map(|v| sol.value(*v)).sum::<f64>()
                + sol.value(h.cooling));
            sampled_load += w * loads[ti];
        }
        // Sampled weeks cover 8736 h; scale shares onto the full year.
        let unserved_share = if sampled_load > 0.0 {
            (unserved / sampled_load).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let unserved_mwh = unserved_share * required;

        let dr_capacity_mw: std::collections::BTreeMap<DrService, f64> = yv
            .dr
            .iter()
            .map(|(s, v)| (*s, sol.value(*v).max(0.0)))
            .collect();
        let dr_revenue: f64 = dr_capacity_mw
            .iter()
            .map(|(s, mw)| {
                mw * problem.dr.terms_for(*s).payment_per_mw_hr * siteplan_core::HOURS_PER_YEAR
            })
            .sum();

        let active_min = if existing.grid_mw > 0.0 { 1.0 } else { 0.0 };
        let fixed = costs.recip_capex_per_unit
            * (n_recip as f64 - existing.n_recip as f64)
            + costs.recip_fom_per_unit * n_recip as f64
            + costs.turbine_capex_per_unit * (n_turbine as f64 - existing.n_turbine as f64)
            + costs.turbine_fom_per_unit * n_turbine as f64
            + costs.solar_capex_per_mw * (equipment.solar_mw - existing.solar_mw)
            + costs.bess_capex_per_mwh * (equipment.bess_mwh - existing_bess_mwh)
            + costs.interconnect * (if grid_active { 1.0 } else { 0.0 } - active_min);
        let opex = costs.bess_degradation_per_mwh * equipment.bess_mwh
            + costs.recip_per_mwh * recip_mwh
            + costs.turbine_per_mwh * turbine_mwh
            + costs.solar_per_mwh * solar_mwh
            + costs.grid_per_mwh * grid_mwh;
        let annual_cost = fixed + opex + costs.unserved_per_mwh * unserved - dr_revenue;

        let df = problem.discount(yi);
        discounted_cost += df * annual_cost;
        discounted_energy += df * required;

        let generation_mwh = [
            (Technology::Recip, recip_mwh),
            (Technology::Turbine, turbine_mwh),
            (Technology::Solar, solar_mwh),
            (Technology::Grid, grid_mwh),
        ]
        .into_iter()
        .filter(|(_, mwh)| *mwh > 1e-9)
        .collect();

        solution.years.push(YearPlan {
            year,
            load_mw: inputs.load_trajectory.load_at_or_before(year),
            grid_active,
            energy_required_mwh: required,
            energy_served_mwh: required - unserved_mwh,
            coverage_pct: (1.0 - unserved_share) * 100.0,
            unserved_mwh,
            generation_mwh,
            nox_tpy: recip_mwh * catalog.recip.nox_lb_per_mwh() / LB_PER_TON
                + turbine_mwh * catalog.turbine.nox_lb_per_mwh() / LB_PER_TON,
            gas_mcf_day: (recip_mwh * catalog.recip.mcf_per_mwh()
                + turbine_mwh * catalog.turbine.mcf_per_mwh())
                / 365.0,
            curtailment_mwh: curtailed,
            dr_capacity_mw,
            dr_revenue,
            annual_cost,
            opex,
            lcoe: if required > 0.0 {
                annual_cost / required
            } else {
                0.0
            },
            equipment,
        });
    }

    solution.lcoe = if discounted_energy > 0.0 {
        discounted_cost / discounted_energy
    } else {
        0.0
    };
    finish(problem, &mut solution);
    solution
}

/// Final-year constraint status, coverage violations, capex and timeline.
fn finish(problem: &ExpansionProblem, solution: &mut ExpansionSolution) {
    let inputs = &problem.inputs;
    let tuning = &inputs.tuning;
    let thresholds = tuning.status_thresholds();
    let caps = &inputs.constraints;
    let required_coverage = caps.min_availability * 100.0;

    for plan in &solution.years {
        if plan.coverage_pct + 1e-6 < required_coverage {
            solution.violations.push(format!(
                "Coverage: {:.2}% in {} is below required {:.2}%",
                plan.coverage_pct, plan.year, required_coverage
            ));
        }
    }

    let Some(last) = solution.years.last() else {
        return;
    };
    let mut check = ConstraintCheck::default();
    for (name, unit, value, limit, kind) in [
        (NOX, "tpy", last.nox_tpy, caps.nox_tpy, ConstraintKind::Hard),
        (GAS, "MCF/day", last.gas_mcf_day, caps.gas_mcf_day, ConstraintKind::Soft),
        (
            LAND,
            "acres",
            last.equipment.land_used_acres,
            caps.land_acres,
            ConstraintKind::Soft,
        ),
    ] {
        let status = ConstraintStatus::evaluate(name, unit, value, limit, kind, thresholds);
        check.status.insert(name.to_string(), status);
    }

    let checker = ConstraintChecker::new(&inputs.catalog, caps, tuning);
    solution.shadow_prices = checker.shadow_prices(&check, solution.lcoe);
    solution.constraint_status = check.status;

    let calc = LcoeCalculator::new(&inputs.catalog, &inputs.economics, tuning);
    solution.capex_total = (calc.capex(&last.equipment) - calc.capex(&problem.existing)).max(0.0);
    solution.timeline_months = solution
        .years
        .first()
        .map(|first| checker.calculate_timeline(&first.equipment))
        .unwrap_or(0);
    if solution.relaxed {
        solution
            .warnings
            .push("Unit counts rounded up from the LP relaxation".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteplan_core::LoadTrajectory;

    fn small_inputs() -> ExpansionInputs {
        ExpansionInputs {
            load_trajectory: LoadTrajectory::flat(2027, 20.0).with_year(2028, 30.0),
            constraints: siteplan_core::SiteConstraints {
                nox_tpy: 1e6,
                gas_mcf_day: 1e7,
                land_acres: 1e5,
                min_availability: 0.0,
                ..siteplan_core::SiteConstraints::default()
            },
            ..ExpansionInputs::default()
        }
    }

    #[test]
    fn test_solver_names() {
        assert_eq!("HiGHS".parse::<SolverKind>(), Ok(SolverKind::Highs));
        assert_eq!("coin_cbc".parse::<SolverKind>(), Ok(SolverKind::Cbc));
        assert_eq!(
            "gurobi".parse::<SolverKind>(),
            Err("Unknown solver: gurobi".to_string())
        );
        assert!(!SolverKind::Clarabel.supports_integers());
    }

    #[test]
    fn test_partial_options_keep_defaults() {
        let options: SolveOptions = toml::from_str("mip_gap = 0.01").unwrap();
        assert_eq!(options.mip_gap, 0.01);
        assert_eq!(options.time_limit_seconds, 120.0);
        assert!(!options.verbose);
    }

    #[test]
    fn test_solve_before_build() {
        let mut model = CapacityExpansionModel::new();
        let err = model.solve(None, &SolveOptions::default()).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Model not built"));
    }

    #[test]
    fn test_unknown_solver_is_config_error() {
        let mut model = CapacityExpansionModel::new();
        model.build(small_inputs()).unwrap();
        let err = model
            .solve(Some("gurobi"), &SolveOptions::default())
            .unwrap_err();
        assert!(err.is_config());
        // The model stays built after a rejected solver name.
        assert!(model.is_built());
    }

    #[test]
    fn test_double_build_rejected() {
        let mut model = CapacityExpansionModel::new();
        model.build(small_inputs()).unwrap();
        let err = model.build(small_inputs()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_empty_trajectory_rejected_at_build() {
        let mut model = CapacityExpansionModel::new();
        let err = model.build(ExpansionInputs::default()).unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
        assert!(!model.is_built());
    }

    #[test]
    fn test_round_units() {
        assert_eq!(round_units(2.0000001, true), 2);
        assert_eq!(round_units(2.01, true), 3);
        assert_eq!(round_units(2.4, false), 2);
        assert_eq!(round_units(-0.3, false), 0);
    }

    #[test]
    fn test_cost_model_fuel() {
        let cost = CostModel::new(&ExpansionInputs::default());
        // 7.7 MMBtu/MWh × $3.50 + $8.50 VOM
        assert!((cost.recip_per_mwh - (7.7 * 3.5 + 8.5)).abs() < 1e-9);
        assert_eq!(cost.unserved_per_mwh, 50_000.0);
    }

    #[cfg(any(feature = "solver-highs", feature = "solver-clarabel"))]
    #[test]
    fn test_small_model_solves() {
        let mut model = CapacityExpansionModel::new();
        model.build(small_inputs()).unwrap();
        let solution = model
            .solve(None, &SolveOptions::default().with_time_limit(60.0))
            .unwrap();
        assert!(solution.is_optimal(), "{}", solution.message);
        assert_eq!(solution.years.len(), 2);
        assert!(solution.units_non_decreasing());
        assert!(solution.lcoe > 0.0);
        // Grid year defaults to 2035, so no grid in either year.
        assert!(solution.years.iter().all(|p| p.equipment.grid_mw == 0.0));
        assert!(solution.years.iter().all(|p| !p.grid_active));
    }

    #[test]
    fn test_backend_errors_map_to_status() {
        assert_eq!(
            termination(&ResolutionError::Other("Time limit reached")),
            TerminationStatus::TimeLimit
        );
        assert_eq!(
            termination(&ResolutionError::Other("NoSolutionFound")),
            TerminationStatus::TimeLimit
        );
        assert_eq!(
            termination(&ResolutionError::Infeasible),
            TerminationStatus::Infeasible
        );
        assert_eq!(
            termination(&ResolutionError::Other("numerical trouble")),
            TerminationStatus::SolverError
        );
    }

    #[test]
    fn test_backend_status_carried_through() {
        assert_eq!(status_of(SolutionStatus::Optimal), TerminationStatus::Optimal);
        assert_eq!(status_of(SolutionStatus::GapLimit), TerminationStatus::GapLimit);
        assert_eq!(status_of(SolutionStatus::TimeLimit), TerminationStatus::TimeLimit);
        assert!(status_of(SolutionStatus::GapLimit).is_optimal());
        assert!(!status_of(SolutionStatus::TimeLimit).is_optimal());
    }

    #[test]
    fn test_finish_uses_input_tuning() {
        let year = |nox_tpy| YearPlan {
            year: 2028,
            nox_tpy,
            coverage_pct: 100.0,
            ..YearPlan::default()
        };
        let mut relaxed_tuning = siteplan_core::HeuristicTuning::default();
        relaxed_tuning.binding_threshold = 0.85;

        let problem = ExpansionProblem::from_inputs(small_inputs()).unwrap();
        let mut solution = ExpansionSolution::new(TerminationStatus::Optimal, "highs");
        solution.years = vec![year(9e5)];
        finish(&problem, &mut solution);
        assert!(!solution.constraint_status[NOX].binding);

        let problem = ExpansionProblem::from_inputs(ExpansionInputs {
            tuning: relaxed_tuning,
            ..small_inputs()
        })
        .unwrap();
        let mut solution = ExpansionSolution::new(TerminationStatus::Optimal, "highs");
        solution.years = vec![year(9e5)];
        finish(&problem, &mut solution);
        assert!(solution.constraint_status[NOX].binding);
    }

    #[cfg(feature = "solver-clarabel")]
    #[test]
    fn test_dispatch_respects_battery_and_curtailment_limits() {
        let catalog = siteplan_core::EquipmentCatalog::default();
        let inputs = ExpansionInputs {
            existing: Some(EquipmentConfiguration::from_units(
                &catalog, 0, 0, 0.0, 10.0, 40.0, 0.0,
            )),
            ..small_inputs()
        };
        let problem = ExpansionProblem::from_inputs(inputs).unwrap();
        let Formulation {
            vars,
            objective,
            constraints,
            years,
        } = formulate(&problem, false);
        let mut model = vars
            .minimise(objective)
            .using(good_lp::solvers::clarabel::clarabel);
        for c in constraints {
            model = model.with(c);
        }
        let sol = model.solve().unwrap();

        let battery = &problem.inputs.catalog.battery;
        let limits = &problem.inputs.limits;
        let eff = battery.charge_efficiency;
        let tol = 1e-2;
        for (yi, yv) in years.iter().enumerate() {
            let mwh = sol.value(yv.bess_mwh);
            assert!(mwh >= 40.0 - tol, "existing storage is a floor: {mwh}");
            let mut prev_soc = None;
            for (ti, hour) in problem.hours.iter().enumerate() {
                let h = &yv.hours[ti];
                let soc = sol.value(h.soc);
                assert!(soc <= mwh + tol);
                assert!(soc >= battery.min_soc_fraction * mwh - tol);
                let start = match prev_soc {
                    Some(p) if !hour.week_start => p,
                    _ => battery.initial_soc_fraction * mwh,
                };
                let expected = start + eff * sol.value(h.charge) - sol.value(h.discharge) / eff;
                assert!((soc - expected).abs() < tol, "soc {soc} vs {expected}");

                let curtailed = h.curtail.iter().map(|v| sol.value(*v)).sum::<f64>()
                    + sol.value(h.cooling);
                let load = problem.hourly_load[yi][ti];
                assert!(curtailed <= limits.max_hourly_curtailment * load + tol);
                prev_soc = Some(soc);
            }
        }
    }
}

