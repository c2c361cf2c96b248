//! Heuristic planners
//!
//! One fast, deterministic strategy per planning archetype. Every strategy
//! composes the same three building blocks and returns the shared
//! [`OptimizationResult`] record:
//!
//! ```text
//! ┌──────────────────────┐   ┌────────────────┐   ┌────────────────┐
//! │ ConstraintLimit-     │──▶│ EquipmentSizer │──▶│ LcoeCalculator │
//! │ Calculator (ceilings)│   │ (greedy, 1 pass)│   │ (clamped LCOE) │
//! └──────────────────────┘   └────────────────┘   └────────────────┘
//!                                    │
//!                                    ▼
//!                         ConstraintChecker (status, violations,
//!                         binding constraint, timeline)
//! ```
//!
//! | # | Strategy        | Objective                          |
//! |---|-----------------|------------------------------------|
//! | 1 | Greenfield      | minimize LCOE                      |
//! | 2 | Brownfield      | maximize MW added under a ceiling  |
//! | 3 | LandDevelopment | maximize firm capacity             |
//! | 4 | GridServices    | maximize DR revenue                |
//! | 5 | BridgePower     | minimize transition NPV            |
//!
//! Strategies never return `Err` for an infeasible site. Only wiring
//! mistakes (unknown problem type, empty trajectory) fail, and they fail in
//! [`create_optimizer`] before any work is done.

mod bridge;
mod brownfield;
mod greenfield;
mod grid_services;
mod land_dev;

pub use bridge::BridgeParams;
pub use brownfield::BrownfieldParams;

use serde::{Deserialize, Serialize};
use std::fmt;
use web_time::Instant;

use siteplan_core::{
    DrConfig, EconomicParams, EquipmentCatalog, EquipmentConfiguration, GridPolicy,
    HeuristicTuning, LoadTrajectory, OptimizationResult, PlanError, PlanResult, Site,
    SiteConstraints, WorkloadMix,
};

use crate::constraints::{ConstraintCheck, ConstraintChecker};
use crate::lcoe::{LcoeBreakdown, LcoeCalculator};
use crate::sizing::EquipmentSizer;
use crate::stack::{AnnualStackGenerator, StackOptions};

/// Planning archetype, numbered as callers select it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    Greenfield,
    Brownfield,
    LandDevelopment,
    GridServices,
    BridgePower,
}

impl ProblemType {
    pub const ALL: [ProblemType; 5] = [
        ProblemType::Greenfield,
        ProblemType::Brownfield,
        ProblemType::LandDevelopment,
        ProblemType::GridServices,
        ProblemType::BridgePower,
    ];

    pub fn number(&self) -> u8 {
        match self {
            ProblemType::Greenfield => 1,
            ProblemType::Brownfield => 2,
            ProblemType::LandDevelopment => 3,
            ProblemType::GridServices => 4,
            ProblemType::BridgePower => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::Greenfield => "greenfield",
            ProblemType::Brownfield => "brownfield",
            ProblemType::LandDevelopment => "land_development",
            ProblemType::GridServices => "grid_services",
            ProblemType::BridgePower => "bridge_power",
        }
    }

    /// Bridge power exists to be displaced by the grid; everything else keeps
    /// its on-site fleet.
    pub fn grid_policy(&self) -> GridPolicy {
        match self {
            ProblemType::BridgePower => GridPolicy::Replace,
            _ => GridPolicy::Supplement,
        }
    }
}

impl TryFrom<u8> for ProblemType {
    type Error = PlanError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ProblemType::ALL
            .into_iter()
            .find(|p| p.number() == value)
            .ok_or_else(|| PlanError::Config(format!("Unknown problem type: {value}")))
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs shared by every strategy (and by the MILP).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningInputs {
    pub site: Site,
    pub load_trajectory: LoadTrajectory,
    pub constraints: SiteConstraints,
    pub catalog: EquipmentCatalog,
    pub economics: EconomicParams,
    pub tuning: HeuristicTuning,
}

impl PlanningInputs {
    pub fn new(load_trajectory: LoadTrajectory, constraints: SiteConstraints) -> Self {
        Self {
            load_trajectory,
            constraints,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> PlanResult<()> {
        self.load_trajectory.validate()?;
        self.constraints.validate()
    }

    /// Peak of this run's trajectory; reserve margins apply to this value.
    pub fn peak_mw(&self) -> f64 {
        self.load_trajectory.peak_mw()
    }

    pub fn sizer(&self) -> EquipmentSizer<'_> {
        EquipmentSizer::new(&self.catalog, &self.constraints, &self.tuning)
    }

    pub fn lcoe_calculator(&self) -> LcoeCalculator<'_> {
        LcoeCalculator::new(&self.catalog, &self.economics, &self.tuning)
    }

    pub fn checker(&self) -> ConstraintChecker<'_> {
        ConstraintChecker::new(&self.catalog, &self.constraints, &self.tuning)
    }
}

/// Archetype-specific parameters. Each strategy reads only its own section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemParams {
    pub brownfield: BrownfieldParams,
    pub workload_mix: WorkloadMix,
    pub dr: DrConfig,
    pub bridge: BridgeParams,
}

/// A configured strategy, ready to run.
#[derive(Debug, Clone)]
pub enum Strategy {
    Greenfield(PlanningInputs),
    Brownfield(PlanningInputs, BrownfieldParams),
    LandDevelopment(PlanningInputs),
    GridServices(PlanningInputs, WorkloadMix, DrConfig),
    BridgePower(PlanningInputs, BridgeParams),
}

impl Strategy {
    pub fn problem_type(&self) -> ProblemType {
        match self {
            Strategy::Greenfield(_) => ProblemType::Greenfield,
            Strategy::Brownfield(..) => ProblemType::Brownfield,
            Strategy::LandDevelopment(_) => ProblemType::LandDevelopment,
            Strategy::GridServices(..) => ProblemType::GridServices,
            Strategy::BridgePower(..) => ProblemType::BridgePower,
        }
    }

    pub fn inputs(&self) -> &PlanningInputs {
        match self {
            Strategy::Greenfield(inputs)
            | Strategy::Brownfield(inputs, _)
            | Strategy::LandDevelopment(inputs)
            | Strategy::GridServices(inputs, ..)
            | Strategy::BridgePower(inputs, _) => inputs,
        }
    }

    pub fn optimize(&self) -> OptimizationResult {
        let start = Instant::now();
        let mut result = match self {
            Strategy::Greenfield(inputs) => greenfield::optimize(inputs),
            Strategy::Brownfield(inputs, params) => brownfield::optimize(inputs, params),
            Strategy::LandDevelopment(inputs) => land_dev::optimize(inputs),
            Strategy::GridServices(inputs, mix, dr) => grid_services::optimize(inputs, mix, dr),
            Strategy::BridgePower(inputs, params) => bridge::optimize(inputs, params),
        };
        result.strategy = self.problem_type().as_str().to_string();
        result.solve_time_seconds = start.elapsed().as_secs_f64();
        result
    }

    /// Run and attach a year-by-year stack using this archetype's grid policy.
    pub fn optimize_with_stack(&self, options: &StackOptions) -> OptimizationResult {
        let mut result = self.optimize();
        let inputs = self.inputs();
        let generator = AnnualStackGenerator::new(inputs, options.clone());
        result.annual_stack = Some(generator.generate(
            &result.equipment_config,
            self.problem_type().grid_policy(),
        ));
        result
    }
}

/// Build the strategy for `problem_type` (1..=5).
pub fn create_optimizer(
    problem_type: u8,
    inputs: PlanningInputs,
    params: ProblemParams,
) -> PlanResult<Strategy> {
    let problem_type = ProblemType::try_from(problem_type)?;
    inputs.validate()?;
    let strategy = match problem_type {
        ProblemType::Greenfield => Strategy::Greenfield(inputs),
        ProblemType::Brownfield => Strategy::Brownfield(inputs, params.brownfield),
        ProblemType::LandDevelopment => Strategy::LandDevelopment(inputs),
        ProblemType::GridServices => {
            params.workload_mix.validate()?;
            Strategy::GridServices(inputs, params.workload_mix, params.dr)
        }
        ProblemType::BridgePower => Strategy::BridgePower(inputs, params.bridge),
    };
    Ok(strategy)
}

/// Fill the common result fields from a sized configuration.
pub(crate) fn assemble(
    inputs: &PlanningInputs,
    equipment: EquipmentConfiguration,
    breakdown: LcoeBreakdown,
    check: ConstraintCheck,
) -> OptimizationResult {
    let checker = inputs.checker();
    let calc = inputs.lcoe_calculator();
    let mut result = OptimizationResult {
        feasible: check.feasible(),
        lcoe: breakdown.lcoe,
        lcoe_unclamped: breakdown.lcoe_unclamped,
        capex_total: breakdown.capex_total,
        opex_annual: breakdown.opex_annual,
        timeline_months: checker.calculate_timeline(&equipment),
        unserved_energy_mwh: breakdown.unserved_energy_mwh,
        unserved_energy_pct: breakdown.unserved_energy_pct,
        energy_delivered_mwh: breakdown.energy_delivered_mwh,
        shadow_prices: checker.shadow_prices(&check, breakdown.lcoe),
        warnings: breakdown.warnings.clone(),
        ..OptimizationResult::default()
    };
    result.dispatch_summary.generation_share = breakdown.generation_shares();
    result.dispatch_summary.capacity_factors = calc.capacity_factors();
    result
        .dispatch_summary
        .set_metric("energy_required_mwh", breakdown.energy_required_mwh);
    result
        .dispatch_summary
        .set_metric("total_generation_mwh", breakdown.total_generation_mwh);
    result
        .dispatch_summary
        .set_metric("annualized_capex", breakdown.annualized_capex);
    result.equipment_config = equipment;
    result.binding_constraint = check.binding_constraint;
    result.violations = check.violations;
    result.constraint_status = check.status;
    result
}
