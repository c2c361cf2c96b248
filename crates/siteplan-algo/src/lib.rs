//! # siteplan-algo: On-site Power Planning Engines
//!
//! Sizing, costing and optimization for behind-the-meter power at large
//! facilities. Two engines share one result record
//! ([`siteplan_core::OptimizationResult`]):
//!
//! ## Heuristic Planners
//!
//! The [`heuristic`] module runs a closed-form planner per site archetype:
//!
//! | Problem | Objective |
//! |---------|-----------|
//! | [`ProblemType::Greenfield`] | Minimum LCOE fleet for a new site |
//! | [`ProblemType::Brownfield`] | Largest addition under an LCOE ceiling |
//! | [`ProblemType::LandDevelopment`] | Most thermal capacity the site caps allow |
//! | [`ProblemType::GridServices`] | Demand-response revenue from flexible load |
//! | [`ProblemType::BridgePower`] | Rent vs. buy until the grid arrives |
//!
//! Each planner is built from the same components:
//!
//! - [`EquipmentSizer`]: thermal/BESS/solar mix for a target load
//! - [`LcoeCalculator`]: capex, opex and levelized cost
//! - [`ConstraintChecker`]: NOx, gas, land, firm capacity and N-1
//! - [`ConstraintLimitCalculator`]: largest fleet each cap allows
//! - [`AnnualStackGenerator`]: year-by-year fleet around the grid year
//!
//! ## Capacity Expansion
//!
//! [`CapacityExpansionModel`] solves a multi-year MILP over representative
//! weeks using `good_lp` (HiGHS, CBC or Clarabel).
//!
//! ## Example
//!
//! ```no_run
//! use siteplan_algo::heuristic::{create_optimizer, PlanningInputs, ProblemParams};
//! use siteplan_core::{LoadTrajectory, SiteConstraints};
//!
//! let inputs = PlanningInputs::new(
//!     LoadTrajectory::flat(2027, 200.0).with_year(2030, 600.0),
//!     SiteConstraints::default(),
//! );
//! let planner = create_optimizer(1, inputs, ProblemParams::default())?;
//! let result = planner.optimize();
//! println!("LCOE: ${:.2}/MWh", result.lcoe);
//! # Ok::<(), siteplan_core::PlanError>(())
//! ```

pub mod constraints;
pub mod expansion;
pub mod heuristic;
pub mod lcoe;
pub mod limits;
pub mod sizing;
pub mod stack;

pub use constraints::{ConstraintCheck, ConstraintChecker};
pub use expansion::{
    CapacityExpansionModel, ExpansionInputs, ExpansionSolution, SolveOptions, SolverKind,
    TerminationStatus, YearPlan,
};
pub use heuristic::{create_optimizer, PlanningInputs, ProblemParams, ProblemType, Strategy};
pub use lcoe::{LcoeBreakdown, LcoeCalculator};
pub use limits::ConstraintLimitCalculator;
pub use sizing::{EquipmentSizer, SizingRequest};
pub use stack::{energy_stack, AnnualStackGenerator, EnergyStack, EnergyYear, StackOptions};
