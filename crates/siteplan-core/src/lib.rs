//! # siteplan-core: On-site Power Planning Data Model
//!
//! Data structures shared by the heuristic planners, the capacity-expansion
//! MILP and the CLI.
//!
//! ## Design Philosophy
//!
//! Inputs are plain serde structs with documented defaults, so a run file
//! only needs to name what differs from them:
//! - **Catalog**: per-technology cost, emissions and footprint data
//! - **Site constraints**: emissions, fuel and land caps plus reserve policy
//! - **Load trajectory**: year → peak facility MW
//!
//! Outputs share one record, [`OptimizationResult`], whichever engine made
//! them. Infeasibility is data inside that record; [`PlanError`] is reserved
//! for inputs the engines cannot work with at all.
//!
//! ## Quick Start
//!
//! ```rust
//! use siteplan_core::*;
//!
//! let catalog = EquipmentCatalog::default();
//! let config = EquipmentConfiguration::from_units(&catalog, 98, 10, 0.0, 60.0, 240.0, 0.0);
//! assert_eq!(config.firm_capacity_mw, 690.0);
//! assert!(config.firm_capacity_mw <= config.total_capacity_mw);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Technology parameters
//! - [`constraint`] - Constraint status records
//! - [`demand`] - Workload flexibility and DR products
//! - [`equipment`] - Installed equipment and capacity aggregates
//! - [`result`] - The unified result record
//! - [`stack`] - Year-by-year deployment records

pub mod catalog;
pub mod constraint;
pub mod demand;
pub mod economics;
pub mod equipment;
pub mod error;
pub mod load;
pub mod result;
pub mod site;
pub mod stack;
pub mod tuning;

pub use catalog::{
    BatterySpec, EquipmentCatalog, GridSpec, SolarSpec, Technology, ThermalSpec,
    GAS_HHV_BTU_PER_MCF, HOURS_PER_YEAR, LB_PER_TON,
};
pub use constraint::{ConstraintKind, ConstraintState, ConstraintStatus, StatusThresholds};
pub use demand::{DrConfig, DrService, DrTerms, WorkloadClass, WorkloadMix};
pub use economics::EconomicParams;
pub use equipment::EquipmentConfiguration;
pub use error::{PlanError, PlanResult};
pub use load::{synthetic_profile, LoadPoint, LoadTrajectory};
pub use result::{
    BridgeOption, BridgeScenario, DispatchSummary, FlexScenario, OptimizationResult,
    ServiceRevenue,
};
pub use site::{Site, SiteConstraints};
pub use stack::{AnnualStack, GridPolicy, StackYear};
pub use tuning::HeuristicTuning;
