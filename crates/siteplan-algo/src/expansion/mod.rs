//! Multi-year Capacity Expansion
//!
//! This module implements a Mixed-Integer Linear Programming (MILP)
//! formulation that decides, year by year, how many generating units, how
//! much storage and solar, and how much grid import a site installs.
//!
//! ## Problem Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CAPACITY EXPANSION                                                      │
//! │  ──────────────────                                                      │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Peak load per planning year and an hourly load shape               │
//! │    • Technology catalog (cost, heat rate, emissions, footprint)         │
//! │    • Site caps (NOx, gas, land) and a grid arrival year                 │
//! │    • Optional existing fleet and demand-response products               │
//! │                                                                          │
//! │  Decide (per year):                                                      │
//! │    • Recip and turbine unit counts (integer)                            │
//! │    • BESS energy/power, solar MW, grid import MW                        │
//! │    • Hourly dispatch, storage state and workload curtailment            │
//! │                                                                          │
//! │  Minimize:                                                               │
//! │    Discounted cost / discounted required energy ($/MWh)                 │
//! │                                                                          │
//! │  Subject to:                                                             │
//! │    • Hourly energy balance over three representative weeks              │
//! │    • Non-decreasing capacity, no grid before the grid year              │
//! │    • Annual NOx, gas and land caps                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## MILP Formulation
//!
//! ```text
//! minimize  Σ_y df_y · [ CRF·capex(new_y) + FOM_y + Σ_t w_t·c·P_t
//!                        + VOLL·Σ_t w_t·U_t − DR_y·8760·pay ]  /  Σ_y df_y·E_y
//!
//! subject to, for every year y and sampled hour t:
//!   Σ P_t + U_t + C_t − ch_t + dis_t = L_t          Energy balance
//!   P_recip,t ≤ N_recip · unit · avail              Dispatch limits
//!   soc_t = soc_{t−1} + η·ch_t − dis_t/η            Storage (resets each week)
//!   0.1·E_bess ≤ soc_t ≤ E_bess
//!   C_t ≤ 0.15·L_t,  Σ w_t·C_t ≤ 0.01·E_y            Curtailment
//!   G_y ≤ M · x_y,   x_y = 0 before the grid year    Grid gating (Big-M)
//!   N_y ≥ N_{y−1}, E_y ≥ E_{y−1}, …                  Capacity only grows
//!   Σ w_t·NOx(P_t) ≤ cap,  Σ w_t·gas(P_t) ≤ cap      Annual site caps
//! ```
//!
//! Hours are sampled from three weeks (summer peak, winter, spring) with
//! weights 20, 20 and 12, so one modeled year covers 52 weeks.
//!
//! ## Solvers
//!
//! HiGHS is preferred, then CBC, then Clarabel. Clarabel has no integer
//! support: the LP relaxation is solved and unit counts are rounded up, and
//! the solution is flagged `relaxed`.

mod problem;
mod solution;
mod solver;

pub use problem::{
    representative_hours, solar_availability, CurtailmentShares, ExpansionInputs,
    ExpansionLimits, ExpansionProblem, GridConnection, RepresentativeWeek, SampledHour,
    DEFAULT_GRID_LEAD_MONTHS, HOURS_PER_WEEK, PEAK_HOURS, REPRESENTATIVE_WEEKS,
};
pub use solution::{ExpansionSolution, TerminationStatus, YearPlan};
pub use solver::{CapacityExpansionModel, SolveOptions, SolverKind};
