//! Capacity expansion solution data structures
//!
//! A solved model yields one [`YearPlan`] per planning year. The solution
//! converts into the same [`OptimizationResult`] record the heuristics
//! produce, using the final year's fleet as the headline configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use siteplan_core::{
    AnnualStack, ConstraintStatus, DrService, EquipmentConfiguration, GridPolicy,
    OptimizationResult, StackYear, Technology,
};

/// How the solver run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    Optimal,
    /// Stopped once the relative MIP gap fell under the requested tolerance.
    GapLimit,
    /// Stopped on the wall-clock limit. Years hold the best incumbent, if
    /// the backend found one.
    TimeLimit,
    Infeasible,
    Unbounded,
    SolverError,
}

impl TerminationStatus {
    /// Optimal, or optimal within the requested gap.
    pub fn is_optimal(&self) -> bool {
        matches!(self, TerminationStatus::Optimal | TerminationStatus::GapLimit)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationStatus::Optimal => "optimal",
            TerminationStatus::GapLimit => "gap_limit",
            TerminationStatus::TimeLimit => "time_limit",
            TerminationStatus::Infeasible => "infeasible",
            TerminationStatus::Unbounded => "unbounded",
            TerminationStatus::SolverError => "solver_error",
        }
    }
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build and operation for one planning year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearPlan {
    pub year: i32,
    /// Peak facility load (MW)
    pub load_mw: f64,
    pub equipment: EquipmentConfiguration,
    pub grid_active: bool,
    pub energy_required_mwh: f64,
    pub energy_served_mwh: f64,
    /// Served share of required energy (%)
    pub coverage_pct: f64,
    pub unserved_mwh: f64,
    pub generation_mwh: BTreeMap<Technology, f64>,
    pub nox_tpy: f64,
    pub gas_mcf_day: f64,
    pub curtailment_mwh: f64,
    pub dr_capacity_mw: BTreeMap<DrService, f64>,
    pub dr_revenue: f64,
    /// Annualized capex plus operating cost, net of DR revenue ($)
    pub annual_cost: f64,
    pub opex: f64,
    pub lcoe: f64,
}

/// Complete solution to a capacity expansion problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionSolution {
    pub status: TerminationStatus,
    /// Backend that produced the solution
    pub solver: String,
    /// Unit counts came from an LP relaxation and were rounded up
    pub relaxed: bool,
    pub message: String,
    /// Objective: discounted cost over discounted required energy ($/MWh)
    pub lcoe: f64,
    /// Undiscounted capex of everything built beyond the existing fleet
    pub capex_total: f64,
    pub years: Vec<YearPlan>,
    pub grid_year: i32,
    /// Final-year status of the site caps
    pub constraint_status: BTreeMap<String, ConstraintStatus>,
    pub shadow_prices: BTreeMap<String, f64>,
    pub violations: Vec<String>,
    pub warnings: Vec<String>,
    pub timeline_months: u32,
    pub solve_time_seconds: f64,
}

impl ExpansionSolution {
    /// Empty solution carrying a termination status; every numeric field is
    /// zero.
    pub fn new(status: TerminationStatus, solver: impl Into<String>) -> Self {
        Self {
            status,
            solver: solver.into(),
            relaxed: false,
            message: String::new(),
            lcoe: 0.0,
            capex_total: 0.0,
            years: Vec::new(),
            grid_year: 0,
            constraint_status: BTreeMap::new(),
            shadow_prices: BTreeMap::new(),
            violations: Vec::new(),
            warnings: Vec::new(),
            timeline_months: 0,
            solve_time_seconds: 0.0,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    pub fn final_year(&self) -> Option<&YearPlan> {
        self.years.last()
    }

    pub fn year(&self, year: i32) -> Option<&YearPlan> {
        self.years.iter().find(|p| p.year == year)
    }

    /// Unit counts never decrease from one year to the next.
    pub fn units_non_decreasing(&self) -> bool {
        self.years.windows(2).all(|w| {
            w[1].equipment.n_recip >= w[0].equipment.n_recip
                && w[1].equipment.n_turbine >= w[0].equipment.n_turbine
        })
    }

    pub fn total_unserved_mwh(&self) -> f64 {
        self.years.iter().map(|p| p.unserved_mwh).sum()
    }

    pub fn total_required_mwh(&self) -> f64 {
        self.years.iter().map(|p| p.energy_required_mwh).sum()
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!(
            "Capacity Expansion Solution\n{}\n",
            "=".repeat(40)
        ));
        s.push_str(&format!("Status: {} ({})\n", self.status, self.solver));
        if !self.message.is_empty() {
            s.push_str(&format!("Message: {}\n", self.message));
        }
        s.push_str(&format!("LCOE: ${:.2}/MWh\n", self.lcoe));
        s.push_str(&format!("Capex: ${:.0}\n", self.capex_total));
        s.push_str(&format!("Grid year: {}\n", self.grid_year));
        s.push_str(&format!("Solve time: {:.2}s\n", self.solve_time_seconds));
        if self.relaxed {
            s.push_str("Unit counts rounded up from LP relaxation\n");
        }
        if !self.years.is_empty() {
            s.push_str("\nYear  Load   Recip  Turb  Solar   BESS    Grid   Cover\n");
            for p in &self.years {
                let e = &p.equipment;
                s.push_str(&format!(
                    "{}  {:>5.0}  {:>5}  {:>4}  {:>5.0}  {:>5.0}  {:>6.0}  {:>5.1}%\n",
                    p.year,
                    p.load_mw,
                    e.n_recip,
                    e.n_turbine,
                    e.solar_mw,
                    e.bess_mwh,
                    e.grid_mw,
                    p.coverage_pct
                ));
            }
        }
        for v in &self.violations {
            s.push_str(&format!("  violation: {v}\n"));
        }
        s
    }
}

impl From<ExpansionSolution> for OptimizationResult {
    fn from(solution: ExpansionSolution) -> Self {
        let mut result = OptimizationResult {
            strategy: "capacity_expansion".to_string(),
            solve_time_seconds: solution.solve_time_seconds,
            warnings: solution.warnings.clone(),
            ..OptimizationResult::default()
        };
        result
            .dispatch_summary
            .set_metric("termination_ok", if solution.is_optimal() { 1.0 } else { 0.0 });

        if !solution.is_optimal() {
            result
                .violations
                .push(format!("Solver terminated: {}", solution.status));
            if !solution.message.is_empty() {
                result.warnings.push(solution.message.clone());
            }
            return result;
        }

        let required = solution.total_required_mwh();
        let unserved = solution.total_unserved_mwh();
        let stack_years = solution
            .years
            .iter()
            .map(|p| StackYear {
                year: p.year,
                load_mw: p.load_mw,
                equipment: p.equipment.clone(),
                lcoe: p.lcoe,
                grid_available: p.grid_active,
            })
            .collect();
        let base_year = solution.years.first().map(|p| p.year).unwrap_or_default();

        if let Some(last) = solution.final_year() {
            let total: f64 = last.generation_mwh.values().sum();
            if total > 0.0 {
                result.dispatch_summary.generation_share = last
                    .generation_mwh
                    .iter()
                    .map(|(tech, mwh)| (*tech, mwh / total))
                    .collect();
            }
            result.equipment_config = last.equipment.clone();
            result.opex_annual = last.opex;
            result
                .dispatch_summary
                .set_metric("final_year_dr_revenue", last.dr_revenue);
            result
                .dispatch_summary
                .set_metric("final_year_curtailment_mwh", last.curtailment_mwh);
        }

        result.feasible = solution.violations.is_empty();
        result.objective_value = solution.lcoe;
        result.lcoe = solution.lcoe;
        result.lcoe_unclamped = solution.lcoe;
        result.capex_total = solution.capex_total;
        result.timeline_months = solution.timeline_months;
        result.unserved_energy_mwh = unserved;
        result.unserved_energy_pct = if required > 0.0 {
            unserved / required * 100.0
        } else {
            0.0
        };
        result.energy_delivered_mwh = required - unserved;
        result.binding_constraint = solution
            .constraint_status
            .values()
            .filter(|s| s.binding)
            .max_by(|a, b| a.utilization.total_cmp(&b.utilization))
            .map(|s| s.name.clone());
        result.annual_stack = Some(AnnualStack {
            base_year,
            grid_year: solution.grid_year,
            policy: GridPolicy::Supplement,
            years: stack_years,
        });
        result.constraint_status = solution.constraint_status;
        result.shadow_prices = solution.shadow_prices;
        result.violations = solution.violations;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(year: i32, n_recip: u32, required: f64, unserved: f64) -> YearPlan {
        YearPlan {
            year,
            equipment: EquipmentConfiguration {
                n_recip,
                recip_mw: n_recip as f64 * 5.0,
                ..EquipmentConfiguration::default()
            },
            energy_required_mwh: required,
            unserved_mwh: unserved,
            ..YearPlan::default()
        }
    }

    #[test]
    fn test_non_optimal_converts_to_zeroed_result() {
        let solution = ExpansionSolution::new(TerminationStatus::Infeasible, "highs");
        let result: OptimizationResult = solution.into();
        assert!(!result.feasible);
        assert_eq!(result.lcoe, 0.0);
        assert_eq!(result.capex_total, 0.0);
        assert_eq!(result.violations, vec!["Solver terminated: infeasible"]);
        assert!(result.annual_stack.is_none());
    }

    #[test]
    fn test_optimal_converts_with_stack() {
        let mut solution = ExpansionSolution::new(TerminationStatus::Optimal, "clarabel");
        solution.lcoe = 95.0;
        solution.grid_year = 2030;
        solution.years = vec![plan(2027, 4, 1000.0, 10.0), plan(2028, 6, 1000.0, 0.0)];
        assert!(solution.units_non_decreasing());
        let result: OptimizationResult = solution.into();
        assert!(result.feasible);
        assert_eq!(result.equipment_config.n_recip, 6);
        assert!((result.unserved_energy_pct - 0.5).abs() < 1e-9);
        let stack = result.annual_stack.unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.grid_year, 2030);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let solution = ExpansionSolution::new(TerminationStatus::SolverError, "cbc");
        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["status"], "solver_error");
        assert_eq!(json["solver"], "cbc");
    }

    #[test]
    fn test_decreasing_units_detected() {
        let mut solution = ExpansionSolution::new(TerminationStatus::Optimal, "highs");
        solution.years = vec![plan(2027, 6, 1.0, 0.0), plan(2028, 4, 1.0, 0.0)];
        assert!(!solution.units_non_decreasing());
        assert!(solution.summary().contains("2028"));
    }
}
