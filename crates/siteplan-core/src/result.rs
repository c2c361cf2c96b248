//! Optimization result record
//!
//! One record shape for every strategy and for the MILP, so callers can
//! compare runs without knowing which engine produced them. Infeasible runs
//! are ordinary records with `feasible = false` and a non-empty
//! `violations` list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Technology;
use crate::constraint::ConstraintStatus;
use crate::demand::{DrService, WorkloadClass};
use crate::equipment::EquipmentConfiguration;
use crate::stack::AnnualStack;

/// One flexibility level evaluated by land development.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexScenario {
    pub flexibility: f64,
    pub load_max_mw: f64,
    pub lcoe: f64,
}

/// Revenue from one DR product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRevenue {
    pub service: DrService,
    pub enrolled: bool,
    pub capacity_mw: f64,
    pub capacity_revenue: f64,
    pub activation_revenue: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeOption {
    AllRental,
    AllPurchase,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeScenario {
    pub option: BridgeOption,
    pub npv: f64,
}

/// Strategy-specific detail attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSummary {
    /// Named scalar metrics (energy, revenue, crossover month, ...)
    pub metrics: BTreeMap<String, f64>,
    /// Share of delivered energy per technology
    pub generation_share: BTreeMap<Technology, f64>,
    /// Annual capacity factors assumed per technology
    pub capacity_factors: BTreeMap<Technology, f64>,
    pub flex_scenarios: Vec<FlexScenario>,
    pub services: Vec<ServiceRevenue>,
    pub flexible_mw_by_class: BTreeMap<WorkloadClass, f64>,
    pub bridge_scenarios: Vec<BridgeScenario>,
    pub recommended: Option<BridgeOption>,
}

impl DispatchSummary {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn set_metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationResult {
    /// Engine that produced the record ("greenfield", "milp", ...)
    pub strategy: String,
    pub feasible: bool,
    pub objective_value: f64,
    /// LCOE after the sanity clamp ($/MWh)
    pub lcoe: f64,
    /// LCOE before the sanity clamp ($/MWh)
    pub lcoe_unclamped: f64,
    pub capex_total: f64,
    pub opex_annual: f64,
    pub equipment_config: EquipmentConfiguration,
    pub dispatch_summary: DispatchSummary,
    pub annual_stack: Option<AnnualStack>,
    pub constraint_status: BTreeMap<String, ConstraintStatus>,
    pub violations: Vec<String>,
    pub warnings: Vec<String>,
    pub timeline_months: u32,
    pub unserved_energy_mwh: f64,
    pub unserved_energy_pct: f64,
    pub energy_delivered_mwh: f64,
    pub solve_time_seconds: f64,
    pub binding_constraint: Option<String>,
    /// Indicative marginal values of binding constraints ($/unit)
    pub shadow_prices: BTreeMap<String, f64>,
}

impl OptimizationResult {
    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("{} result\n{}\n", self.strategy, "=".repeat(40)));
        s.push_str(&format!(
            "Status: {}\n",
            if self.feasible { "Feasible" } else { "Infeasible" }
        ));
        s.push_str(&format!("Objective: {:.2}\n", self.objective_value));
        s.push_str(&format!("LCOE: ${:.2}/MWh", self.lcoe));
        if (self.lcoe - self.lcoe_unclamped).abs() > 1e-9 {
            s.push_str(&format!(" (unclamped ${:.2}/MWh)", self.lcoe_unclamped));
        }
        s.push('\n');
        s.push_str(&format!("Capex: ${:.0}\n", self.capex_total));
        s.push_str(&format!("Opex: ${:.0}/yr\n", self.opex_annual));
        s.push_str(&format!(
            "Firm / total capacity: {:.1} / {:.1} MW\n",
            self.equipment_config.firm_capacity_mw, self.equipment_config.total_capacity_mw
        ));
        s.push_str(&format!("Timeline: {} months\n", self.timeline_months));
        if let Some(binding) = &self.binding_constraint {
            s.push_str(&format!("Binding constraint: {binding}\n"));
        }
        for v in &self.violations {
            s.push_str(&format!("  violation: {v}\n"));
        }
        for w in &self.warnings {
            s.push_str(&format!("  warning: {w}\n"));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_violations() {
        let result = OptimizationResult {
            strategy: "brownfield".into(),
            violations: vec!["LCOE ceiling already reached".into()],
            ..Default::default()
        };
        let text = result.summary();
        assert!(text.contains("Infeasible"));
        assert!(text.contains("LCOE ceiling already reached"));
    }

    #[test]
    fn test_record_field_names() {
        let value = serde_json::to_value(OptimizationResult::default()).unwrap();
        for key in [
            "feasible",
            "objective_value",
            "lcoe",
            "capex_total",
            "opex_annual",
            "equipment_config",
            "dispatch_summary",
            "constraint_status",
            "violations",
            "warnings",
            "timeline_months",
            "unserved_energy_mwh",
            "unserved_energy_pct",
            "solve_time_seconds",
            "binding_constraint",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
