//! Constraint checks shared by every heuristic strategy.
//!
//! Checks run against the *final* configuration. Emissions and fuel use are
//! estimated at the limit capacity factor, the same basis the ceilings in
//! [`crate::limits`] use, so a fleet sized to a ceiling checks as binding
//! rather than violated.

use std::collections::BTreeMap;

use siteplan_core::{
    ConstraintKind, ConstraintStatus, EquipmentCatalog, EquipmentConfiguration, HeuristicTuning,
    SiteConstraints, ThermalSpec, HOURS_PER_YEAR, LB_PER_TON,
};

pub const NOX: &str = "nox_tpy";
pub const GAS: &str = "gas_mcf_day";
pub const LAND: &str = "land_acres";
pub const FIRM: &str = "firm_capacity";
pub const N_MINUS_1: &str = "n_minus_1";

/// Outcome of [`ConstraintChecker::check_constraints`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintCheck {
    pub status: BTreeMap<String, ConstraintStatus>,
    pub violations: Vec<String>,
    /// Most-utilized constraint
    pub binding_constraint: Option<String>,
}

impl ConstraintCheck {
    pub fn feasible(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn is_binding(&self, name: &str) -> bool {
        self.status.get(name).is_some_and(|s| s.binding)
    }
}

pub struct ConstraintChecker<'a> {
    catalog: &'a EquipmentCatalog,
    constraints: &'a SiteConstraints,
    tuning: &'a HeuristicTuning,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(
        catalog: &'a EquipmentCatalog,
        constraints: &'a SiteConstraints,
        tuning: &'a HeuristicTuning,
    ) -> Self {
        Self {
            catalog,
            constraints,
            tuning,
        }
    }

    fn thermal_fleet(&self, eq: &EquipmentConfiguration) -> [(f64, &ThermalSpec); 2] {
        [
            (eq.recip_mw, &self.catalog.recip),
            (eq.turbine_mw, &self.catalog.turbine),
        ]
    }

    /// Annual NOx (short tons) at the limit capacity factor.
    pub fn annual_nox_tpy(&self, eq: &EquipmentConfiguration) -> f64 {
        let cf = self.tuning.limit_capacity_factor;
        self.thermal_fleet(eq)
            .iter()
            .map(|(mw, spec)| mw * cf * HOURS_PER_YEAR * spec.nox_lb_per_mwh() / LB_PER_TON)
            .sum()
    }

    /// Average daily gas burn (MCF/day) at the limit capacity factor.
    pub fn gas_mcf_day(&self, eq: &EquipmentConfiguration) -> f64 {
        let cf = self.tuning.limit_capacity_factor;
        self.thermal_fleet(eq)
            .iter()
            .map(|(mw, spec)| mw * cf * 24.0 * spec.mcf_per_mwh())
            .sum()
    }

    /// Check `eq` against every site cap and against `peak_mw` of load.
    pub fn check_constraints(
        &self,
        eq: &EquipmentConfiguration,
        peak_mw: f64,
        require_n1: bool,
    ) -> ConstraintCheck {
        let thresholds = self.tuning.status_thresholds();
        let c = self.constraints;
        let mut status = BTreeMap::new();

        let nox = self.annual_nox_tpy(eq);
        let gas = self.gas_mcf_day(eq);
        let required_firm = if require_n1 {
            peak_mw * c.reserve_factor()
        } else {
            peak_mw
        };

        let mut entries = vec![
            (NOX, "tpy", nox, c.nox_tpy, ConstraintKind::Hard),
            (GAS, "MCF/day", gas, c.gas_mcf_day, ConstraintKind::Soft),
            (LAND, "acres", eq.land_used_acres, c.land_acres, ConstraintKind::Soft),
            (FIRM, "MW", required_firm, eq.firm_capacity_mw, ConstraintKind::Hard),
        ];
        // Grid-backed sites do not carry the loss-of-largest-unit test.
        if require_n1 && eq.grid_mw <= 0.0 {
            let n1_capacity = eq.firm_capacity_mw - eq.largest_unit_mw(self.catalog);
            entries.push((N_MINUS_1, "MW", peak_mw, n1_capacity.max(0.0), ConstraintKind::Hard));
        }

        let mut violations = Vec::new();
        for (name, unit, value, limit, kind) in entries {
            let s = ConstraintStatus::evaluate(name, unit, value, limit, kind, thresholds);
            if s.violated {
                violations.push(violation_message(&s));
            }
            status.insert(name.to_string(), s);
        }

        let binding_constraint = status
            .values()
            .filter(|s| s.limit > 0.0 || s.value > 0.0)
            .max_by(|a, b| a.utilization.total_cmp(&b.utilization))
            .map(|s| s.name.clone());

        ConstraintCheck {
            status,
            violations,
            binding_constraint,
        }
    }

    /// Months until the slowest installed technology is online.
    pub fn calculate_timeline(&self, eq: &EquipmentConfiguration) -> u32 {
        eq.installed_technologies()
            .into_iter()
            .map(|t| self.catalog.lead_time_months(t))
            .max()
            .unwrap_or(0)
    }

    /// Indicative marginal values for binding emissions, fuel and land caps.
    ///
    /// Rule-of-thumb multiples of LCOE, not duals.
    pub fn shadow_prices(&self, check: &ConstraintCheck, lcoe: f64) -> BTreeMap<String, f64> {
        let energy_basis = lcoe * HOURS_PER_YEAR * self.tuning.recip_capacity_factor / 1000.0;
        let mut prices = BTreeMap::new();
        if check.is_binding(NOX) {
            prices.insert(NOX.to_string(), 3.0 * energy_basis);
        }
        if check.is_binding(GAS) {
            prices.insert(GAS.to_string(), 0.005 * energy_basis);
        }
        if check.is_binding(LAND) && self.catalog.solar.land_acres_per_mw > 0.0 {
            // Energy one more acre of solar would deliver, valued at LCOE.
            let mw_per_acre = 1.0 / self.catalog.solar.land_acres_per_mw;
            let mwh = mw_per_acre * self.catalog.solar.capacity_factor * HOURS_PER_YEAR;
            prices.insert(LAND.to_string(), mwh * lcoe);
        }
        prices
    }
}

fn violation_message(s: &ConstraintStatus) -> String {
    match s.name.as_str() {
        NOX => format!("NOx: {:.1} tpy exceeds limit of {:.1} tpy", s.value, s.limit),
        GAS => format!("Gas: {:.0} MCF/day exceeds limit of {:.0} MCF/day", s.value, s.limit),
        LAND => format!("Land: {:.1} acres exceeds limit of {:.1} acres", s.value, s.limit),
        FIRM => format!(
            "Firm capacity: {:.1} MW installed is below {:.1} MW required",
            s.limit, s.value
        ),
        N_MINUS_1 => format!(
            "N-1: {:.1} MW capacity after loss of largest unit < {:.1} MW load",
            s.limit, s.value
        ),
        other => format!("{other}: {:.2} {} exceeds limit of {:.2}", s.value, s.unit, s.limit),
    }
}
