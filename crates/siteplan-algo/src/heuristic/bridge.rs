//! Bridge power: carry the load until the grid arrives, renting or buying.
//!
//! ```text
//! mr            = discount / 12
//! rental NPV    = Σ_{m<M} peak_kW × rent / (1+mr)^m
//! purchase NPV  = capex + Σ_{m<M} (opex/12) / (1+mr)^m − residual / (1+mr)^M
//! crossover     = (capex − residual) / (rent_monthly − opex_monthly)
//! ```

use serde::{Deserialize, Serialize};

use siteplan_core::{BridgeOption, BridgeScenario, OptimizationResult, HOURS_PER_YEAR};

use super::{assemble, PlanningInputs};
use crate::sizing::SizingRequest;

/// Reported when renting never pays back a purchase.
pub const NO_CROSSOVER_MONTHS: f64 = 999.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeParams {
    /// Months until grid power replaces the bridge fleet
    pub transition_months: u32,
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self {
            transition_months: 60,
        }
    }
}

/// Present value of a level monthly payment over `months` months.
fn annuity(payment: f64, rate: f64, months: u32) -> f64 {
    (0..months)
        .map(|m| payment / (1.0 + rate).powi(m as i32))
        .sum()
}

pub(super) fn optimize(inputs: &PlanningInputs, params: &BridgeParams) -> OptimizationResult {
    let peak = inputs.peak_mw();
    let economics = &inputs.economics;
    let months = params.transition_months;
    let mr = economics.monthly_rate();

    let equipment = inputs.sizer().size_equipment_to_load(&SizingRequest::new(peak));
    let required = peak * HOURS_PER_YEAR * inputs.tuning.greenfield_load_factor;
    let breakdown = inputs.lcoe_calculator().calculate_lcoe(&equipment, required);
    let check = inputs.checker().check_constraints(&equipment, peak, true);

    let rent_monthly = peak * 1000.0 * economics.rental_cost_kw_month;
    let opex_monthly = breakdown.opex_annual / 12.0;
    let capex = breakdown.capex_total;
    let residual = capex * economics.residual_value_pct;

    let rental_npv = annuity(rent_monthly, mr, months);
    let purchase_npv =
        capex + annuity(opex_monthly, mr, months) - residual / (1.0 + mr).powi(months as i32);
    let hybrid_npv = rental_npv.min(purchase_npv);

    let scenarios = vec![
        BridgeScenario {
            option: BridgeOption::AllRental,
            npv: rental_npv,
        },
        BridgeScenario {
            option: BridgeOption::AllPurchase,
            npv: purchase_npv,
        },
        BridgeScenario {
            option: BridgeOption::Hybrid,
            npv: hybrid_npv,
        },
    ];
    // First minimum wins, so a tie never recommends the hybrid.
    let recommended = scenarios
        .iter()
        .fold(&scenarios[0], |best, s| if s.npv < best.npv { s } else { best })
        .clone();

    let denominator = rent_monthly - opex_monthly;
    let crossover = if denominator <= 0.0 {
        NO_CROSSOVER_MONTHS
    } else {
        (capex - residual) / denominator
    };

    let mut result = assemble(inputs, equipment, breakdown, check);
    let breaches = std::mem::take(&mut result.violations);
    result.warnings.extend(breaches);
    result.warnings.push("Transition timing is indicative only".to_string());
    result.feasible = true;
    result.objective_value = recommended.npv;
    if recommended.option != BridgeOption::AllPurchase {
        result.capex_total = 0.0;
    }
    // A rented fleet carries no owner O&M; rent is already in the NPV.
    if recommended.option == BridgeOption::AllRental {
        result.opex_annual = 0.0;
    }
    result.timeline_months = months;

    let summary = &mut result.dispatch_summary;
    summary.set_metric("rental_npv", rental_npv);
    summary.set_metric("purchase_npv", purchase_npv);
    summary.set_metric("crossover_months", crossover);
    summary.recommended = Some(recommended.option);
    summary.bridge_scenarios = scenarios;
    result
}
