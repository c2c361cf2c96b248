//! Grid services: value the facility's flexible load as demand response.
//!
//! Revenue is capacity payment for every hour enrolled plus energy payment
//! for the expected activations:
//!
//! ```text
//! eligible = eligible_fraction × Σ_class peak × share × flexibility
//! revenue  = eligible × $/MW-hr × 8760 + eligible × hours × $/MWh
//! ```

use siteplan_core::{
    DrConfig, EquipmentConfiguration, OptimizationResult, ServiceRevenue, WorkloadMix,
    HOURS_PER_YEAR,
};

use super::{assemble, PlanningInputs};
use crate::lcoe::LcoeBreakdown;
use crate::sizing::SizingRequest;
use crate::stack::energy_stack;

pub(super) fn optimize(
    inputs: &PlanningInputs,
    mix: &WorkloadMix,
    dr: &DrConfig,
) -> OptimizationResult {
    let peak = inputs.peak_mw();
    let tuning = &inputs.tuning;

    let by_class = mix.flexible_mw_by_class(peak);
    let flexible_mw: f64 = by_class.values().sum();
    let eligible = flexible_mw * tuning.eligible_flex_fraction;

    let services: Vec<ServiceRevenue> = dr
        .services
        .iter()
        .map(|&service| {
            let terms = dr.terms_for(service);
            let enrolled = eligible >= terms.min_capacity_mw && eligible > 0.0;
            let (capacity_revenue, activation_revenue) = if enrolled {
                (
                    eligible * terms.payment_per_mw_hr * HOURS_PER_YEAR,
                    eligible * terms.expected_hours * terms.activation_per_mwh,
                )
            } else {
                (0.0, 0.0)
            };
            ServiceRevenue {
                service,
                enrolled,
                capacity_mw: if enrolled { eligible } else { 0.0 },
                capacity_revenue,
                activation_revenue,
                total_revenue: capacity_revenue + activation_revenue,
            }
        })
        .collect();
    let total_revenue: f64 = services.iter().map(|s| s.total_revenue).sum();

    // Reference supply fleet; the strategy itself builds nothing. A ramping
    // trajectory grows it year by year and reports the blended LCOE.
    let (equipment, breakdown) = if inputs.load_trajectory.len() > 1 {
        let stack = energy_stack(
            inputs,
            &EquipmentConfiguration::default(),
            &SizingRequest::default(),
            tuning.greenfield_load_factor,
        );
        match stack.final_year() {
            Some(last) => {
                let mut breakdown = last.breakdown.clone();
                breakdown.lcoe = stack.blended.lcoe;
                breakdown.lcoe_unclamped = stack.blended.unclamped;
                breakdown.clamped = stack.blended.clamped;
                breakdown.warnings.extend(stack.blended.warnings.iter().cloned());
                breakdown.warnings.dedup();
                (last.equipment.clone(), breakdown)
            }
            None => reference_fleet(inputs, peak),
        }
    } else {
        reference_fleet(inputs, peak)
    };
    let blended_lcoe = breakdown.lcoe;
    let check = inputs.checker().check_constraints(&equipment, peak, true);

    let mut result = assemble(inputs, equipment, breakdown, check);
    // Breaches of the reference fleet are informational here.
    let breaches = std::mem::take(&mut result.violations);
    result.warnings.extend(breaches);
    result.feasible = true;
    result.capex_total = 0.0;
    result.opex_annual = 0.0;
    result.objective_value = total_revenue;

    if services.iter().all(|s| !s.enrolled) {
        result
            .warnings
            .push(format!("Eligible flexibility {eligible:.2} MW is below every service minimum"));
    }

    let summary = &mut result.dispatch_summary;
    summary.set_metric("flexible_mw", flexible_mw);
    summary.set_metric("eligible_mw", eligible);
    summary.set_metric("total_revenue", total_revenue);
    summary.set_metric("blended_lcoe", blended_lcoe);
    summary.flexible_mw_by_class = by_class;
    summary.services = services;
    result
}

fn reference_fleet(inputs: &PlanningInputs, peak: f64) -> (EquipmentConfiguration, LcoeBreakdown) {
    let equipment = inputs.sizer().size_equipment_to_load(&SizingRequest::new(peak));
    let required = peak * HOURS_PER_YEAR * inputs.tuning.greenfield_load_factor;
    let breakdown = inputs.lcoe_calculator().calculate_lcoe(&equipment, required);
    (equipment, breakdown)
}
