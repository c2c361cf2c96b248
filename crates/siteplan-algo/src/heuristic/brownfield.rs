//! Brownfield: add capacity to an existing fleet without pushing the blended
//! LCOE past a ceiling.

use serde::{Deserialize, Serialize};

use siteplan_core::{
    ConstraintKind, ConstraintStatus, EquipmentConfiguration, OptimizationResult, HOURS_PER_YEAR,
};

use super::{assemble, PlanningInputs};
use crate::lcoe::LcoeBreakdown;
use crate::sizing::SizingRequest;
use crate::stack::energy_stack;

pub const LCOE_CEILING: &str = "lcoe_ceiling";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrownfieldParams {
    /// Fleet already on site
    pub existing: EquipmentConfiguration,
    /// LCOE of the existing fleet ($/MWh)
    pub existing_lcoe: f64,
    /// Blended LCOE the expansion may not exceed ($/MWh)
    pub lcoe_threshold: f64,
}

impl Default for BrownfieldParams {
    fn default() -> Self {
        Self {
            existing: EquipmentConfiguration::default(),
            existing_lcoe: 80.0,
            lcoe_threshold: 120.0,
        }
    }
}

pub(super) fn optimize(inputs: &PlanningInputs, params: &BrownfieldParams) -> OptimizationResult {
    let catalog = &inputs.catalog;
    let thresholds = inputs.tuning.status_thresholds();
    let mut existing = params.existing.clone();
    existing.refresh(catalog);

    if params.lcoe_threshold - params.existing_lcoe <= 0.0 {
        let status = ConstraintStatus::evaluate(
            LCOE_CEILING,
            "$/MWh",
            params.existing_lcoe,
            params.lcoe_threshold,
            ConstraintKind::Hard,
            thresholds,
        );
        return OptimizationResult {
            feasible: false,
            objective_value: 0.0,
            lcoe: params.existing_lcoe,
            lcoe_unclamped: params.existing_lcoe,
            capex_total: 0.0,
            equipment_config: existing,
            constraint_status: [(LCOE_CEILING.to_string(), status)].into_iter().collect(),
            violations: vec!["LCOE ceiling already reached".to_string()],
            warnings: vec!["No expansion possible".to_string()],
            binding_constraint: Some(LCOE_CEILING.to_string()),
            ..OptimizationResult::default()
        };
    }

    let peak = inputs.peak_mw();
    let existing_mw = existing.firm_capacity_mw;
    let load_factor = inputs.tuning.expansion_load_factor;

    // A ramping trajectory grows the fleet year by year and is judged on the
    // blended LCOE across all years; a single year takes half the gap.
    let (combined, mut breakdown, addition_target) = if inputs.load_trajectory.len() > 1 {
        let request = SizingRequest::default().without_n1();
        let stack = energy_stack(inputs, &existing, &request, load_factor);
        match stack.final_year() {
            Some(last) => {
                let mut breakdown = last.breakdown.clone();
                breakdown.lcoe = stack.blended.lcoe;
                breakdown.lcoe_unclamped = stack.blended.unclamped;
                breakdown.clamped = stack.blended.clamped;
                breakdown.warnings.extend(stack.blended.warnings.iter().cloned());
                (last.equipment.clone(), breakdown, (peak - existing_mw).max(0.0))
            }
            None => single_year(inputs, &existing, peak, load_factor),
        }
    } else {
        single_year(inputs, &existing, peak, load_factor)
    };
    let added_mw = (combined.firm_capacity_mw - existing_mw).max(0.0);

    let mut check = inputs
        .checker()
        .check_constraints(&combined, combined.firm_capacity_mw, false);

    let ceiling = ConstraintStatus::evaluate(
        LCOE_CEILING,
        "$/MWh",
        breakdown.lcoe,
        params.lcoe_threshold,
        ConstraintKind::Hard,
        thresholds,
    );
    if breakdown.lcoe > params.lcoe_threshold {
        check.violations.push(format!(
            "LCOE: ${:.2}/MWh exceeds ceiling of ${:.2}/MWh",
            breakdown.lcoe, params.lcoe_threshold
        ));
    }
    check.status.insert(LCOE_CEILING.to_string(), ceiling);
    let blended_lcoe = breakdown.lcoe;
    breakdown.warnings.dedup();

    let mut result = assemble(inputs, combined, breakdown, check);
    if addition_target <= 0.0 {
        result
            .warnings
            .push("Existing fleet already covers peak load".to_string());
    }
    result.feasible = result.lcoe <= params.lcoe_threshold && result.violations.is_empty();
    result.objective_value = added_mw;
    result.dispatch_summary.set_metric("existing_mw", existing_mw);
    result.dispatch_summary.set_metric("added_mw", added_mw);
    result.dispatch_summary.set_metric("blended_lcoe", blended_lcoe);
    result
        .dispatch_summary
        .set_metric("lcoe_threshold", params.lcoe_threshold);
    result
}

fn single_year(
    inputs: &PlanningInputs,
    existing: &EquipmentConfiguration,
    peak: f64,
    load_factor: f64,
) -> (EquipmentConfiguration, LcoeBreakdown, f64) {
    let addition_target = (peak * inputs.tuning.brownfield_expansion_fraction)
        .min(peak - existing.firm_capacity_mw)
        .max(0.0);
    let addition = inputs
        .sizer()
        .size_equipment_to_load(&SizingRequest::new(addition_target).without_n1());
    let combined = existing.merged_with(&addition, &inputs.catalog);
    let breakdown = inputs
        .lcoe_calculator()
        .calculate_lcoe(&combined, peak * HOURS_PER_YEAR * load_factor);
    (combined, breakdown, addition_target)
}
