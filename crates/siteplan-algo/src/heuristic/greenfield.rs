//! Greenfield: new site, minimize LCOE.

use siteplan_core::{OptimizationResult, HOURS_PER_YEAR};

use super::{assemble, PlanningInputs};
use crate::sizing::SizingRequest;

pub(super) fn optimize(inputs: &PlanningInputs) -> OptimizationResult {
    let peak = inputs.peak_mw();
    let require_n1 = inputs.constraints.n_minus_1_required;

    let mut request = SizingRequest::new(peak);
    request.require_n1 = require_n1;
    let equipment = inputs.sizer().size_equipment_to_load(&request);

    let required = peak * HOURS_PER_YEAR * inputs.tuning.greenfield_load_factor;
    let breakdown = inputs.lcoe_calculator().calculate_lcoe(&equipment, required);
    let check = inputs.checker().check_constraints(&equipment, peak, require_n1);

    let mut result = assemble(inputs, equipment, breakdown, check);
    result.objective_value = result.lcoe;
    result
}
