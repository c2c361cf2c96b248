//! Land development: how much facility load can this parcel power?
//!
//! ```text
//! ceiling   = min(emissions, fuel, land)          thermal MW
//! load_max  = ceiling / (1 − flex × alignment)    per flexibility level
//! ```
//!
//! Flexible workloads shave coincident peaks, so a fleet sized to the
//! ceiling serves a larger nameplate load as flexibility grows.

use siteplan_core::{FlexScenario, OptimizationResult, HOURS_PER_YEAR};

use super::{assemble, PlanningInputs};
use crate::limits::ConstraintLimitCalculator;
use crate::sizing::SizingRequest;

pub(super) fn optimize(inputs: &PlanningInputs) -> OptimizationResult {
    let tuning = &inputs.tuning;
    let limits = ConstraintLimitCalculator::new(&inputs.catalog, tuning).calculate(&inputs.constraints);
    let (source, mut ceiling) = limits.binding();

    let mut warnings = Vec::new();
    let bounded = ceiling.is_finite();
    if !bounded {
        warnings.push("No site cap limits thermal capacity; sizing to peak load".to_string());
        ceiling = inputs.peak_mw();
    }

    let equipment = inputs
        .sizer()
        .size_equipment_to_load(&SizingRequest::new(ceiling).without_n1());

    let calc = inputs.lcoe_calculator();
    let scenarios: Vec<FlexScenario> = tuning
        .flex_scenarios
        .iter()
        .map(|&flex| {
            let load_max = ceiling / (1.0 - flex * tuning.flex_alignment);
            let energy = load_max * HOURS_PER_YEAR * tuning.expansion_load_factor;
            FlexScenario {
                flexibility: flex,
                load_max_mw: load_max,
                lcoe: calc.calculate_lcoe(&equipment, energy).lcoe,
            }
        })
        .collect();

    let required = ceiling * HOURS_PER_YEAR * tuning.expansion_load_factor;
    let breakdown = calc.calculate_lcoe(&equipment, required);
    let check = inputs.checker().check_constraints(&equipment, ceiling, false);

    let mut result = assemble(inputs, equipment, breakdown, check);
    result.objective_value = ceiling;
    if bounded {
        result.binding_constraint = Some(source.constraint_name().to_string());
    }
    result.warnings.extend(warnings);
    result.dispatch_summary.flex_scenarios = scenarios;
    result
        .dispatch_summary
        .set_metric("max_thermal_mw_from_emissions", limits.max_thermal_mw_from_emissions);
    result
        .dispatch_summary
        .set_metric("max_thermal_mw_from_fuel", limits.max_thermal_mw_from_fuel);
    result
        .dispatch_summary
        .set_metric("max_thermal_mw_from_land", limits.max_thermal_mw_from_land);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteplan_core::{LoadTrajectory, SiteConstraints};

    #[test]
    fn test_land_binds() {
        let constraints = SiteConstraints {
            nox_tpy: 1e6,
            gas_mcf_day: 1e7,
            land_acres: 44.0,
            ..SiteConstraints::default()
        };
        let inputs = PlanningInputs::new(LoadTrajectory::flat(2027, 500.0), constraints);
        let result = optimize(&inputs);
        assert!((result.objective_value - 100.0).abs() < 1e-6);
        assert_eq!(result.binding_constraint.as_deref(), Some("land_acres"));
    }

    #[test]
    fn test_flex_scenarios_grow_load() {
        let inputs = PlanningInputs::new(LoadTrajectory::flat(2027, 500.0), SiteConstraints::default());
        let result = optimize(&inputs);
        let scenarios = &result.dispatch_summary.flex_scenarios;
        assert_eq!(scenarios.len(), 4);
        assert!((scenarios[0].load_max_mw - result.objective_value).abs() < 1e-9);
        // 0.5 flexibility at 0.7 alignment: ceiling / 0.65
        assert!((scenarios[3].load_max_mw - result.objective_value / 0.65).abs() < 1e-6);
        assert!(scenarios.windows(2).all(|w| w[1].load_max_mw > w[0].load_max_mw));
        assert_eq!(result.binding_constraint.as_deref(), Some("nox_tpy"));
    }

    #[test]
    fn test_unbounded_site_falls_back_to_peak() {
        let mut inputs = PlanningInputs::new(LoadTrajectory::flat(2027, 80.0), SiteConstraints::default());
        for spec in [&mut inputs.catalog.recip, &mut inputs.catalog.turbine] {
            spec.nox_lb_per_mmbtu = 0.0;
            spec.heat_rate_btu_kwh = 0.0;
            spec.land_acres_per_mw = 0.0;
        }
        let result = optimize(&inputs);
        assert_eq!(result.objective_value, 80.0);
        assert!(result.warnings.iter().any(|w| w.starts_with("No site cap")));
    }
}
