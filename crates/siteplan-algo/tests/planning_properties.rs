//! Cross-module properties of the heuristic planners.

use siteplan_algo::heuristic::{create_optimizer, BrownfieldParams, PlanningInputs, ProblemParams};
use siteplan_algo::{
    AnnualStackGenerator, EquipmentSizer, LcoeCalculator, ProblemType, SizingRequest,
    StackOptions,
};
use siteplan_core::{
    EconomicParams, EquipmentCatalog, EquipmentConfiguration, GridPolicy, HeuristicTuning,
    LoadTrajectory, SiteConstraints,
};

fn open_site() -> SiteConstraints {
    SiteConstraints {
        nox_tpy: 1e9,
        gas_mcf_day: 1e9,
        land_acres: 1e9,
        ..SiteConstraints::default()
    }
}

/// Sized firm capacity covers the reserve-adjusted load across the range.
#[test]
fn test_sizing_covers_reserve_margin() {
    let catalog = EquipmentCatalog::default();
    let constraints = open_site();
    let tuning = HeuristicTuning::default();
    let sizer = EquipmentSizer::new(&catalog, &constraints, &tuning);

    let mut target = 10.0;
    while target <= 2000.0 {
        let eq = sizer.size_equipment_to_load(&SizingRequest::new(target));
        let required = target * constraints.reserve_factor();
        assert!(
            eq.firm_capacity_mw + 1e-6 >= required,
            "target {target}: firm {} < {required}",
            eq.firm_capacity_mw
        );
        assert!(eq.firm_capacity_mw <= eq.total_capacity_mw + 1e-9);
        // Overbuild stays within one turbine plus one recip.
        assert!(eq.firm_capacity_mw - required < catalog.turbine.unit_mw + catalog.recip.unit_mw);
        target += 37.5;
    }
}

#[test]
fn test_lcoe_monotone_in_costs() {
    let catalog = EquipmentCatalog::default();
    let economics = EconomicParams::default();
    let tuning = HeuristicTuning::default();
    let eq = EquipmentConfiguration::from_units(&catalog, 40, 5, 50.0, 20.0, 80.0, 0.0);
    let energy = 300.0 * 8760.0 * 0.7;

    let base = LcoeCalculator::new(&catalog, &economics, &tuning)
        .calculate_lcoe(&eq, energy)
        .lcoe_unclamped;

    let mut pricier = catalog.clone();
    pricier.recip.capex_per_kw *= 1.5;
    let higher_capex = LcoeCalculator::new(&pricier, &economics, &tuning)
        .calculate_lcoe(&eq, energy)
        .lcoe_unclamped;
    assert!(higher_capex > base);

    let dearer_fuel = EconomicParams {
        fuel_price_mmbtu: economics.fuel_price_mmbtu * 2.0,
        ..economics.clone()
    };
    let higher_opex = LcoeCalculator::new(&catalog, &dearer_fuel, &tuning)
        .calculate_lcoe(&eq, energy)
        .lcoe_unclamped;
    assert!(higher_opex > base);
}

#[test]
fn test_delivered_plus_unserved_is_required() {
    let catalog = EquipmentCatalog::default();
    let economics = EconomicParams::default();
    let tuning = HeuristicTuning::default();
    let calc = LcoeCalculator::new(&catalog, &economics, &tuning);
    for n_recip in [0, 4, 20, 80] {
        let eq = EquipmentConfiguration::from_units(&catalog, n_recip, 0, 0.0, 0.0, 0.0, 0.0);
        let b = calc.calculate_lcoe(&eq, 100.0 * 8760.0);
        assert!((b.energy_delivered_mwh + b.unserved_energy_mwh - b.energy_required_mwh).abs() < 1e-6);
        assert!(b.energy_delivered_mwh <= b.energy_required_mwh + 1e-9);
    }
}

#[test]
fn test_stack_grid_timing() {
    let inputs = PlanningInputs::new(
        LoadTrajectory::flat(2025, 100.0).with_year(2029, 150.0),
        open_site(),
    );
    let onsite = EquipmentConfiguration::from_units(&inputs.catalog, 24, 0, 0.0, 0.0, 0.0, 0.0);
    let options = StackOptions {
        grid_lead_years: 3,
        ..StackOptions::default()
    };
    let generator = AnnualStackGenerator::new(&inputs, options);
    for problem_type in ProblemType::ALL {
        let stack = generator.generate(&onsite, problem_type.grid_policy());
        assert_eq!(stack.grid_year, 2028);
        for y in &stack.years {
            if y.year < 2028 {
                assert_eq!(y.equipment.grid_mw, 0.0, "{problem_type} {}", y.year);
            } else if problem_type.grid_policy() == GridPolicy::Replace {
                assert_eq!(y.equipment.thermal_mw(), 0.0);
            } else {
                assert_eq!(y.equipment.thermal_mw(), onsite.thermal_mw());
            }
        }
    }
}

#[test]
fn test_greenfield_600mw_end_to_end() {
    let inputs = PlanningInputs::new(
        LoadTrajectory::flat(2027, 200.0)
            .with_year(2028, 400.0)
            .with_year(2029, 600.0),
        open_site(),
    );
    let strategy = create_optimizer(1, inputs, ProblemParams::default()).unwrap();
    assert_eq!(strategy.problem_type(), ProblemType::Greenfield);

    let result = strategy.optimize();
    assert_eq!(result.strategy, "greenfield");
    assert!(result.feasible, "{:?}", result.violations);
    let firm = result.equipment_config.firm_capacity_mw;
    assert!((690.0..=700.0).contains(&firm), "firm {firm}");
    assert!(result.lcoe > 0.0);
    assert_eq!(result.objective_value, result.lcoe);
    assert!(result.timeline_months > 0);

    let shares: f64 = result.dispatch_summary.generation_share.values().sum();
    assert!((shares - 1.0).abs() < 1e-9);
}

#[test]
fn test_brownfield_through_factory() {
    let inputs = PlanningInputs::new(LoadTrajectory::flat(2027, 130.0), open_site());
    let catalog = inputs.catalog.clone();
    let params = ProblemParams {
        brownfield: BrownfieldParams {
            existing: EquipmentConfiguration::from_units(&catalog, 20, 0, 0.0, 0.0, 0.0, 0.0),
            ..BrownfieldParams::default()
        },
        ..ProblemParams::default()
    };
    let result = create_optimizer(2, inputs, params).unwrap().optimize();

    assert_eq!(result.strategy, "brownfield");
    assert_eq!(result.dispatch_summary.metric("existing_mw"), Some(100.0));
    let added = result.dispatch_summary.metric("added_mw").unwrap();
    assert!((added - 30.0).abs() < 1e-9);
    assert_eq!(result.objective_value, added);
    assert!(result.equipment_config.n_recip >= 20);
    assert!(result.equipment_config.firm_capacity_mw >= 130.0);
    assert!(result.constraint_status.contains_key("lcoe_ceiling"));
}

#[test]
fn test_brownfield_over_ceiling_through_factory() {
    let inputs = PlanningInputs::new(LoadTrajectory::flat(2027, 200.0), open_site());
    let params = ProblemParams {
        brownfield: BrownfieldParams {
            existing_lcoe: 130.0,
            lcoe_threshold: 100.0,
            ..BrownfieldParams::default()
        },
        ..ProblemParams::default()
    };
    let result = create_optimizer(2, inputs, params).unwrap().optimize();
    assert!(!result.feasible);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.capex_total, 0.0);
}

#[test]
fn test_unknown_problem_type() {
    let inputs = PlanningInputs::new(LoadTrajectory::flat(2027, 50.0), open_site());
    let err = create_optimizer(9, inputs, ProblemParams::default()).unwrap_err();
    assert!(err.is_config());
}
