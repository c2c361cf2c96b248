//! Levelized cost of energy
//!
//! ```text
//! generation_t   = MW_t × CF_t × 8760           (recip, turbine, solar)
//! grid           = min(MW_grid × 8760, max(0, required − on-site))
//! delivered      = min(Σ generation, required)
//! unserved       = required − delivered
//! LCOE           = (capex × CRF + opex) / delivered
//! ```
//!
//! The headline LCOE is clamped at the error threshold; the unclamped value
//! and the unserved share are always reported alongside it.

use serde::Serialize;
use std::collections::BTreeMap;

use siteplan_core::{
    EconomicParams, EquipmentCatalog, EquipmentConfiguration, HeuristicTuning, Technology,
    HOURS_PER_YEAR,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LcoeBreakdown {
    pub lcoe: f64,
    pub lcoe_unclamped: f64,
    pub clamped: bool,
    pub capex_total: f64,
    pub annualized_capex: f64,
    pub opex_annual: f64,
    pub annual_cost: f64,
    pub generation_mwh: BTreeMap<Technology, f64>,
    pub total_generation_mwh: f64,
    pub energy_required_mwh: f64,
    pub energy_delivered_mwh: f64,
    pub unserved_energy_mwh: f64,
    pub unserved_energy_pct: f64,
    pub warnings: Vec<String>,
}

impl LcoeBreakdown {
    /// Share of estimated generation per technology.
    pub fn generation_shares(&self) -> BTreeMap<Technology, f64> {
        if self.total_generation_mwh <= 0.0 {
            return BTreeMap::new();
        }
        self.generation_mwh
            .iter()
            .map(|(tech, mwh)| (*tech, mwh / self.total_generation_mwh))
            .collect()
    }
}

/// Clamp policy outcome for a raw LCOE.
#[derive(Debug, Clone, PartialEq)]
pub struct Levelized {
    pub lcoe: f64,
    pub unclamped: f64,
    pub clamped: bool,
    pub warnings: Vec<String>,
}

pub struct LcoeCalculator<'a> {
    catalog: &'a EquipmentCatalog,
    economics: &'a EconomicParams,
    tuning: &'a HeuristicTuning,
}

impl<'a> LcoeCalculator<'a> {
    pub fn new(
        catalog: &'a EquipmentCatalog,
        economics: &'a EconomicParams,
        tuning: &'a HeuristicTuning,
    ) -> Self {
        Self {
            catalog,
            economics,
            tuning,
        }
    }

    /// Annual capacity factor assumed for a technology.
    pub fn capacity_factor(&self, tech: Technology) -> f64 {
        match tech {
            Technology::Recip => self.tuning.recip_capacity_factor,
            Technology::Turbine => self.tuning.turbine_capacity_factor,
            Technology::Solar => self.catalog.solar.capacity_factor,
            Technology::Bess => 0.0,
            Technology::Grid => self.catalog.grid.availability,
        }
    }

    pub fn capacity_factors(&self) -> BTreeMap<Technology, f64> {
        [Technology::Recip, Technology::Turbine, Technology::Solar]
            .into_iter()
            .map(|t| (t, self.capacity_factor(t)))
            .collect()
    }

    /// Installed cost ($), ITC applied to solar and storage.
    pub fn capex(&self, eq: &EquipmentConfiguration) -> f64 {
        let c = self.catalog;
        let itc = 1.0 - self.economics.itc_rate;
        let mut capex = eq.recip_mw * 1000.0 * c.recip.capex_per_kw
            + eq.turbine_mw * 1000.0 * c.turbine.capex_per_kw
            + eq.solar_mw * 1e6 * c.solar.capex_per_w_dc * itc
            + eq.bess_mwh * 1000.0 * c.battery.capex_per_kwh * itc;
        if eq.grid_mw > 0.0 {
            capex += c.grid.interconnect_capex;
        }
        capex
    }

    /// Annual operating cost ($/yr) for the given per-technology generation.
    pub fn opex(&self, eq: &EquipmentConfiguration, generation: &BTreeMap<Technology, f64>) -> f64 {
        let c = self.catalog;
        let gen = |t: Technology| generation.get(&t).copied().unwrap_or(0.0);
        let fuel = self.economics.fuel_price_mmbtu;

        let mut opex = 0.0;
        for (tech, mw) in [
            (Technology::Recip, eq.recip_mw),
            (Technology::Turbine, eq.turbine_mw),
        ] {
            if let Some(spec) = c.thermal(tech) {
                let mwh = gen(tech);
                opex += mwh * spec.mmbtu_per_mwh() * fuel
                    + mwh * spec.vom_per_mwh
                    + mw * 1000.0 * spec.fom_per_kw_yr;
            }
        }
        opex += gen(Technology::Solar) * c.solar.vom_per_mwh;
        opex += eq.bess_mwh * c.battery.cycles_per_year * 1000.0 * c.battery.degradation_per_kwh;
        opex += gen(Technology::Grid) * c.grid.energy_price_mwh;
        opex
    }

    /// Apply the sanity clamp to a raw cost and delivered energy.
    pub fn levelize(&self, annual_cost: f64, delivered_mwh: f64) -> Levelized {
        let t = self.tuning;
        let mut warnings = Vec::new();
        if delivered_mwh <= 0.0 {
            warnings.push("No energy delivered; LCOE reported as 0".to_string());
            return Levelized {
                lcoe: 0.0,
                unclamped: 0.0,
                clamped: false,
                warnings,
            };
        }
        let unclamped = annual_cost / delivered_mwh;
        let mut lcoe = unclamped;
        let mut clamped = false;
        if unclamped > t.lcoe_error_threshold {
            lcoe = t.lcoe_error_threshold;
            clamped = true;
            warnings.push(format!(
                "LCOE ${unclamped:.2}/MWh exceeds ${:.0}/MWh; clamped",
                t.lcoe_error_threshold
            ));
        } else if unclamped > t.lcoe_warning_threshold {
            warnings.push(format!(
                "LCOE ${unclamped:.2}/MWh is above ${:.0}/MWh",
                t.lcoe_warning_threshold
            ));
        } else if unclamped > 0.0 && unclamped < t.lcoe_min_realistic {
            warnings.push(format!(
                "LCOE ${unclamped:.2}/MWh is below ${:.0}/MWh and likely unrealistic",
                t.lcoe_min_realistic
            ));
        }
        Levelized {
            lcoe,
            unclamped,
            clamped,
            warnings,
        }
    }

    pub fn calculate_lcoe(
        &self,
        eq: &EquipmentConfiguration,
        annual_energy_required: f64,
    ) -> LcoeBreakdown {
        let required = annual_energy_required.max(0.0);

        let mut generation = BTreeMap::new();
        for (tech, mw) in [
            (Technology::Recip, eq.recip_mw),
            (Technology::Turbine, eq.turbine_mw),
            (Technology::Solar, eq.solar_mw),
        ] {
            if mw > 0.0 {
                generation.insert(tech, mw * self.capacity_factor(tech) * HOURS_PER_YEAR);
            }
        }
        let onsite: f64 = generation.values().sum();
        if eq.grid_mw > 0.0 {
            let gap = (required - onsite).max(0.0);
            generation.insert(Technology::Grid, (eq.grid_mw * HOURS_PER_YEAR).min(gap));
        }
        let total_generation: f64 = generation.values().sum();

        let delivered = total_generation.min(required);
        let unserved = (required - delivered).max(0.0);
        let unserved_pct = if required > 0.0 {
            unserved / required * 100.0
        } else {
            0.0
        };

        let capex = self.capex(eq);
        let opex = self.opex(eq, &generation);
        let annualized_capex = capex * self.economics.capital_recovery_factor();
        let annual_cost = annualized_capex + opex;
        let levelized = self.levelize(annual_cost, delivered);

        let mut warnings = levelized.warnings;
        if unserved > 0.0 {
            warnings.push(format!(
                "Unserved energy {unserved:.0} MWh ({unserved_pct:.1}% of requirement)"
            ));
        }

        LcoeBreakdown {
            lcoe: levelized.lcoe,
            lcoe_unclamped: levelized.unclamped,
            clamped: levelized.clamped,
            capex_total: capex,
            annualized_capex,
            opex_annual: opex,
            annual_cost,
            generation_mwh: generation,
            total_generation_mwh: total_generation,
            energy_required_mwh: required,
            energy_delivered_mwh: delivered,
            unserved_energy_mwh: unserved,
            unserved_energy_pct: unserved_pct,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        catalog: EquipmentCatalog,
        economics: EconomicParams,
        tuning: HeuristicTuning,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                catalog: EquipmentCatalog::default(),
                economics: EconomicParams::default(),
                tuning: HeuristicTuning::default(),
            }
        }

        fn calc(&self) -> LcoeCalculator<'_> {
            LcoeCalculator::new(&self.catalog, &self.economics, &self.tuning)
        }
    }

    #[test]
    fn test_delivered_plus_unserved_is_required() {
        let f = Fixture::new();
        let eq = EquipmentConfiguration::from_units(&f.catalog, 10, 0, 0.0, 0.0, 0.0, 0.0);
        let required = 100.0 * 8760.0;
        let b = f.calc().calculate_lcoe(&eq, required);
        assert!((b.energy_delivered_mwh + b.unserved_energy_mwh - required).abs() < 1e-6);
        // 50 MW × 0.85 × 8760
        assert!((b.energy_delivered_mwh - 50.0 * 0.85 * 8760.0).abs() < 1e-6);
        assert!(b.unserved_energy_pct > 0.0);
    }

    #[test]
    fn test_grid_only_fills_gap() {
        let f = Fixture::new();
        let eq = EquipmentConfiguration::from_units(&f.catalog, 20, 0, 0.0, 0.0, 0.0, 500.0);
        let onsite = 100.0 * 0.85 * 8760.0;
        let required = onsite + 1000.0;
        let b = f.calc().calculate_lcoe(&eq, required);
        assert!((b.generation_mwh[&Technology::Grid] - 1000.0).abs() < 1e-6);
        assert_eq!(b.unserved_energy_mwh, 0.0);

        let surplus = f.calc().calculate_lcoe(&eq, onsite * 0.5);
        assert_eq!(surplus.generation_mwh[&Technology::Grid], 0.0);
    }

    #[test]
    fn test_zero_delivered_is_not_an_error() {
        let f = Fixture::new();
        let b = f
            .calc()
            .calculate_lcoe(&EquipmentConfiguration::default(), 1000.0);
        assert_eq!(b.lcoe, 0.0);
        assert_eq!(b.unserved_energy_pct, 100.0);
        assert!(!b.warnings.is_empty());
    }

    #[test]
    fn test_clamp_policy() {
        let f = Fixture::new();
        let calc = f.calc();
        let high = calc.levelize(600.0, 1.0);
        assert!(high.clamped);
        assert_eq!(high.lcoe, 500.0);
        assert_eq!(high.unclamped, 600.0);

        let warn = calc.levelize(250.0, 1.0);
        assert!(!warn.clamped);
        assert_eq!(warn.lcoe, 250.0);
        assert_eq!(warn.warnings.len(), 1);

        let low = calc.levelize(10.0, 1.0);
        assert_eq!(low.warnings.len(), 1);
        assert!(calc.levelize(80.0, 1.0).warnings.is_empty());
    }

    #[test]
    fn test_itc_applies_to_solar_and_storage() {
        let f = Fixture::new();
        let solar = EquipmentConfiguration::from_units(&f.catalog, 0, 0, 1.0, 0.0, 0.0, 0.0);
        assert!((f.calc().capex(&solar) - 1e6 * 0.95 * 0.7).abs() < 1e-6);
        let grid = EquipmentConfiguration::grid_only(&f.catalog, 10.0);
        assert_eq!(f.calc().capex(&grid), 5_000_000.0);
    }

    #[test]
    fn test_shares_sum_to_one() {
        let f = Fixture::new();
        let eq = EquipmentConfiguration::from_units(&f.catalog, 10, 2, 20.0, 0.0, 0.0, 0.0);
        let b = f.calc().calculate_lcoe(&eq, 1e6);
        let total: f64 = b.generation_shares().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
