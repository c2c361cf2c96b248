//! Thermal capacity ceilings implied by site caps.
//!
//! Each cap is translated into the largest thermal fleet it could sustain on
//! its own, using a fixed recip/turbine blend and an assumed capacity factor:
//!
//! ```text
//! emissions:  cap_tpy     / (cf × 8760 × HR_blend × NOx_blend / 2000)
//! fuel:       cap_mcf_day / (cf × 24 × MCF_per_MWh_blend)
//! land:       cap_acres   / acres_per_MW_blend
//! ```
//!
//! A zero rate gives an unbounded ceiling.

use serde::Serialize;
use siteplan_core::{
    EquipmentCatalog, HeuristicTuning, SiteConstraints, HOURS_PER_YEAR, LB_PER_TON,
};

/// Which site cap a ceiling comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSource {
    Emissions,
    Fuel,
    Land,
}

impl LimitSource {
    /// Constraint name used in result records.
    pub fn constraint_name(&self) -> &'static str {
        match self {
            LimitSource::Emissions => "nox_tpy",
            LimitSource::Fuel => "gas_mcf_day",
            LimitSource::Land => "land_acres",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstraintLimits {
    pub max_thermal_mw_from_emissions: f64,
    pub max_thermal_mw_from_fuel: f64,
    pub max_thermal_mw_from_land: f64,
}

impl ConstraintLimits {
    /// Ceiling from the two caps that limit operation (emissions, fuel).
    pub fn thermal_ceiling(&self) -> f64 {
        self.max_thermal_mw_from_emissions
            .min(self.max_thermal_mw_from_fuel)
    }

    /// Smallest of the three ceilings and the cap it comes from.
    pub fn binding(&self) -> (LimitSource, f64) {
        [
            (LimitSource::Emissions, self.max_thermal_mw_from_emissions),
            (LimitSource::Fuel, self.max_thermal_mw_from_fuel),
            (LimitSource::Land, self.max_thermal_mw_from_land),
        ]
        .into_iter()
        .fold((LimitSource::Emissions, f64::INFINITY), |best, cur| {
            if cur.1 < best.1 {
                cur
            } else {
                best
            }
        })
    }
}

pub struct ConstraintLimitCalculator<'a> {
    catalog: &'a EquipmentCatalog,
    recip_blend: f64,
    capacity_factor: f64,
}

impl<'a> ConstraintLimitCalculator<'a> {
    pub fn new(catalog: &'a EquipmentCatalog, tuning: &HeuristicTuning) -> Self {
        Self {
            catalog,
            recip_blend: tuning.recip_blend,
            capacity_factor: tuning.limit_capacity_factor,
        }
    }

    pub fn with_blend(mut self, recip_blend: f64) -> Self {
        self.recip_blend = recip_blend.clamp(0.0, 1.0);
        self
    }

    pub fn with_capacity_factor(mut self, capacity_factor: f64) -> Self {
        self.capacity_factor = capacity_factor;
        self
    }

    fn blend(&self, recip: f64, turbine: f64) -> f64 {
        self.recip_blend * recip + (1.0 - self.recip_blend) * turbine
    }

    pub fn calculate(&self, constraints: &SiteConstraints) -> ConstraintLimits {
        let recip = &self.catalog.recip;
        let turbine = &self.catalog.turbine;
        let cf = self.capacity_factor;

        let heat_rate = self.blend(recip.mmbtu_per_mwh(), turbine.mmbtu_per_mwh());
        let nox_rate = self.blend(recip.nox_lb_per_mmbtu, turbine.nox_lb_per_mmbtu);
        let tpy_per_mw = cf * HOURS_PER_YEAR * heat_rate * nox_rate / LB_PER_TON;

        let mcf_per_mwh = self.blend(recip.mcf_per_mwh(), turbine.mcf_per_mwh());
        let mcf_day_per_mw = cf * 24.0 * mcf_per_mwh;

        let acres_per_mw = self.blend(recip.land_acres_per_mw, turbine.land_acres_per_mw);

        ConstraintLimits {
            max_thermal_mw_from_emissions: ceiling(constraints.nox_tpy, tpy_per_mw),
            max_thermal_mw_from_fuel: ceiling(constraints.gas_mcf_day, mcf_day_per_mw),
            max_thermal_mw_from_land: ceiling(constraints.land_acres, acres_per_mw),
        }
    }
}

fn ceiling(cap: f64, per_mw: f64) -> f64 {
    if per_mw <= 0.0 {
        f64::INFINITY
    } else {
        cap / per_mw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(constraints: &SiteConstraints) -> ConstraintLimits {
        let catalog = EquipmentCatalog::default();
        ConstraintLimitCalculator::new(&catalog, &HeuristicTuning::default()).calculate(constraints)
    }

    #[test]
    fn test_emissions_ceiling() {
        let l = limits(&SiteConstraints::default());
        // 0.7 × 8760 × 7.94 MMBtu/MWh × 0.0843 lb/MMBtu / 2000
        let per_mw = 0.7 * 8760.0 * 7.94 * 0.0843 / 2000.0;
        assert!((l.max_thermal_mw_from_emissions - 100.0 / per_mw).abs() < 1e-6);
    }

    #[test]
    fn test_land_ceiling() {
        let l = limits(&SiteConstraints::default());
        assert!((l.max_thermal_mw_from_land - 500.0 / 0.44).abs() < 1e-6);
    }

    #[test]
    fn test_binding_is_smallest() {
        let constraints = SiteConstraints {
            nox_tpy: 1e6,
            gas_mcf_day: 1e7,
            land_acres: 10.0,
            ..SiteConstraints::default()
        };
        let (source, mw) = limits(&constraints).binding();
        assert_eq!(source, LimitSource::Land);
        assert!((mw - 10.0 / 0.44).abs() < 1e-9);
    }

    #[test]
    fn test_zero_rate_is_unbounded() {
        let mut catalog = EquipmentCatalog::default();
        catalog.recip.nox_lb_per_mmbtu = 0.0;
        catalog.turbine.nox_lb_per_mmbtu = 0.0;
        let l = ConstraintLimitCalculator::new(&catalog, &HeuristicTuning::default())
            .calculate(&SiteConstraints::default());
        assert!(l.max_thermal_mw_from_emissions.is_infinite());
        assert!(l.thermal_ceiling().is_finite());
    }

    #[test]
    fn test_blend_override() {
        let catalog = EquipmentCatalog::default();
        let all_recip = ConstraintLimitCalculator::new(&catalog, &HeuristicTuning::default())
            .with_blend(1.0)
            .calculate(&SiteConstraints::default());
        assert!((all_recip.max_thermal_mw_from_land - 1000.0).abs() < 1e-9);
    }
}
