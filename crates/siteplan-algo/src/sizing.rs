//! Greedy equipment sizing.
//!
//! Single pass, merit order: grid first, baseload recips, turbines for the
//! rest of the firm need, then storage and solar on what land is left.

use serde::{Deserialize, Serialize};

use siteplan_core::{EquipmentCatalog, EquipmentConfiguration, HeuristicTuning, SiteConstraints};

use crate::limits::ConstraintLimitCalculator;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingRequest {
    pub target_mw: f64,
    pub require_n1: bool,
    /// Cap on the recip share of the baseload block (0 disables recips)
    pub max_recip_pct: f64,
    /// Cap on turbine MW as a share of the firm need (0 disables turbines)
    pub max_turbine_pct: f64,
    pub include_solar: bool,
    pub include_bess: bool,
    /// Grid MW counted against the firm need
    pub grid_available_mw: f64,
}

impl Default for SizingRequest {
    fn default() -> Self {
        Self {
            target_mw: 0.0,
            require_n1: true,
            max_recip_pct: 1.0,
            max_turbine_pct: 1.0,
            include_solar: true,
            include_bess: true,
            grid_available_mw: 0.0,
        }
    }
}

impl SizingRequest {
    pub fn new(target_mw: f64) -> Self {
        Self {
            target_mw,
            ..Self::default()
        }
    }

    pub fn without_n1(mut self) -> Self {
        self.require_n1 = false;
        self
    }

    pub fn with_grid(mut self, grid_mw: f64) -> Self {
        self.grid_available_mw = grid_mw;
        self
    }
}

pub struct EquipmentSizer<'a> {
    catalog: &'a EquipmentCatalog,
    constraints: &'a SiteConstraints,
    tuning: &'a HeuristicTuning,
}

impl<'a> EquipmentSizer<'a> {
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

    pub fn size_equipment_to_load(&self, request: &SizingRequest) -> EquipmentConfiguration {
        let catalog = self.catalog;
        let recip = &catalog.recip;
        let turbine = &catalog.turbine;
        let target = request.target_mw.max(0.0);

        let required_firm = if request.require_n1 {
            target * (1.0 + self.constraints.reserve_margin)
        } else {
            target
        };
        let grid_mw = request.grid_available_mw.max(0.0);
        let remaining = (required_firm - grid_mw).max(0.0);

        let ceiling = ConstraintLimitCalculator::new(catalog, self.tuning)
            .calculate(self.constraints)
            .thermal_ceiling();
        let thermal_cap = ceiling.min(remaining);

        // Baseload recips, rounded up to whole units
        let recip_target = (remaining * self.tuning.baseload_fraction * request.max_recip_pct)
            .min(ceiling * self.tuning.recip_ceiling_share)
            .max(0.0);
        let ceiling_limited = remaining > ceiling;
        let mut n_recip = recip.units_for(recip_target);
        if ceiling_limited && recip.unit_mw > 0.0 {
            n_recip = n_recip.min((thermal_cap / recip.unit_mw + EPS).floor() as u32);
        }
        let recip_mw = n_recip as f64 * recip.unit_mw;

        // Turbines take the rest in whole units
        let turbine_room = (remaining - recip_mw)
            .min(thermal_cap - recip_mw)
            .min(remaining * request.max_turbine_pct)
            .max(0.0);
        let mut n_turbine = if turbine.unit_mw > 0.0 {
            (turbine_room / turbine.unit_mw + EPS).floor() as u32
        } else {
            0
        };

        // Sub-unit residual: one more unit of the smaller machine, unless the
        // site ceiling is what stops the build.
        let built = n_recip as f64 * recip.unit_mw + n_turbine as f64 * turbine.unit_mw;
        let residual = thermal_cap - built;
        if residual > EPS {
            if request.max_recip_pct > 0.0 && recip.unit_mw > 0.0 {
                n_recip += if ceiling_limited {
                    (residual / recip.unit_mw + EPS).floor() as u32
                } else {
                    recip.units_for(residual)
                };
            } else if request.max_turbine_pct > 0.0 && !ceiling_limited {
                n_turbine += 1;
            }
        }

        let (bess_mw, bess_mwh) = if request.include_bess {
            let mw = target * self.tuning.bess_power_fraction;
            (mw, mw * catalog.battery.duration_hours)
        } else {
            (0.0, 0.0)
        };

        let footprint = EquipmentConfiguration::from_units(
            catalog, n_recip, n_turbine, 0.0, bess_mw, bess_mwh, 0.0,
        );
        let solar_mw = if request.include_solar && catalog.solar.land_acres_per_mw > 0.0 {
            let land_left = (self.constraints.land_acres - footprint.land_used_acres).max(0.0);
            (land_left / catalog.solar.land_acres_per_mw)
                .min(target * self.tuning.max_solar_fraction)
        } else {
            0.0
        };

        EquipmentConfiguration::from_units(
            catalog, n_recip, n_turbine, solar_mw, bess_mw, bess_mwh, grid_mw,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_site() -> SiteConstraints {
        SiteConstraints {
            nox_tpy: 1e9,
            gas_mcf_day: 1e9,
            land_acres: 1e9,
            ..SiteConstraints::default()
        }
    }

    #[test]
    fn test_600mw_with_reserve() {
        let catalog = EquipmentCatalog::default();
        let constraints = open_site();
        let tuning = HeuristicTuning::default();
        let sizer = EquipmentSizer::new(&catalog, &constraints, &tuning);
        let eq = sizer.size_equipment_to_load(&SizingRequest::new(600.0));
        assert_eq!(eq.n_recip, 98);
        assert_eq!(eq.n_turbine, 10);
        assert_eq!(eq.firm_capacity_mw, 690.0);
        assert!((eq.bess_mw - 60.0).abs() < 1e-9);
        assert!((eq.bess_mwh - 240.0).abs() < 1e-9);
        assert!((eq.solar_mw - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_grid_reduces_thermal() {
        let catalog = EquipmentCatalog::default();
        let constraints = open_site();
        let tuning = HeuristicTuning::default();
        let sizer = EquipmentSizer::new(&catalog, &constraints, &tuning);
        let request = SizingRequest::new(100.0).without_n1().with_grid(60.0);
        let eq = sizer.size_equipment_to_load(&request);
        assert_eq!(eq.grid_mw, 60.0);
        assert!(eq.thermal_mw() >= 40.0 && eq.thermal_mw() < 45.0);
        assert!(eq.firm_capacity_mw >= 100.0);
    }

    #[test]
    fn test_ceiling_limits_thermal() {
        let catalog = EquipmentCatalog::default();
        let constraints = SiteConstraints {
            nox_tpy: 20.0,
            ..open_site()
        };
        let tuning = HeuristicTuning::default();
        let ceiling = ConstraintLimitCalculator::new(&catalog, &tuning)
            .calculate(&constraints)
            .thermal_ceiling();
        let sizer = EquipmentSizer::new(&catalog, &constraints, &tuning);
        let eq = sizer.size_equipment_to_load(&SizingRequest::new(500.0));
        assert!(eq.thermal_mw() <= ceiling + 1e-9);
        assert!(eq.firm_capacity_mw < 500.0);
    }

    #[test]
    fn test_no_recips_uses_turbines() {
        let catalog = EquipmentCatalog::default();
        let constraints = open_site();
        let tuning = HeuristicTuning::default();
        let sizer = EquipmentSizer::new(&catalog, &constraints, &tuning);
        let request = SizingRequest {
            max_recip_pct: 0.0,
            ..SizingRequest::new(50.0)
        };
        let eq = sizer.size_equipment_to_load(&request);
        assert_eq!(eq.n_recip, 0);
        assert_eq!(eq.n_turbine, 3);
        assert!(eq.firm_capacity_mw >= 57.5);
    }

    #[test]
    fn test_solar_uses_leftover_land() {
        let catalog = EquipmentCatalog::default();
        let constraints = SiteConstraints {
            land_acres: 100.0,
            ..open_site()
        };
        let tuning = HeuristicTuning::default();
        let sizer = EquipmentSizer::new(&catalog, &constraints, &tuning);
        let eq = sizer.size_equipment_to_load(&SizingRequest::new(100.0));
        assert!(eq.land_used_acres <= 100.0 + 1e-9);
        assert!(eq.solar_mw > 0.0 && eq.solar_mw <= 25.0);
    }
}
