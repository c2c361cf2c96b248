//! Installed equipment for one plan or one plan year.

use serde::{Deserialize, Serialize};

use crate::catalog::{EquipmentCatalog, Technology};

/// Equipment quantities plus the aggregates derived from them.
///
/// `total_capacity_mw` and `firm_capacity_mw` are stored so the serialized
/// record is self-describing, but they are only ever written by
/// [`EquipmentConfiguration::refresh`]. Firm capacity counts dispatchable
/// sources only, so `firm_capacity_mw <= total_capacity_mw` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentConfiguration {
    pub n_recip: u32,
    pub recip_mw: f64,
    pub n_turbine: u32,
    pub turbine_mw: f64,
    pub solar_mw: f64,
    pub bess_mw: f64,
    pub bess_mwh: f64,
    pub grid_mw: f64,
    pub land_used_acres: f64,
    pub total_capacity_mw: f64,
    pub firm_capacity_mw: f64,
}

impl EquipmentConfiguration {
    /// Build from unit counts; thermal MW follow from the catalog unit sizes.
    pub fn from_units(
        catalog: &EquipmentCatalog,
        n_recip: u32,
        n_turbine: u32,
        solar_mw: f64,
        bess_mw: f64,
        bess_mwh: f64,
        grid_mw: f64,
    ) -> Self {
        let mut config = Self {
            n_recip,
            recip_mw: n_recip as f64 * catalog.recip.unit_mw,
            n_turbine,
            turbine_mw: n_turbine as f64 * catalog.turbine.unit_mw,
            solar_mw,
            bess_mw,
            bess_mwh,
            grid_mw,
            ..Self::default()
        };
        config.refresh(catalog);
        config
    }

    /// Grid-only configuration.
    pub fn grid_only(catalog: &EquipmentCatalog, grid_mw: f64) -> Self {
        Self::from_units(catalog, 0, 0, 0.0, 0.0, 0.0, grid_mw)
    }

    /// Recompute land use and capacity aggregates from the quantities.
    ///
    /// Unit counts missing from hand-written input (zero count with nonzero
    /// MW) are recovered by rounding up against the catalog unit size.
    pub fn refresh(&mut self, catalog: &EquipmentCatalog) {
        if self.n_recip == 0 && self.recip_mw > 0.0 {
            self.n_recip = catalog.recip.units_for(self.recip_mw);
        }
        if self.n_turbine == 0 && self.turbine_mw > 0.0 {
            self.n_turbine = catalog.turbine.units_for(self.turbine_mw);
        }
        self.land_used_acres = self.recip_mw * catalog.recip.land_acres_per_mw
            + self.turbine_mw * catalog.turbine.land_acres_per_mw
            + self.solar_mw * catalog.solar.land_acres_per_mw
            + self.bess_mwh * catalog.battery.land_acres_per_mwh;
        self.firm_capacity_mw = self.recip_mw + self.turbine_mw + self.grid_mw;
        self.total_capacity_mw = self.firm_capacity_mw
            + self.solar_mw * catalog.solar.capacity_credit
            + self.bess_mw * catalog.battery.capacity_credit;
    }

    /// Sum of two configurations (existing fleet plus an expansion).
    pub fn merged_with(&self, other: &Self, catalog: &EquipmentCatalog) -> Self {
        let mut merged = Self {
            n_recip: self.n_recip + other.n_recip,
            recip_mw: self.recip_mw + other.recip_mw,
            n_turbine: self.n_turbine + other.n_turbine,
            turbine_mw: self.turbine_mw + other.turbine_mw,
            solar_mw: self.solar_mw + other.solar_mw,
            bess_mw: self.bess_mw + other.bess_mw,
            bess_mwh: self.bess_mwh + other.bess_mwh,
            grid_mw: self.grid_mw + other.grid_mw,
            ..Self::default()
        };
        merged.refresh(catalog);
        merged
    }

    /// Same on-site fleet with `grid_mw` of interconnect.
    pub fn with_grid(&self, catalog: &EquipmentCatalog, grid_mw: f64) -> Self {
        let mut config = Self {
            grid_mw,
            ..self.clone()
        };
        config.refresh(catalog);
        config
    }

    pub fn thermal_mw(&self) -> f64 {
        self.recip_mw + self.turbine_mw
    }

    pub fn capacity_mw(&self, tech: Technology) -> f64 {
        match tech {
            Technology::Recip => self.recip_mw,
            Technology::Turbine => self.turbine_mw,
            Technology::Bess => self.bess_mw,
            Technology::Solar => self.solar_mw,
            Technology::Grid => self.grid_mw,
        }
    }

    pub fn installed(&self, tech: Technology) -> bool {
        self.capacity_mw(tech) > 0.0
    }

    /// Technologies with nonzero capacity, in catalog order.
    pub fn installed_technologies(&self) -> Vec<Technology> {
        Technology::ALL
            .into_iter()
            .filter(|t| self.installed(*t))
            .collect()
    }

    /// Nameplate of the largest installed thermal unit (0 if none).
    pub fn largest_unit_mw(&self, catalog: &EquipmentCatalog) -> f64 {
        let recip = if self.n_recip > 0 {
            catalog.recip.unit_mw
        } else {
            0.0
        };
        let turbine = if self.n_turbine > 0 {
            catalog.turbine.unit_mw
        } else {
            0.0
        };
        recip.max(turbine)
    }

    pub fn is_empty(&self) -> bool {
        self.installed_technologies().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firm_excludes_solar_and_battery() {
        let catalog = EquipmentCatalog::default();
        let config = EquipmentConfiguration::from_units(&catalog, 10, 2, 100.0, 40.0, 160.0, 0.0);
        assert_eq!(config.recip_mw, 50.0);
        assert_eq!(config.turbine_mw, 40.0);
        assert_eq!(config.firm_capacity_mw, 90.0);
        assert!((config.total_capacity_mw - (90.0 + 100.0 * 0.25 + 40.0 * 0.25)).abs() < 1e-9);
        assert!(config.firm_capacity_mw <= config.total_capacity_mw);
    }

    #[test]
    fn test_solar_credit_follows_catalog() {
        let mut catalog = EquipmentCatalog::default();
        catalog.solar.capacity_credit = 0.4;
        let config = EquipmentConfiguration::from_units(&catalog, 0, 0, 50.0, 0.0, 0.0, 0.0);
        assert!((config.total_capacity_mw - 20.0).abs() < 1e-9);
        assert_eq!(config.firm_capacity_mw, 0.0);
    }

    #[test]
    fn test_land_accounting() {
        let catalog = EquipmentCatalog::default();
        let config = EquipmentConfiguration::from_units(&catalog, 2, 1, 10.0, 5.0, 20.0, 0.0);
        let expected = 10.0 * 0.5 + 20.0 * 0.3 + 10.0 * 5.0 + 20.0 * 0.01;
        assert!((config.land_used_acres - expected).abs() < 1e-9);
    }

    #[test]
    fn test_refresh_recovers_unit_counts() {
        let catalog = EquipmentCatalog::default();
        let mut existing = EquipmentConfiguration {
            recip_mw: 12.0,
            turbine_mw: 20.0,
            ..Default::default()
        };
        existing.refresh(&catalog);
        assert_eq!(existing.n_recip, 3);
        assert_eq!(existing.n_turbine, 1);
        assert_eq!(existing.firm_capacity_mw, 32.0);
    }

    #[test]
    fn test_merge_and_grid_helpers() {
        let catalog = EquipmentCatalog::default();
        let a = EquipmentConfiguration::from_units(&catalog, 4, 0, 0.0, 0.0, 0.0, 0.0);
        let b = EquipmentConfiguration::from_units(&catalog, 2, 1, 5.0, 0.0, 0.0, 0.0);
        let merged = a.merged_with(&b, &catalog);
        assert_eq!(merged.n_recip, 6);
        assert_eq!(merged.n_turbine, 1);
        assert_eq!(merged.firm_capacity_mw, 50.0);

        let supplemented = merged.with_grid(&catalog, 30.0);
        assert_eq!(supplemented.firm_capacity_mw, 80.0);
        assert_eq!(supplemented.n_recip, 6);

        let replaced = EquipmentConfiguration::grid_only(&catalog, 30.0);
        assert_eq!(replaced.thermal_mw(), 0.0);
        assert_eq!(replaced.installed_technologies(), vec![Technology::Grid]);
    }

    #[test]
    fn test_largest_unit() {
        let catalog = EquipmentCatalog::default();
        let recips = EquipmentConfiguration::from_units(&catalog, 3, 0, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(recips.largest_unit_mw(&catalog), 5.0);
        let both = EquipmentConfiguration::from_units(&catalog, 3, 1, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(both.largest_unit_mw(&catalog), 20.0);
        assert_eq!(EquipmentConfiguration::default().largest_unit_mw(&catalog), 0.0);
    }
}
