//! Technology catalog
//!
//! Static parameters for every technology class the planner can install.
//! The catalog is loaded once per run and treated as read-only afterwards.
//! Every section is optional in a run file. Battery, solar and grid sections
//! may override single fields; a thermal section replaces the unit whole,
//! since recip and turbine share one spec type with different defaults.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Higher heating value of pipeline gas (Btu per MCF).
pub const GAS_HHV_BTU_PER_MCF: f64 = 1_037_000.0;

/// Hours in a (non-leap) year.
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Pounds per short ton.
pub const LB_PER_TON: f64 = 2000.0;

/// Technology classes known to the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technology {
    /// Reciprocating gas engine
    Recip,
    /// Simple-cycle gas turbine
    Turbine,
    /// Battery energy storage
    Bess,
    /// Ground-mount solar PV
    Solar,
    /// Utility interconnect
    Grid,
}

impl Technology {
    pub const ALL: [Technology; 5] = [
        Technology::Recip,
        Technology::Turbine,
        Technology::Bess,
        Technology::Solar,
        Technology::Grid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Technology::Recip => "recip",
            Technology::Turbine => "turbine",
            Technology::Bess => "bess",
            Technology::Solar => "solar",
            Technology::Grid => "grid",
        }
    }

    /// Dispatchable on demand. Only these count toward firm capacity.
    pub fn is_firm(&self) -> bool {
        matches!(self, Technology::Recip | Technology::Turbine | Technology::Grid)
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gas-fired unit (recip engine or turbine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalSpec {
    /// Nameplate of one unit (MW)
    pub unit_mw: f64,
    /// Full-load heat rate (Btu/kWh)
    pub heat_rate_btu_kwh: f64,
    /// NOx emission rate (lb/MMBtu of fuel burned)
    pub nox_lb_per_mmbtu: f64,
    /// Fraction of nameplate deliverable on average
    pub availability: f64,
    pub capex_per_kw: f64,
    pub vom_per_mwh: f64,
    pub fom_per_kw_yr: f64,
    pub land_acres_per_mw: f64,
    pub lead_time_months: u32,
}

impl ThermalSpec {
    pub fn recip() -> Self {
        Self {
            unit_mw: 5.0,
            heat_rate_btu_kwh: 7700.0,
            nox_lb_per_mmbtu: 0.099,
            availability: 0.97,
            capex_per_kw: 1650.0,
            vom_per_mwh: 8.5,
            fom_per_kw_yr: 18.5,
            land_acres_per_mw: 0.5,
            lead_time_months: 18,
        }
    }

    pub fn turbine() -> Self {
        Self {
            unit_mw: 20.0,
            heat_rate_btu_kwh: 8500.0,
            nox_lb_per_mmbtu: 0.05,
            availability: 0.95,
            capex_per_kw: 1300.0,
            vom_per_mwh: 6.5,
            fom_per_kw_yr: 12.5,
            land_acres_per_mw: 0.3,
            lead_time_months: 24,
        }
    }

    /// Fuel burned per MWh generated (MMBtu/MWh).
    pub fn mmbtu_per_mwh(&self) -> f64 {
        self.heat_rate_btu_kwh / 1000.0
    }

    /// Gas volume per MWh generated (MCF/MWh).
    pub fn mcf_per_mwh(&self) -> f64 {
        self.heat_rate_btu_kwh * 1000.0 / GAS_HHV_BTU_PER_MCF
    }

    /// NOx per MWh generated (lb/MWh).
    pub fn nox_lb_per_mwh(&self) -> f64 {
        self.mmbtu_per_mwh() * self.nox_lb_per_mmbtu
    }

    /// Whole units needed to reach `mw`, rounding up.
    pub fn units_for(&self, mw: f64) -> u32 {
        if mw <= 0.0 || self.unit_mw <= 0.0 {
            return 0;
        }
        // Guard against 690.0000000001 / 5.0 rounding one unit too high.
        (mw / self.unit_mw - 1e-9).ceil().max(0.0) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatterySpec {
    /// Energy-to-power ratio (hours). Fixed so sizing stays linear.
    pub duration_hours: f64,
    /// One-way efficiency applied on charge and (inverted) on discharge
    pub charge_efficiency: f64,
    pub capex_per_kwh: f64,
    pub land_acres_per_mwh: f64,
    pub lead_time_months: u32,
    /// Degradation cost per kWh cycled ($/kWh)
    pub degradation_per_kwh: f64,
    pub cycles_per_year: f64,
    /// Share of battery MW credited toward total (never firm) capacity
    pub capacity_credit: f64,
    pub min_soc_fraction: f64,
    pub initial_soc_fraction: f64,
}

impl Default for BatterySpec {
    fn default() -> Self {
        Self {
            duration_hours: 4.0,
            charge_efficiency: 0.92,
            capex_per_kwh: 236.0,
            land_acres_per_mwh: 0.01,
            lead_time_months: 12,
            degradation_per_kwh: 0.03,
            cycles_per_year: 365.0,
            capacity_credit: 0.25,
            min_soc_fraction: 0.10,
            initial_soc_fraction: 0.50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarSpec {
    pub capex_per_w_dc: f64,
    pub capacity_factor: f64,
    pub land_acres_per_mw: f64,
    pub vom_per_mwh: f64,
    pub lead_time_months: u32,
    /// Share of DC nameplate counted toward total capacity
    pub capacity_credit: f64,
}

impl Default for SolarSpec {
    fn default() -> Self {
        Self {
            capex_per_w_dc: 0.95,
            capacity_factor: 0.25,
            land_acres_per_mw: 5.0,
            vom_per_mwh: 2.0,
            lead_time_months: 12,
            capacity_credit: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// One-time interconnection cost ($), incurred when any grid MW is used
    pub interconnect_capex: f64,
    pub energy_price_mwh: f64,
    pub availability: f64,
    pub lead_time_months: u32,
    /// Largest interconnect the utility will grant (MW)
    pub max_mw: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            interconnect_capex: 5_000_000.0,
            energy_price_mwh: 75.0,
            availability: 1.0,
            lead_time_months: 60,
            max_mw: 500.0,
        }
    }
}

/// Full technology catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentCatalog {
    pub recip: ThermalSpec,
    pub turbine: ThermalSpec,
    pub battery: BatterySpec,
    pub solar: SolarSpec,
    pub grid: GridSpec,
}

impl Default for EquipmentCatalog {
    fn default() -> Self {
        Self {
            recip: ThermalSpec::recip(),
            turbine: ThermalSpec::turbine(),
            battery: BatterySpec::default(),
            solar: SolarSpec::default(),
            grid: GridSpec::default(),
        }
    }
}

impl EquipmentCatalog {
    pub fn lead_time_months(&self, tech: Technology) -> u32 {
        match tech {
            Technology::Recip => self.recip.lead_time_months,
            Technology::Turbine => self.turbine.lead_time_months,
            Technology::Bess => self.battery.lead_time_months,
            Technology::Solar => self.solar.lead_time_months,
            Technology::Grid => self.grid.lead_time_months,
        }
    }

    /// Thermal spec for a gas technology, `None` for the others.
    pub fn thermal(&self, tech: Technology) -> Option<&ThermalSpec> {
        match tech {
            Technology::Recip => Some(&self.recip),
            Technology::Turbine => Some(&self.turbine),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_conversions() {
        let recip = ThermalSpec::recip();
        assert!((recip.mmbtu_per_mwh() - 7.7).abs() < 1e-12);
        // 7.7 MMBtu / 1.037 MMBtu per MCF
        assert!((recip.mcf_per_mwh() - 7.7 / 1.037).abs() < 1e-9);
        assert!((recip.nox_lb_per_mwh() - 7.7 * 0.099).abs() < 1e-12);
    }

    #[test]
    fn test_units_for_rounds_up() {
        let recip = ThermalSpec::recip();
        assert_eq!(recip.units_for(0.0), 0);
        assert_eq!(recip.units_for(5.0), 1);
        assert_eq!(recip.units_for(5.1), 2);
        assert_eq!(recip.units_for(690.0 + 1e-10), 138);
    }

    #[test]
    fn test_firm_technologies() {
        let firm: Vec<_> = Technology::ALL.iter().filter(|t| t.is_firm()).collect();
        assert_eq!(firm, vec![&Technology::Recip, &Technology::Turbine, &Technology::Grid]);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let catalog: EquipmentCatalog =
            toml::from_str("[grid]\nlead_time_months = 36\n\n[solar]\ncapacity_factor = 0.22\n")
                .unwrap();
        assert_eq!(catalog.grid.lead_time_months, 36);
        assert_eq!(catalog.grid.energy_price_mwh, GridSpec::default().energy_price_mwh);
        assert_eq!(catalog.solar.capacity_factor, 0.22);
        assert_eq!(catalog.recip, ThermalSpec::recip());
        assert_eq!(catalog.turbine, ThermalSpec::turbine());
    }

    #[test]
    fn test_thermal_section_requires_all_fields() {
        let partial = toml::from_str::<EquipmentCatalog>("[turbine]\nunit_mw = 30.0\n");
        assert!(partial.is_err());
    }
}
