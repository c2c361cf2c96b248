//! Heuristic tuning constants
//!
//! Ratios the heuristic strategies depend on. None of them are derived from
//! physics. They are exposed so a run file can override any single value:
//!
//! ```toml
//! [tuning]
//! eligible_flex_fraction = 0.75
//! ```

use serde::{Deserialize, Serialize};

use crate::constraint::StatusThresholds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicTuning {
    /// Recip share of thermal used to blend rates in the limit calculator
    pub recip_blend: f64,
    /// Capacity factor used to translate annual caps into MW ceilings
    pub limit_capacity_factor: f64,

    /// Annual capacity factor assumed for recip generation in LCOE
    pub recip_capacity_factor: f64,
    /// Annual capacity factor assumed for turbine generation in LCOE
    pub turbine_capacity_factor: f64,

    /// Share of firm need assigned to baseload recips before turbines
    pub baseload_fraction: f64,
    /// Recips may use at most this share of the thermal ceiling
    pub recip_ceiling_share: f64,
    /// Battery power as a share of the target load
    pub bess_power_fraction: f64,
    /// Solar MW cap as a share of the target load
    pub max_solar_fraction: f64,

    /// Greenfield annual energy = peak × 8760 × this
    pub greenfield_load_factor: f64,
    /// Brownfield and land-development annual energy = load × 8760 × this
    pub expansion_load_factor: f64,
    /// Brownfield expansion is capped at peak × this
    pub brownfield_expansion_fraction: f64,

    /// LCOE above this is clamped and flagged ($/MWh)
    pub lcoe_error_threshold: f64,
    /// LCOE above this is flagged ($/MWh)
    pub lcoe_warning_threshold: f64,
    /// Positive LCOE below this is flagged as unrealistic ($/MWh)
    pub lcoe_min_realistic: f64,

    /// Share of flexible MW that can actually be enrolled in DR programs
    pub eligible_flex_fraction: f64,
    /// How much of workload flexibility lines up with thermal limit hours
    pub flex_alignment: f64,
    /// Flexibility levels evaluated by land development
    pub flex_scenarios: Vec<f64>,

    /// Utilization at or above which a constraint is binding
    pub binding_threshold: f64,
    /// Utilization above which a constraint is near binding
    pub near_binding_threshold: f64,
}

impl Default for HeuristicTuning {
    fn default() -> Self {
        Self {
            recip_blend: 0.70,
            limit_capacity_factor: 0.70,
            recip_capacity_factor: 0.85,
            turbine_capacity_factor: 0.30,
            baseload_fraction: 0.70,
            recip_ceiling_share: 0.80,
            bess_power_fraction: 0.10,
            max_solar_fraction: 0.25,
            greenfield_load_factor: 0.70,
            expansion_load_factor: 0.85,
            brownfield_expansion_fraction: 0.50,
            lcoe_error_threshold: 500.0,
            lcoe_warning_threshold: 200.0,
            lcoe_min_realistic: 30.0,
            eligible_flex_fraction: 0.80,
            flex_alignment: 0.70,
            flex_scenarios: vec![0.0, 0.15, 0.30, 0.50],
            binding_threshold: 0.95,
            near_binding_threshold: 0.80,
        }
    }
}

impl HeuristicTuning {
    pub fn status_thresholds(&self) -> StatusThresholds {
        StatusThresholds {
            binding: self.binding_threshold,
            near_binding: self.near_binding_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_override() {
        let tuning: HeuristicTuning = toml::from_str("eligible_flex_fraction = 0.75").unwrap();
        assert_eq!(tuning.eligible_flex_fraction, 0.75);
        assert_eq!(tuning.flex_alignment, 0.70);
        assert_eq!(tuning.flex_scenarios.len(), 4);
    }
}
