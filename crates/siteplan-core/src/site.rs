//! Site descriptor and per-run site constraints.

use serde::{Deserialize, Serialize};

use crate::{PlanError, PlanResult};

/// Descriptive site data. Nothing here is optimized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    pub name: String,
    pub location: Option<String>,
    /// Power usage effectiveness of the facility (total / IT load)
    pub pue: f64,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            name: "unnamed site".to_string(),
            location: None,
            pue: 1.25,
        }
    }
}

/// Hard limits supplied for one optimization run.
///
/// The optimizer reads these and never writes them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConstraints {
    /// Annual NOx cap (short tons per year)
    pub nox_tpy: f64,
    /// Firm gas delivery (MCF/day)
    pub gas_mcf_day: f64,
    /// Buildable land (acres)
    pub land_acres: f64,
    /// Size firm capacity with a reserve margin
    pub n_minus_1_required: bool,
    /// Reserve margin applied when `n_minus_1_required` (0.15 = 15%)
    pub reserve_margin: f64,
    /// Minimum system availability (0.995 = 99.5%)
    pub min_availability: f64,
    /// Grid interconnect the utility has offered (MW), if any
    pub grid_capacity_mw: f64,
    /// First calendar year the interconnect can carry load
    pub grid_available_year: Option<i32>,
}

impl Default for SiteConstraints {
    fn default() -> Self {
        Self {
            nox_tpy: 100.0,
            gas_mcf_day: 50_000.0,
            land_acres: 500.0,
            n_minus_1_required: true,
            reserve_margin: 0.15,
            min_availability: 0.995,
            grid_capacity_mw: 0.0,
            grid_available_year: None,
        }
    }
}

impl SiteConstraints {
    pub fn validate(&self) -> PlanResult<()> {
        let caps = [
            ("nox_tpy", self.nox_tpy),
            ("gas_mcf_day", self.gas_mcf_day),
            ("land_acres", self.land_acres),
            ("reserve_margin", self.reserve_margin),
            ("grid_capacity_mw", self.grid_capacity_mw),
        ];
        for (name, value) in caps {
            if !value.is_finite() || value < 0.0 {
                return Err(PlanError::Validation(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.min_availability) {
            return Err(PlanError::Validation(format!(
                "min_availability must be within [0, 1], got {}",
                self.min_availability
            )));
        }
        Ok(())
    }

    /// Reserve factor applied to the target load (1.0 when N-1 is off).
    pub fn reserve_factor(&self) -> f64 {
        if self.n_minus_1_required {
            1.0 + self.reserve_margin
        } else {
            1.0
        }
    }
}
