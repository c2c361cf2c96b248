//! Year-by-year deployment stacks.
//!
//! Before the grid year the on-site fleet is replicated and grid is zero.
//! From the grid year the archetype's [`GridPolicy`] decides what happens to
//! the on-site fleet:
//!
//! ```text
//! Replace     on-site → 0,   grid = load × (1 + reserve)
//! Supplement  on-site kept,  grid = max(0, load × (1 + reserve) − thermal)
//! ```
//!
//! [`energy_stack`] is the on-site counterpart: it grows a fleet through the
//! load trajectory and levelizes cost over every year at once.
//!
//! ```text
//! blended LCOE = Σ_y annual_cost_y / Σ_y delivered_y
//! ```

use serde::{Deserialize, Serialize};

use siteplan_core::{
    AnnualStack, EquipmentConfiguration, GridPolicy, StackYear, HOURS_PER_YEAR,
};

use crate::heuristic::PlanningInputs;
use crate::lcoe::{LcoeBreakdown, Levelized};
use crate::sizing::SizingRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackOptions {
    pub base_year: i32,
    /// Years from the base year until the grid connects, when the site
    /// constraints do not name a grid year
    pub grid_lead_years: i32,
    pub horizon_years: u32,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            base_year: 2025,
            grid_lead_years: 5,
            horizon_years: 15,
        }
    }
}

pub struct AnnualStackGenerator<'a> {
    inputs: &'a PlanningInputs,
    options: StackOptions,
}

impl<'a> AnnualStackGenerator<'a> {
    pub fn new(inputs: &'a PlanningInputs, options: StackOptions) -> Self {
        Self { inputs, options }
    }

    pub fn grid_year(&self) -> i32 {
        self.inputs
            .constraints
            .grid_available_year
            .unwrap_or(self.options.base_year + self.options.grid_lead_years)
    }

    /// Equipment for one year under `policy`.
    pub fn equipment_for_year(
        &self,
        onsite: &EquipmentConfiguration,
        year: i32,
        load_mw: f64,
        policy: GridPolicy,
    ) -> EquipmentConfiguration {
        let catalog = &self.inputs.catalog;
        if year < self.grid_year() {
            return onsite.with_grid(catalog, 0.0);
        }
        let need = load_mw * self.inputs.constraints.reserve_factor();
        match policy {
            GridPolicy::Replace => EquipmentConfiguration::grid_only(catalog, need),
            GridPolicy::Supplement => {
                onsite.with_grid(catalog, (need - onsite.thermal_mw()).max(0.0))
            }
        }
    }

    pub fn generate(&self, onsite: &EquipmentConfiguration, policy: GridPolicy) -> AnnualStack {
        let trajectory = &self.inputs.load_trajectory;
        let calc = self.inputs.lcoe_calculator();
        let load_factor = self.inputs.tuning.greenfield_load_factor;

        let years = (0..self.options.horizon_years as i32)
            .map(|offset| {
                let year = self.options.base_year + offset;
                let load_mw = trajectory.load_at_or_before(year);
                let equipment = self.equipment_for_year(onsite, year, load_mw, policy);
                let lcoe = calc
                    .calculate_lcoe(&equipment, load_mw * HOURS_PER_YEAR * load_factor)
                    .lcoe;
                StackYear {
                    year,
                    load_mw,
                    grid_available: year >= self.grid_year(),
                    equipment,
                    lcoe,
                }
            })
            .collect();

        AnnualStack {
            base_year: self.options.base_year,
            grid_year: self.grid_year(),
            policy,
            years,
        }
    }
}

/// One trajectory year of a multi-year build-out.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyYear {
    pub year: i32,
    pub load_mw: f64,
    pub equipment: EquipmentConfiguration,
    pub breakdown: LcoeBreakdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyStack {
    pub years: Vec<EnergyYear>,
    pub blended: Levelized,
}

impl EnergyStack {
    pub fn final_year(&self) -> Option<&EnergyYear> {
        self.years.last()
    }

    pub fn final_equipment(&self) -> Option<&EquipmentConfiguration> {
        self.final_year().map(|y| &y.equipment)
    }
}

/// Grow `base` through every trajectory year.
///
/// Each year sizes only the firm shortfall against that year's load (with
/// the reserve margin when `request.require_n1`), and nothing is retired,
/// so capacity never decreases. `request` supplies the sizing flags; its
/// target is replaced per year.
pub fn energy_stack(
    inputs: &PlanningInputs,
    base: &EquipmentConfiguration,
    request: &SizingRequest,
    load_factor: f64,
) -> EnergyStack {
    let catalog = &inputs.catalog;
    let sizer = inputs.sizer();
    let calc = inputs.lcoe_calculator();
    let reserve = if request.require_n1 {
        inputs.constraints.reserve_factor()
    } else {
        1.0
    };

    let mut fleet = base.clone();
    fleet.refresh(catalog);
    let mut years = Vec::new();
    let mut total_cost = 0.0;
    let mut total_delivered = 0.0;

    for year in inputs.load_trajectory.years() {
        let load_mw = inputs.load_trajectory.load_at_or_before(year);
        let shortfall = load_mw * reserve - fleet.firm_capacity_mw;
        if shortfall > 1e-9 {
            let addition = sizer.size_equipment_to_load(&SizingRequest {
                target_mw: shortfall,
                ..request.clone()
            }
            .without_n1());
            fleet = fleet.merged_with(&addition, catalog);
        }
        let breakdown = calc.calculate_lcoe(&fleet, load_mw * HOURS_PER_YEAR * load_factor);
        total_cost += breakdown.annual_cost;
        total_delivered += breakdown.energy_delivered_mwh;
        years.push(EnergyYear {
            year,
            load_mw,
            equipment: fleet.clone(),
            breakdown,
        });
    }

    EnergyStack {
        years,
        blended: calc.levelize(total_cost, total_delivered),
    }
}
