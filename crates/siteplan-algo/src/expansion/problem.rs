//! Capacity expansion problem data
//!
//! Everything the formulation needs, resolved from user inputs: the planning
//! years, the sampled representative hours with their weights, per-year
//! hourly load and required energy, and the bounds on every build decision.

use serde::{Deserialize, Serialize};

use siteplan_core::{
    synthetic_profile, DrConfig, EconomicParams, EquipmentCatalog, EquipmentConfiguration,
    HeuristicTuning, LoadTrajectory, PlanError, PlanResult, Site, SiteConstraints, WorkloadClass, WorkloadMix,
    HOURS_PER_YEAR,
};

pub const HOURS_PER_WEEK: usize = 168;

/// Months from the first planning year until grid service, when nothing
/// else names a grid year.
pub const DEFAULT_GRID_LEAD_MONTHS: i32 = 96;

/// Afternoon/evening window DR capacity must be deliverable in.
pub const PEAK_HOURS: std::ops::RangeInclusive<usize> = 16..=21;

/// A sampled week standing in for `weight` weeks of the year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepresentativeWeek {
    pub name: &'static str,
    /// Day of year (0-based) the week starts on
    pub start_day: usize,
    pub weight: f64,
}

pub const REPRESENTATIVE_WEEKS: [RepresentativeWeek; 3] = [
    RepresentativeWeek {
        name: "summer_peak",
        start_day: 200,
        weight: 20.0,
    },
    RepresentativeWeek {
        name: "winter_typical",
        start_day: 340,
        weight: 20.0,
    },
    RepresentativeWeek {
        name: "spring_typical",
        start_day: 100,
        weight: 12.0,
    },
];

/// One modeled hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledHour {
    /// Index into the 8760-hour year
    pub hour_of_year: usize,
    pub hour_of_day: usize,
    /// Weeks of the year this hour represents
    pub weight: f64,
    /// First hour of its week (battery state resets here)
    pub week_start: bool,
}

impl SampledHour {
    pub fn is_peak(&self) -> bool {
        PEAK_HOURS.contains(&self.hour_of_day)
    }
}

/// Hours of every representative week, in week order.
pub fn representative_hours() -> Vec<SampledHour> {
    let hours_per_year = HOURS_PER_YEAR as usize;
    REPRESENTATIVE_WEEKS
        .iter()
        .flat_map(|week| {
            (0..HOURS_PER_WEEK).map(move |h| {
                let hour_of_year = (week.start_day * 24 + h) % hours_per_year;
                SampledHour {
                    hour_of_year,
                    hour_of_day: hour_of_year % 24,
                    weight: week.weight,
                    week_start: h == 0,
                }
            })
        })
        .collect()
}

/// Per-hour solar output per MW-DC: a daylight half-sine scaled so the daily
/// mean equals `capacity_factor`.
pub fn solar_availability(hour_of_day: usize, capacity_factor: f64) -> f64 {
    if !(6..=18).contains(&hour_of_day) {
        return 0.0;
    }
    let shape = (std::f64::consts::PI * (hour_of_day as f64 - 6.0) / 12.0).sin();
    // Daily mean of the half-sine over 24 h is 1/π.
    (shape * capacity_factor * std::f64::consts::PI).clamp(0.0, 1.0)
}

/// Interconnect availability and size.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConnection {
    /// First year grid power can flow (overrides the site constraint)
    pub available_year: Option<i32>,
    /// Largest interconnect (MW); also the big-M for the activation binary
    pub max_mw: Option<f64>,
}

/// Upper bounds and operating limits of the formulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionLimits {
    pub max_recip_units: u32,
    pub max_turbine_units: u32,
    pub max_bess_mwh: f64,
    pub max_bess_mw: f64,
    pub max_solar_mw: f64,
    /// Largest share of hourly load that may be curtailed
    pub max_hourly_curtailment: f64,
    /// Largest share of annual required energy that may be curtailed
    pub max_annual_curtailment: f64,
    /// Load factor of the synthetic profile used when none is supplied
    pub synthetic_load_factor: f64,
    /// Load percentile the N-1 constraint protects
    pub n1_load_percentile: f64,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            max_recip_units: 100,
            max_turbine_units: 30,
            max_bess_mwh: 2000.0,
            max_bess_mw: 500.0,
            max_solar_mw: 500.0,
            max_hourly_curtailment: 0.15,
            max_annual_curtailment: 0.01,
            synthetic_load_factor: 0.70,
            n1_load_percentile: 0.98,
        }
    }
}

/// User-facing MILP inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionInputs {
    pub site: Site,
    pub constraints: SiteConstraints,
    pub catalog: EquipmentCatalog,
    pub economics: EconomicParams,
    pub load_trajectory: LoadTrajectory,
    /// 8760 hourly facility load shape; scaled so its maximum is each
    /// year's peak
    pub load_profile: Option<Vec<f64>>,
    pub workload_mix: WorkloadMix,
    /// Planning years; the trajectory's years when empty
    pub years: Vec<i32>,
    pub dr: Option<DrConfig>,
    pub existing: Option<EquipmentConfiguration>,
    pub grid: GridConnection,
    /// Keep firm capacity above the high-percentile load after losing the
    /// largest unit
    pub require_n1: bool,
    pub limits: ExpansionLimits,
    /// Status thresholds and LCOE bounds used when reporting the solution
    pub tuning: HeuristicTuning,
}

/// Curtailable MW per unit of facility load, by workload class, plus cooling.
#[derive(Debug, Clone, PartialEq)]
pub struct CurtailmentShares {
    pub classes: Vec<(WorkloadClass, f64)>,
    pub cooling: f64,
}

impl CurtailmentShares {
    /// IT load is `load / PUE`; cooling is the rest.
    pub fn new(mix: &WorkloadMix, pue: f64) -> Self {
        let pue = pue.max(1.0);
        let classes = mix
            .shares
            .iter()
            .map(|(class, share)| (*class, mix.flexibility_of(*class) * share / pue))
            .filter(|(_, f)| *f > 0.0)
            .collect();
        Self {
            classes,
            cooling: mix.cooling_flexibility * (pue - 1.0) / pue,
        }
    }
}

/// Resolved problem, ready to formulate.
#[derive(Debug, Clone)]
pub struct ExpansionProblem {
    pub inputs: ExpansionInputs,
    pub years: Vec<i32>,
    pub hours: Vec<SampledHour>,
    /// Per year, MW for each sampled hour
    pub hourly_load: Vec<Vec<f64>>,
    /// Per year, full-year required energy (MWh)
    pub required_energy: Vec<f64>,
    /// Per year, load the N-1 constraint protects (MW)
    pub n1_load: Vec<f64>,
    pub grid_year: i32,
    pub grid_max_mw: f64,
    pub existing: EquipmentConfiguration,
    pub dr: DrConfig,
    pub curtailment: CurtailmentShares,
}

impl ExpansionProblem {
    pub fn from_inputs(inputs: ExpansionInputs) -> PlanResult<Self> {
        inputs.load_trajectory.validate()?;
        inputs.constraints.validate()?;
        inputs.workload_mix.validate()?;

        let years = if inputs.years.is_empty() {
            inputs.load_trajectory.years()
        } else {
            let mut years = inputs.years.clone();
            years.sort_unstable();
            years.dedup();
            years
        };
        let first_year = years
            .first()
            .copied()
            .ok_or_else(|| PlanError::Validation("no planning years".into()))?;

        let shape = normalized_shape(inputs.load_profile.as_deref(), &inputs.limits)?;
        let shape_energy: f64 = shape.iter().sum();
        let hours = representative_hours();

        let mut hourly_load = Vec::with_capacity(years.len());
        let mut required_energy = Vec::with_capacity(years.len());
        let mut n1_load = Vec::with_capacity(years.len());
        let n1_shape = percentile(&shape, inputs.limits.n1_load_percentile);
        for &year in &years {
            let peak = inputs.load_trajectory.load_at_or_before(year);
            hourly_load.push(hours.iter().map(|h| peak * shape[h.hour_of_year]).collect());
            required_energy.push(peak * shape_energy);
            n1_load.push(peak * n1_shape);
        }

        let grid_year = inputs
            .grid
            .available_year
            .or(inputs.constraints.grid_available_year)
            .unwrap_or(first_year + DEFAULT_GRID_LEAD_MONTHS / 12);
        let grid_max_mw = inputs.grid.max_mw.unwrap_or(if inputs.constraints.grid_capacity_mw > 0.0 {
            inputs.constraints.grid_capacity_mw
        } else {
            inputs.catalog.grid.max_mw
        });

        let mut existing = inputs.existing.clone().unwrap_or_default();
        existing.refresh(&inputs.catalog);
        let dr = inputs.dr.clone().unwrap_or_else(|| DrConfig {
            services: Vec::new(),
            ..DrConfig::default()
        });
        let curtailment = CurtailmentShares::new(&inputs.workload_mix, inputs.site.pue);

        Ok(Self {
            years,
            hours,
            hourly_load,
            required_energy,
            n1_load,
            grid_year,
            grid_max_mw,
            existing,
            dr,
            curtailment,
            inputs,
        })
    }

    pub fn first_year(&self) -> i32 {
        self.years.first().copied().unwrap_or_default()
    }

    /// Present-value factor for planning year `index`.
    pub fn discount(&self, index: usize) -> f64 {
        let offset = (self.years[index] - self.first_year()) as f64;
        self.inputs.economics.discount_factor(offset)
    }

    pub fn grid_allowed(&self, index: usize) -> bool {
        self.existing.grid_mw > 0.0 || self.years[index] >= self.grid_year
    }

    /// Rough size of the formulation, for logging.
    pub fn variable_count(&self) -> usize {
        let per_hour = 8 + self.curtailment.classes.len();
        self.years.len() * (8 + self.dr.services.len() + self.hours.len() * per_hour)
    }
}

fn normalized_shape(profile: Option<&[f64]>, limits: &ExpansionLimits) -> PlanResult<Vec<f64>> {
    let hours = HOURS_PER_YEAR as usize;
    let Some(profile) = profile else {
        return Ok(synthetic_profile(1.0, limits.synthetic_load_factor));
    };
    if profile.len() != hours {
        return Err(PlanError::Validation(format!(
            "load profile must have {hours} hourly values, got {}",
            profile.len()
        )));
    }
    if profile.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(PlanError::Validation(
            "load profile values must be non-negative numbers".into(),
        ));
    }
    let max = profile.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return Err(PlanError::Validation("load profile is all zero".into()));
    }
    Ok(profile.iter().map(|v| v / max).collect())
}

fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank]
}
