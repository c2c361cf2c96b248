//! Workload flexibility and demand-response programs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{PlanError, PlanResult};

/// Facility workload classes, each with a typical curtailable share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadClass {
    PreTraining,
    FineTuning,
    BatchInference,
    RealtimeInference,
    RlTraining,
    CloudHpc,
}

impl WorkloadClass {
    pub const ALL: [WorkloadClass; 6] = [
        WorkloadClass::PreTraining,
        WorkloadClass::FineTuning,
        WorkloadClass::BatchInference,
        WorkloadClass::RealtimeInference,
        WorkloadClass::RlTraining,
        WorkloadClass::CloudHpc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadClass::PreTraining => "pre_training",
            WorkloadClass::FineTuning => "fine_tuning",
            WorkloadClass::BatchInference => "batch_inference",
            WorkloadClass::RealtimeInference => "realtime_inference",
            WorkloadClass::RlTraining => "rl_training",
            WorkloadClass::CloudHpc => "cloud_hpc",
        }
    }

    /// Share of this class's load that can be curtailed on request.
    pub fn default_flexibility(&self) -> f64 {
        match self {
            WorkloadClass::PreTraining => 0.30,
            WorkloadClass::FineTuning => 0.50,
            WorkloadClass::BatchInference => 0.90,
            WorkloadClass::RealtimeInference => 0.05,
            WorkloadClass::RlTraining => 0.40,
            WorkloadClass::CloudHpc => 0.25,
        }
    }
}

impl fmt::Display for WorkloadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IT load split across workload classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadMix {
    /// Class → share of IT load. Shares should sum to 1.
    pub shares: BTreeMap<WorkloadClass, f64>,
    /// Per-class flexibility overrides
    pub flexibility: BTreeMap<WorkloadClass, f64>,
    /// Curtailable share of cooling load
    pub cooling_flexibility: f64,
}

impl Default for WorkloadMix {
    fn default() -> Self {
        Self {
            shares: BTreeMap::from([
                (WorkloadClass::PreTraining, 0.30),
                (WorkloadClass::FineTuning, 0.20),
                (WorkloadClass::BatchInference, 0.30),
                (WorkloadClass::RealtimeInference, 0.20),
            ]),
            flexibility: BTreeMap::new(),
            cooling_flexibility: 0.25,
        }
    }
}

impl WorkloadMix {
    pub fn validate(&self) -> PlanResult<()> {
        if self.shares.values().any(|s| !(0.0..=1.0).contains(s)) {
            return Err(PlanError::Validation(
                "workload shares must be within [0, 1]".into(),
            ));
        }
        let total: f64 = self.shares.values().sum();
        if (total - 1.0).abs() > 0.01 {
            return Err(PlanError::Validation(format!(
                "workload shares must sum to 1, got {total:.3}"
            )));
        }
        Ok(())
    }

    pub fn flexibility_of(&self, class: WorkloadClass) -> f64 {
        self.flexibility
            .get(&class)
            .copied()
            .unwrap_or_else(|| class.default_flexibility())
    }

    pub fn share_of(&self, class: WorkloadClass) -> f64 {
        self.shares.get(&class).copied().unwrap_or(0.0)
    }

    /// Flexible MW per class for an IT load of `peak_mw`.
    pub fn flexible_mw_by_class(&self, peak_mw: f64) -> BTreeMap<WorkloadClass, f64> {
        self.shares
            .iter()
            .map(|(class, share)| (*class, peak_mw * share * self.flexibility_of(*class)))
            .collect()
    }

    pub fn flexible_mw(&self, peak_mw: f64) -> f64 {
        self.flexible_mw_by_class(peak_mw).values().sum()
    }
}

/// Demand-response products a facility can enroll in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrService {
    SpinningReserve,
    NonSpinningReserve,
    EconomicDr,
    EmergencyDr,
}

impl DrService {
    pub const ALL: [DrService; 4] = [
        DrService::SpinningReserve,
        DrService::NonSpinningReserve,
        DrService::EconomicDr,
        DrService::EmergencyDr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrService::SpinningReserve => "spinning_reserve",
            DrService::NonSpinningReserve => "non_spinning_reserve",
            DrService::EconomicDr => "economic_dr",
            DrService::EmergencyDr => "emergency_dr",
        }
    }

    pub fn default_terms(&self) -> DrTerms {
        let (payment, activation, hours, min_mw) = match self {
            DrService::SpinningReserve => (15.0, 50.0, 50.0, 1.0),
            DrService::NonSpinningReserve => (8.0, 40.0, 100.0, 1.0),
            DrService::EconomicDr => (5.0, 100.0, 200.0, 0.5),
            DrService::EmergencyDr => (3.0, 200.0, 20.0, 0.1),
        };
        DrTerms {
            payment_per_mw_hr: payment,
            activation_per_mwh: activation,
            expected_hours: hours,
            min_capacity_mw: min_mw,
        }
    }
}

impl fmt::Display for DrService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commercial terms of one DR product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrTerms {
    /// Capacity payment ($/MW-hr of availability)
    pub payment_per_mw_hr: f64,
    /// Energy payment when dispatched ($/MWh)
    pub activation_per_mwh: f64,
    /// Expected activation hours per year
    pub expected_hours: f64,
    /// Smallest enrollable block (MW)
    pub min_capacity_mw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrConfig {
    pub services: Vec<DrService>,
    /// Per-service term overrides
    pub terms: BTreeMap<DrService, DrTerms>,
}

impl Default for DrConfig {
    fn default() -> Self {
        Self {
            services: DrService::ALL.to_vec(),
            terms: BTreeMap::new(),
        }
    }
}

impl DrConfig {
    pub fn terms_for(&self, service: DrService) -> DrTerms {
        self.terms
            .get(&service)
            .copied()
            .unwrap_or_else(|| service.default_terms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mix_validates() {
        assert!(WorkloadMix::default().validate().is_ok());
    }

    #[test]
    fn test_bad_shares_rejected() {
        let mix = WorkloadMix {
            shares: BTreeMap::from([(WorkloadClass::PreTraining, 0.5)]),
            ..WorkloadMix::default()
        };
        assert!(mix.validate().is_err());
    }

    #[test]
    fn test_flexible_mw() {
        let mix = WorkloadMix::default();
        // 100 × (0.3·0.3 + 0.2·0.5 + 0.3·0.9 + 0.2·0.05)
        assert!((mix.flexible_mw(100.0) - 47.0).abs() < 1e-9);
    }

    #[test]
    fn test_flexibility_override() {
        let mut mix = WorkloadMix::default();
        mix.flexibility.insert(WorkloadClass::BatchInference, 0.5);
        assert_eq!(mix.flexibility_of(WorkloadClass::BatchInference), 0.5);
        assert_eq!(mix.flexibility_of(WorkloadClass::FineTuning), 0.5);
    }

    #[test]
    fn test_dr_terms_default_and_override() {
        let mut config = DrConfig::default();
        assert_eq!(config.terms_for(DrService::SpinningReserve).payment_per_mw_hr, 15.0);
        config.terms.insert(
            DrService::EconomicDr,
            DrTerms {
                payment_per_mw_hr: 7.0,
                activation_per_mwh: 90.0,
                expected_hours: 150.0,
                min_capacity_mw: 2.0,
            },
        );
        assert_eq!(config.terms_for(DrService::EconomicDr).min_capacity_mw, 2.0);
    }
}
