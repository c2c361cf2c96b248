//! Per-constraint status records.
//!
//! Each checked constraint produces one [`ConstraintStatus`] with its
//! utilization and a coarse state used for reporting:
//!
//! ```text
//! utilization = value / limit
//!
//! VIOLATED      value > limit × (1 + tolerance)
//! BINDING       utilization ≥ 0.95
//! NEAR_BINDING  utilization > 0.80
//! SLACK         otherwise
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard constraints tolerate only rounding noise; soft ones may be exceeded
/// by their tolerance before they count as violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Hard,
    Soft,
}

impl ConstraintKind {
    pub fn default_tolerance(&self) -> f64 {
        match self {
            ConstraintKind::Hard => 0.0001,
            ConstraintKind::Soft => 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintState {
    Violated,
    Binding,
    NearBinding,
    Slack,
}

impl fmt::Display for ConstraintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstraintState::Violated => "VIOLATED",
            ConstraintState::Binding => "BINDING",
            ConstraintState::NearBinding => "NEAR_BINDING",
            ConstraintState::Slack => "SLACK",
        };
        f.write_str(s)
    }
}

/// Utilization cut-offs for [`ConstraintState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusThresholds {
    pub binding: f64,
    pub near_binding: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            binding: 0.95,
            near_binding: 0.80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintStatus {
    pub name: String,
    pub value: f64,
    pub limit: f64,
    pub unit: String,
    pub kind: ConstraintKind,
    pub tolerance: f64,
    pub utilization: f64,
    pub binding: bool,
    pub violated: bool,
    pub status: ConstraintState,
}

impl ConstraintStatus {
    pub fn evaluate(
        name: impl Into<String>,
        unit: impl Into<String>,
        value: f64,
        limit: f64,
        kind: ConstraintKind,
        thresholds: StatusThresholds,
    ) -> Self {
        let tolerance = kind.default_tolerance();
        let utilization = if limit > 0.0 { value / limit } else { 0.0 };
        // A zero limit with positive use is still a breach.
        let violated = if limit > 0.0 {
            value > limit * (1.0 + tolerance)
        } else {
            value > 0.0
        };
        let binding = utilization >= thresholds.binding;
        let status = if violated {
            ConstraintState::Violated
        } else if binding {
            ConstraintState::Binding
        } else if utilization > thresholds.near_binding {
            ConstraintState::NearBinding
        } else {
            ConstraintState::Slack
        };
        Self {
            name: name.into(),
            value,
            limit,
            unit: unit.into(),
            kind,
            tolerance,
            utilization,
            binding,
            violated,
            status,
        }
    }

    pub fn headroom(&self) -> f64 {
        self.limit - self.value
    }
}
