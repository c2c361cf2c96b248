//! Facility load trajectory and hourly profiles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::catalog::HOURS_PER_YEAR;
use crate::{PlanError, PlanResult};

/// One point of a load ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadPoint {
    pub year: i32,
    pub peak_mw: f64,
}

/// Year → required peak facility load (MW).
///
/// Serialized as a list of [`LoadPoint`] so TOML run files can use
/// `[[load_trajectory]]` tables. Years need not be contiguous.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LoadPoint>", into = "Vec<LoadPoint>")]
pub struct LoadTrajectory {
    points: BTreeMap<i32, f64>,
}

impl From<Vec<LoadPoint>> for LoadTrajectory {
    fn from(points: Vec<LoadPoint>) -> Self {
        Self {
            points: points.into_iter().map(|p| (p.year, p.peak_mw)).collect(),
        }
    }
}

impl From<LoadTrajectory> for Vec<LoadPoint> {
    fn from(trajectory: LoadTrajectory) -> Self {
        trajectory
            .points
            .into_iter()
            .map(|(year, peak_mw)| LoadPoint { year, peak_mw })
            .collect()
    }
}

impl FromIterator<(i32, f64)> for LoadTrajectory {
    fn from_iter<I: IntoIterator<Item = (i32, f64)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl LoadTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-year trajectory.
    pub fn flat(year: i32, peak_mw: f64) -> Self {
        std::iter::once((year, peak_mw)).collect()
    }

    pub fn with_year(mut self, year: i32, peak_mw: f64) -> Self {
        self.points.insert(year, peak_mw);
        self
    }

    pub fn validate(&self) -> PlanResult<()> {
        if self.points.is_empty() {
            return Err(PlanError::Validation("load trajectory is empty".into()));
        }
        if let Some((year, mw)) = self
            .points
            .iter()
            .find(|(_, mw)| !mw.is_finite() || **mw < 0.0)
        {
            return Err(PlanError::Validation(format!(
                "load for {year} must be a non-negative number, got {mw}"
            )));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Largest load requested in *this* trajectory.
    pub fn peak_mw(&self) -> f64 {
        self.points.values().copied().fold(0.0, f64::max)
    }

    pub fn years(&self) -> Vec<i32> {
        self.points.keys().copied().collect()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.points.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.points.keys().next_back().copied()
    }

    pub fn load_for(&self, year: i32) -> Option<f64> {
        self.points.get(&year).copied()
    }

    /// Load for `year`, holding the last known value for gaps and years
    /// past the end, and the first value before the start.
    pub fn load_at_or_before(&self, year: i32) -> f64 {
        self.points
            .range(..=year)
            .next_back()
            .or_else(|| self.points.iter().next())
            .map(|(_, mw)| *mw)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.points.iter().map(|(y, mw)| (*y, *mw))
    }
}

/// Deterministic 8760-hour profile scaled to `peak_mw`.
///
/// Daily business-hours shape times a summer-peaking seasonal swing, floored
/// at 30% of peak and never above peak.
pub fn synthetic_profile(peak_mw: f64, load_factor: f64) -> Vec<f64> {
    const DAILY: [f64; 24] = [
        0.85, 0.82, 0.80, 0.78, 0.80, 0.85, 0.92, 0.98, 1.0, 1.0, 0.98, 0.96, 0.94, 0.96, 0.98,
        1.0, 0.98, 0.95, 0.92, 0.90, 0.88, 0.86, 0.85, 0.84,
    ];
    let base = peak_mw * load_factor * 0.8;
    (0..HOURS_PER_YEAR as usize)
        .map(|h| {
            let day = (h / 24) as f64;
            let seasonal = 0.95 + 0.10 * (2.0 * PI * (day - 172.0) / 365.0).sin();
            let mw = base + (peak_mw - base) * DAILY[h % 24] * seasonal;
            mw.clamp(peak_mw * 0.3, peak_mw)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_uses_this_trajectory_only() {
        let t = LoadTrajectory::new()
            .with_year(2027, 150.0)
            .with_year(2030, 600.0)
            .with_year(2029, 420.0);
        assert_eq!(t.peak_mw(), 600.0);
        assert_eq!(t.years(), vec![2027, 2029, 2030]);
        assert_eq!(t.first_year(), Some(2027));
        assert_eq!(t.last_year(), Some(2030));
    }

    #[test]
    fn test_empty_trajectory_rejected() {
        assert!(LoadTrajectory::new().validate().is_err());
        assert!(LoadTrajectory::flat(2027, -5.0).validate().is_err());
        assert!(LoadTrajectory::flat(2027, 5.0).validate().is_ok());
    }

    #[test]
    fn test_gap_years_hold_last_value() {
        let t = LoadTrajectory::new().with_year(2027, 100.0).with_year(2030, 300.0);
        assert_eq!(t.load_at_or_before(2026), 100.0);
        assert_eq!(t.load_at_or_before(2028), 100.0);
        assert_eq!(t.load_at_or_before(2035), 300.0);
    }

    #[test]
    fn test_serializes_as_point_list() {
        let t = LoadTrajectory::flat(2028, 250.0);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"[{"year":2028,"peak_mw":250.0}]"#);
        let back: LoadTrajectory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_synthetic_profile_bounds() {
        let profile = synthetic_profile(200.0, 0.7);
        assert_eq!(profile.len(), 8760);
        assert!(profile.iter().all(|mw| *mw >= 60.0 && *mw <= 200.0));
        let max = profile.iter().copied().fold(0.0, f64::max);
        assert!(max > 190.0);
    }
}
