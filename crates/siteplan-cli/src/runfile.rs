//! Run files: TOML or JSON, chosen by extension.
//!
//! Every section is optional; anything omitted takes the library default.
//!
//! ```toml
//! problem_type = 1
//!
//! [constraints]
//! nox_tpy = 250.0
//!
//! [[load_trajectory]]
//! year = 2027
//! peak_mw = 200.0
//! ```

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use siteplan_algo::expansion::{ExpansionInputs, SolveOptions};
use siteplan_algo::heuristic::{PlanningInputs, ProblemParams};
use siteplan_algo::StackOptions;

/// Heuristic run: shared inputs at the top level plus strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicRun {
    pub problem_type: u8,
    #[serde(flatten)]
    pub inputs: PlanningInputs,
    pub params: ProblemParams,
    pub stack: StackOptions,
}

impl Default for HeuristicRun {
    fn default() -> Self {
        Self {
            problem_type: 1,
            inputs: PlanningInputs::default(),
            params: ProblemParams::default(),
            stack: StackOptions::default(),
        }
    }
}

/// MILP run: expansion inputs at the top level plus solver settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilpRun {
    #[serde(flatten)]
    pub inputs: ExpansionInputs,
    pub solver: Option<String>,
    pub solve: SolveOptions,
}

pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading run file {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("parsing JSON run file {}", path.display())),
        Some("toml") => {
            toml::from_str(&text).with_context(|| format!("parsing TOML run file {}", path.display()))
        }
        _ => bail!(
            "unsupported run file extension for {} (expected .toml or .json)",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_merges_defaults() {
        let run: HeuristicRun = toml::from_str(
            r#"
problem_type = 3

[constraints]
land_acres = 44.0

[[load_trajectory]]
year = 2027
peak_mw = 200.0
"#,
        )
        .unwrap();
        assert_eq!(run.problem_type, 3);
        assert_eq!(run.inputs.constraints.land_acres, 44.0);
        assert_eq!(run.inputs.constraints.nox_tpy, 100.0);
        assert_eq!(run.inputs.peak_mw(), 200.0);
        assert_eq!(run.params.bridge.transition_months, 60);
    }

    #[test]
    fn test_milp_run_json() {
        let run: MilpRun = serde_json::from_str(
            r#"{"load_trajectory": [{"year": 2027, "peak_mw": 10.0}],
                "solver": "clarabel",
                "solve": {"time_limit_seconds": 30.0}}"#,
        )
        .unwrap();
        assert_eq!(run.solver.as_deref(), Some("clarabel"));
        assert_eq!(run.solve.time_limit_seconds, 30.0);
        assert_eq!(run.solve.mip_gap, 0.05);
        assert_eq!(run.inputs.load_trajectory.len(), 1);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(&path, "problem_type: 1").unwrap();
        let err = load::<HeuristicRun>(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported run file extension"));
    }
}
