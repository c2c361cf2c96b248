//! Integration tests for `siteplan-cli milp`

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_milp_solve_help() {
    let mut cmd = cargo_bin_cmd!("siteplan-cli");
    cmd.args(["milp", "solve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--solver"))
        .stdout(predicate::str::contains("--time-limit"));
}

#[test]
fn test_milp_solvers_lists_backends() {
    let mut cmd = cargo_bin_cmd!("siteplan-cli");
    cmd.args(["milp", "solvers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("highs"))
        .stdout(predicate::str::contains("cbc"))
        .stdout(predicate::str::contains("clarabel"))
        .stdout(predicate::str::contains("(default)"));
}

#[test]
fn test_milp_unknown_solver_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("run.json");
    fs::write(
        &input,
        r#"{"load_trajectory": [{"year": 2027, "peak_mw": 10.0}]}"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("siteplan-cli");
    cmd.args(["milp", "solve", "--solver", "gurobi", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown solver: gurobi"));
}

#[test]
fn test_milp_solve_small_site() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("run.toml");
    let out = dir.path().join("solution.json");
    fs::write(
        &input,
        r#"
[constraints]
nox_tpy = 1000000.0
gas_mcf_day = 10000000.0
land_acres = 100000.0
min_availability = 0.0

[[load_trajectory]]
year = 2027
peak_mw = 10.0

[[load_trajectory]]
year = 2028
peak_mw = 15.0
"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("siteplan-cli");
    cmd.args(["milp", "solve", "--time-limit", "60", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Capacity Expansion Solution"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["status"], "optimal");
    assert_eq!(json["years"].as_array().unwrap().len(), 2);
}
