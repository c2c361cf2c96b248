//! `catalog`: the effective defaults, as a starting run file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use siteplan_core::{EconomicParams, EquipmentCatalog, HeuristicTuning, SiteConstraints};

#[derive(Debug, Serialize)]
struct Defaults {
    constraints: SiteConstraints,
    economics: EconomicParams,
    tuning: HeuristicTuning,
    catalog: EquipmentCatalog,
}

pub fn handle(out: Option<&Path>) -> Result<()> {
    let defaults = Defaults {
        constraints: SiteConstraints::default(),
        economics: EconomicParams::default(),
        tuning: HeuristicTuning::default(),
        catalog: EquipmentCatalog::default(),
    };
    let text = toml::to_string_pretty(&defaults).context("serializing defaults to TOML")?;
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            info!("Defaults written to {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
