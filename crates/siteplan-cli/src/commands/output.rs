use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Pretty JSON to `out`, or to stdout when no path is given.
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing result")?;
    match out {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("creating output file {}", path.display()))?;
            file.write_all(json.as_bytes()).context("writing output")?;
            println!("Results written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
