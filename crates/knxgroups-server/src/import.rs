use std::io::Write;

use anyhow::{bail, Context, Result};
use knxgroups_core::{import_functional_models, load_project_data_bytes, ImportSource};

/// Imports one file and writes the outcome as JSON to stdout.
pub fn run_once(path: &str, password: Option<&str>, pretty: bool) -> Result<()> {
    log::info!("Importing {}", path);
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;
    let source = ImportSource::from_file(path, data, password.map(str::to_string))?;

    // Open archives up front so password failures reach the caller as errors.
    let (source, project_name) = match source {
        ImportSource::ProjectArchive { data, password } => {
            let docs = load_project_data_bytes(&data, password.as_deref())
                .with_context(|| format!("Failed to open {}", path))?;
            (ImportSource::ProjectData(docs.data_xml), Some(docs.project_name))
        }
        other => (other, None),
    };

    let mut outcome = import_functional_models(&source);
    if outcome.report.depth.is_none() {
        bail!("Unable to import {}", path);
    }
    if project_name.is_some() {
        outcome.report.project_name = project_name;
    }

    let json = if pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("Failed to write output")?;
    Ok(())
}
