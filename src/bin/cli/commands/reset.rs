use anyhow::{Context, Result};

use verbcard_lib::reset::{clear_everything, clear_stats};
use verbcard_lib::store::{ContentStore, SCHEMA_VERSION};

use crate::app::App;
use crate::commands::confirm;
use crate::OutputFormat;

pub fn run(app: &App, all: bool, yes: bool, format: &OutputFormat) -> Result<()> {
    let question = if all {
        "Delete all cached assets, content and progress?"
    } else {
        "Reset all progress?"
    };
    if !yes && !confirm(question)? {
        println!("Cancelled.");
        return Ok(());
    }

    let paths = app.store_paths()?;

    if all {
        let mut assets = app.asset_manager()?;
        let stores = paths
            .iter()
            .filter(|p| p.exists())
            .map(|path| {
                ContentStore::open_or_create(path, SCHEMA_VERSION)
                    .with_context(|| format!("Failed to open store at {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        let report = clear_everything(stores, &mut assets).context("Failed to clear local data")?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Plain => {
                println!("Deleted {} cache generation(s)", report.deleted_caches.len());
                for path in &report.removed_databases {
                    println!("Deleted {}", path.display());
                }
            }
        }
        return Ok(());
    }

    let mut cleared = Vec::new();
    for path in paths.iter().filter(|p| p.exists()) {
        let mut store = ContentStore::open_or_create(path, SCHEMA_VERSION)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        clear_stats(&mut store)?;
        cleared.push(path.display().to_string());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "clearedStats": cleared }));
        }
        OutputFormat::Plain => println!("Progress reset ({} store(s))", cleared.len()),
    }
    Ok(())
}
