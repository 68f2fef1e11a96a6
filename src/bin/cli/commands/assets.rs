use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use verbcard_lib::assets::ServedFrom;

use crate::app::App;
use crate::OutputFormat;

pub async fn run_install(app: &App, format: &OutputFormat) -> Result<()> {
    let mut manager = app.asset_manager()?;
    let report = manager.install().await.context("Failed to install asset cache")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            println!(
                "Installed {}: {} cached, {} failed",
                report.cache_name,
                report.cached.len(),
                report.failed.len()
            );
            for failed in &report.failed {
                println!("  ✗ {}: {}", failed.path, failed.error);
            }
        }
    }
    Ok(())
}

pub fn run_activate(app: &App, format: &OutputFormat) -> Result<()> {
    let mut manager = app.asset_manager()?;
    let report = manager.activate()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            println!("Activated {}", report.cache_name);
            for name in &report.purged {
                println!("  deleted {}", name);
            }
        }
    }
    Ok(())
}

/// Fetch one resource through the cache, writing the body to `output` or stdout
pub async fn run_fetch(app: &App, path: &str, output: Option<&Path>) -> Result<()> {
    let manager = app.asset_manager()?;
    let served = manager
        .fetch(path)
        .await
        .with_context(|| format!("Failed to fetch {}", path))?;

    let from = match served.from {
        ServedFrom::Network => "network",
        ServedFrom::Cache => "cache",
    };
    eprintln!("{} {} from {}", served.response.status, path, from);

    match output {
        Some(file) => fs::write(file, &served.response.body)
            .with_context(|| format!("Failed to write {}", file.display()))?,
        None => io::stdout().write_all(&served.response.body)?,
    }
    Ok(())
}

pub fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let manager = app.asset_manager()?;
    let generations = manager.generations()?;

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = generations
                .iter()
                .map(|(name, state)| {
                    Ok(serde_json::json!({
                        "name": name,
                        "state": state,
                        "entries": manager.storage().entries(name)?,
                    }))
                })
                .collect::<Result<_>>()?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if generations.is_empty() {
                println!("No asset caches.");
                return Ok(());
            }
            for (name, state) in &generations {
                let entries = manager.storage().entries(name)?;
                println!("{} ({:?}, {} entries)", name, state, entries.len());
            }
        }
    }
    Ok(())
}
