use anyhow::{Context, Result};

use verbcard_lib::dataset::{DatasetSource, DatasetSynchronizer, SyncOutcome};
use verbcard_lib::practice::PracticeMode;

use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let modes = [
        ("verbs", PracticeMode::Conjugation),
        ("phrases", PracticeMode::Tenses(app.config.practice.tenses()?)),
    ];

    let mut outcomes: Vec<(&str, String, SyncOutcome)> = Vec::new();
    for (name, mode) in &modes {
        let mut store = app.open_store(mode)?;
        let synchronizer = DatasetSynchronizer::new(app.dataset_source(mode)?);
        let outcome = synchronizer
            .sync(&mut store)
            .await
            .with_context(|| format!("Failed to store the {} dataset", name))?;
        outcomes.push((*name, synchronizer.source().describe(), outcome));
    }

    match format {
        OutputFormat::Json => {
            let output: serde_json::Map<String, serde_json::Value> = outcomes
                .iter()
                .map(|(name, _, outcome)| Ok((name.to_string(), serde_json::to_value(outcome)?)))
                .collect::<Result<_>>()?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            for (name, url, outcome) in &outcomes {
                match outcome {
                    SyncOutcome::Updated { items, .. } => {
                        println!("{:<8} {} ({} items)", name, outcome.status_message(), items)
                    }
                    SyncOutcome::UpToDate { version } => {
                        println!("{:<8} {} (version {})", name, outcome.status_message(), version)
                    }
                    SyncOutcome::Offline { reason } => {
                        println!("{:<8} {} ({}): {}", name, outcome.status_message(), url, reason)
                    }
                }
            }
        }
    }

    Ok(())
}
