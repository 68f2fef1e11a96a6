use anyhow::Result;

use verbcard_lib::practice::PracticeMode;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let modes = [
        ("verbs", PracticeMode::Conjugation),
        ("phrases", PracticeMode::Tenses(app.config.practice.tenses()?)),
    ];

    let mut stores = Vec::new();
    for (name, mode) in &modes {
        let path = app.store_path(mode)?;
        if !path.exists() {
            stores.push(serde_json::json!({ "name": name, "path": path, "present": false }));
            continue;
        }

        let store = app.open_store(mode)?;
        let items = store.get_all_content()?;
        let rotation = app.tracker().rotation(&store, &items, &mode.context_keys())?;
        stores.push(serde_json::json!({
            "name": name,
            "path": path,
            "present": true,
            "version": store.stored_version()?,
            "items": items.len(),
            "statistics": store.get_all_stats()?.len(),
            "remaining": rotation.len(),
            "total": rotation.total(),
        }));
    }

    let assets = app.asset_manager()?;
    let generations = assets.generations()?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "dataDir": app.data_dir,
                "stores": stores,
                "assets": {
                    "current": assets.cache_name(),
                    "state": assets.state(),
                    "generations": generations
                        .iter()
                        .map(|(name, state)| serde_json::json!({ "name": name, "state": state }))
                        .collect::<Vec<_>>(),
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Data directory: {}", app.data_dir.display());
            for store in &stores {
                let name = store["name"].as_str().unwrap_or_default();
                if store["present"] != true {
                    println!("  {:<8} not synced yet", name);
                    continue;
                }
                println!(
                    "  {:<8} version {}, {} items, {}/{} combinations remaining",
                    name,
                    store["version"],
                    store["items"],
                    store["remaining"],
                    store["total"]
                );
            }

            match assets.state() {
                Some(state) => println!("Asset cache {} ({:?})", assets.cache_name(), state),
                None => println!("Asset cache {} not installed", assets.cache_name()),
            }
            for (name, state) in generations.iter().filter(|(n, _)| *n != assets.cache_name()) {
                println!("  stale generation {} ({:?})", name, state);
            }
        }
    }

    Ok(())
}
