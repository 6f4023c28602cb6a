pub mod config;
pub mod keyword;
pub mod run;
pub mod serve;
pub mod status;

use anyhow::Result;
use tracing::info;

use scholarwatch_core::{
    notify::build_notifier,
    source::{build_source, http::build_client},
    storage::{Database, KeywordRepository},
    watcher::Watcher,
    AppConfig,
};

/// Seed keywords from config, then wire source and notifier into a watcher
pub(crate) async fn build_watcher(db: &Database, config: &AppConfig) -> Result<Watcher> {
    let seeded = KeywordRepository::new(db).seed(&config.watch.keywords).await?;
    if seeded > 0 {
        info!("Seeded {} keywords from configuration", seeded);
    }

    let client = build_client(&config.source)?;
    let source = build_source(config, client.clone())?;

    let notifier = build_notifier(config, client);
    if notifier.is_none() {
        info!("No Discord webhook configured, detections are only published as RSS");
    }

    Ok(Watcher::new(db.clone(), config, source, notifier))
}
