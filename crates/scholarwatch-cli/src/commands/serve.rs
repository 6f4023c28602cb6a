use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use scholarwatch_core::{
    server::{self, AppState},
    storage::Database,
    watcher::{WatchEvent, WatchService},
    AppConfig,
};

use super::build_watcher;

/// Run the background watcher and the HTTP endpoint until ctrl-c
pub async fn run(db: Database, config: Arc<AppConfig>) -> Result<()> {
    if !config.source.is_ready() {
        warn!("Paper source '{}' is not configured; cycles will fail until it is", config.source.provider);
    }

    let watcher = Arc::new(build_watcher(&db, &config).await?);
    let source_name = watcher.source_name().to_string();

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Setup signal handler for graceful shutdown
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let WatchEvent::Error { message } = event {
                warn!("Cycle error: {}", message);
            }
        }
    });

    let (service, handle) = WatchService::new(watcher, config.watch.schedule_minutes);
    let service_task = tokio::spawn(service.with_event_sender(event_tx).run(shutdown_rx.clone()));

    let state = AppState::new(db, config.clone(), handle, &source_name);
    server::serve(state, &config.server.bind_addr(), shutdown_rx).await?;

    service_task.await?;
    info!("scholarwatch stopped");

    Ok(())
}
