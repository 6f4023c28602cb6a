use anyhow::Result;

use scholarwatch_core::{storage::Database, AppConfig};

use super::build_watcher;

pub async fn run(db: Database, config: &AppConfig) -> Result<()> {
    let watcher = build_watcher(&db, config).await?;

    println!("Checking keywords with {}...", watcher.source_name());
    let report = watcher.run_cycle().await?;

    for (keyword, error) in &report.failures {
        println!("  {}: {}", keyword, error);
    }
    println!("{}", report.summary());

    Ok(())
}
