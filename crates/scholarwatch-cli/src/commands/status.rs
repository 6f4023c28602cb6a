use anyhow::Result;

use scholarwatch_core::{
    storage::{Database, KeywordRepository, SeenPaperRepository},
    AppConfig,
};

fn ok_missing(flag: bool) -> &'static str {
    if flag {
        "ok"
    } else {
        "missing"
    }
}

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    let keywords = KeywordRepository::new(db).count().await?;
    let seen = SeenPaperRepository::new(db).count().await?;

    println!("Keywords:     {}", keywords);
    println!("Seen papers:  {}", seen);
    println!("Database:     {}", config.database_path().display());
    println!(
        "Source:       {} ({})",
        config.source.provider,
        ok_missing(config.source.is_ready())
    );
    println!("Discord:      {}", ok_missing(config.notify.discord_enabled()));
    if config.watch.schedule_minutes > 0 {
        println!("Schedule:     every {} minutes", config.watch.schedule_minutes);
    } else {
        println!("Schedule:     manual only");
    }
    println!("Listen:       http://{}", config.server.bind_addr());

    Ok(())
}
