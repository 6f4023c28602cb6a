use std::path::Path;

use anyhow::Result;

use scholarwatch_core::AppConfig;

pub fn init(config: &AppConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    config.save(path)?;
    println!("Wrote configuration to {}", path.display());

    if config.source.serpapi_key.is_some() || config.notify.discord_webhook_url.is_some() {
        println!("Note: secrets from the environment were written to the file as well.");
    }

    Ok(())
}

pub fn path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}
