mod discord;

pub use discord::DiscordNotifier;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::paper::Paper;
use crate::Result;

/// Delivers an alert for a newly seen paper
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, keyword: &str, paper: &Paper) -> Result<()>;
}

/// Build the configured notifier, if any
pub fn build_notifier(config: &AppConfig, client: reqwest::Client) -> Option<Arc<dyn Notifier>> {
    match config.notify.discord_webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            tracing::info!("Discord notifications enabled");
            Some(Arc::new(DiscordNotifier::new(client, url.trim())))
        }
        _ => {
            tracing::info!("No DISCORD_WEBHOOK_URL configured; new papers will only be added to the feed");
            None
        }
    }
}
