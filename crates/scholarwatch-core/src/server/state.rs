use std::sync::Arc;

use crate::config::AppConfig;
use crate::storage::Database;
use crate::watcher::WatchHandle;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub watch: WatchHandle,
    pub source_name: String,
}

impl AppState {
    pub fn new(db: Database, config: Arc<AppConfig>, watch: WatchHandle, source_name: &str) -> Self {
        Self {
            db,
            config,
            watch,
            source_name: source_name.to_string(),
        }
    }
}
