use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paper::MatchMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Explicit database file, overrides `<data_dir>/scholarwatch.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_path: None,
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Minutes between cycles (0 = only the startup cycle and manual runs)
    #[serde(default = "default_schedule_minutes")]
    pub schedule_minutes: u64,
    /// Maximum results requested from the source per keyword and cycle
    #[serde(default = "default_per_keyword_limit")]
    pub per_keyword_limit: usize,
    /// Pause between two keywords of one cycle, in milliseconds
    #[serde(default = "default_keyword_pause")]
    pub keyword_pause_ms: u64,
    /// How fetched papers are checked against their keyword
    #[serde(default)]
    pub match_mode: MatchMode,
    /// Keywords inserted at startup if missing
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            schedule_minutes: default_schedule_minutes(),
            per_keyword_limit: default_per_keyword_limit(),
            keyword_pause_ms: default_keyword_pause(),
            match_mode: MatchMode::default(),
            keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Paper source: "serpapi" or "arxiv"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// SerpApi key (for the serpapi provider)
    #[serde(default)]
    pub serpapi_key: Option<String>,
    #[serde(default = "default_serpapi_base_url")]
    pub serpapi_base_url: String,
    #[serde(default = "default_arxiv_base_url")]
    pub arxiv_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            serpapi_key: None,
            serpapi_base_url: default_serpapi_base_url(),
            arxiv_base_url: default_arxiv_base_url(),
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

impl SourceConfig {
    /// Whether the selected provider has the credentials it needs
    pub fn is_ready(&self) -> bool {
        match self.provider.as_str() {
            "serpapi" => self.serpapi_key.as_deref().is_some_and(|k| !k.is_empty()),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Discord webhook receiving one message per new paper
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
}

impl NotifyConfig {
    pub fn discord_enabled(&self) -> bool {
        self.discord_webhook_url
            .as_deref()
            .is_some_and(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Default number of items in the RSS feed
    #[serde(default = "default_rss_limit")]
    pub rss_limit: u32,
    /// Link advertised in the RSS channel
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rss_limit: default_rss_limit(),
            public_url: default_public_url(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scholarwatch")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_schedule_minutes() -> u64 {
    15
}

fn default_per_keyword_limit() -> usize {
    10
}

fn default_keyword_pause() -> u64 {
    1000
}

fn default_provider() -> String {
    "serpapi".to_string()
}

fn default_serpapi_base_url() -> String {
    "https://serpapi.com".to_string()
}

fn default_arxiv_base_url() -> String {
    "https://export.arxiv.org".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_rss_limit() -> u32 {
    100
}

fn default_public_url() -> String {
    "http://localhost:8080/".to_string()
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> crate::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| crate::Error::Config(format!("{} has an invalid value: {:?}", key, value)))
}

impl AppConfig {
    /// Load configuration from file (or defaults), then apply `.env` and
    /// environment overrides
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?
        } else {
            Self::default()
        };

        // A missing .env file is fine
        dotenvy::dotenv().ok();

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override settings from environment-style variables
    pub fn apply_env<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DISCORD_WEBHOOK_URL") {
            self.notify.discord_webhook_url = non_empty(url);
        }
        if let Some(key) = lookup("SERPAPI_KEY") {
            self.source.serpapi_key = non_empty(key);
        }
        if let Some(provider) = lookup("SOURCE_PROVIDER").and_then(non_empty) {
            self.source.provider = provider;
        }
        if let Some(value) = lookup("SCHEDULE_MINUTES") {
            self.watch.schedule_minutes = parse_env("SCHEDULE_MINUTES", &value)?;
        }
        if let Some(value) = lookup("PER_KEYWORD_LIMIT") {
            self.watch.per_keyword_limit = parse_env("PER_KEYWORD_LIMIT", &value)?;
        }
        if let Some(value) = lookup("RSS_LIMIT") {
            self.server.rss_limit = parse_env("RSS_LIMIT", &value)?;
        }
        if let Some(value) = lookup("KEYWORDS") {
            let seeds: Vec<String> = value
                .split(',')
                .map(|kw| kw.trim().to_string())
                .filter(|kw| !kw.is_empty())
                .collect();
            if !seeds.is_empty() {
                self.watch.keywords = seeds;
            }
        }
        if let Some(path) = lookup("DB_PATH").and_then(non_empty) {
            self.general.database_path = Some(PathBuf::from(path));
        }
        if let Some(host) = lookup("HOST").and_then(non_empty) {
            self.server.host = host;
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = parse_env("PORT", &value)?;
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Default configuration file: ~/.config/scholarwatch/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("scholarwatch")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        match &self.general.database_path {
            Some(path) => expand_tilde(path),
            None => self.data_dir().join("scholarwatch.db"),
        }
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}
