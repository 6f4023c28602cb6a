mod arxiv;
pub mod http;
mod serpapi;

pub use arxiv::ArxivSource;
pub use serpapi::SerpApiScholarSource;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::paper::Paper;
use crate::{Error, Result};

/// A searchable listing of scholarly publications
#[async_trait::async_trait]
pub trait PaperSource: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &str;

    /// Most recent publications for a keyword, at most `limit`
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<Paper>>;
}

/// Build the configured paper source
pub fn build_source(config: &AppConfig, client: reqwest::Client) -> Result<Arc<dyn PaperSource>> {
    let source = &config.source;
    match source.provider.as_str() {
        "serpapi" => {
            let key = source.serpapi_key.as_deref().unwrap_or_default();
            Ok(Arc::new(SerpApiScholarSource::new(client, &source.serpapi_base_url, key)))
        }
        "arxiv" => Ok(Arc::new(ArxivSource::new(client, &source.arxiv_base_url))),
        other => Err(Error::Config(format!(
            "Unknown paper source '{}' (expected \"serpapi\" or \"arxiv\")",
            other
        ))),
    }
}
