use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;

use super::http::get_with_retry;
use super::PaperSource;
use crate::paper::Paper;
use crate::{Error, Result};

/// SerpApi caps Google Scholar pages at 20 results
const MAX_RESULTS_PER_PAGE: usize = 20;

#[derive(Deserialize)]
struct ScholarResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    link: Option<String>,
    snippet: Option<String>,
    publication_info: Option<PublicationInfo>,
}

#[derive(Deserialize)]
struct PublicationInfo {
    summary: Option<String>,
    #[serde(default)]
    authors: Vec<AuthorRef>,
}

#[derive(Deserialize)]
struct AuthorRef {
    name: String,
}

/// Google Scholar search through the SerpApi JSON endpoint, newest first
pub struct SerpApiScholarSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SerpApiScholarSource {
    /// An empty key is accepted here so the daemon can start and report
    /// the missing key; every search then fails with `Error::Config`.
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PaperSource for SerpApiScholarSource {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<Paper>> {
        if self.api_key.is_empty() {
            return Err(Error::Config("SERPAPI_KEY missing; set it in .env".to_string()));
        }

        let url = format!("{}/search.json", self.base_url);
        let num = limit.clamp(1, MAX_RESULTS_PER_PAGE);
        let query = [
            ("engine", "google_scholar".to_string()),
            ("q", keyword.to_string()),
            ("num", num.to_string()),
            ("scisbd", "1".to_string()),
            ("api_key", self.api_key.clone()),
        ];

        let body = get_with_retry(&self.client, &url, &query, "application/json").await?;
        let response: ScholarResponse = serde_json::from_slice(&body)?;

        if let Some(error) = response.error {
            return Err(Error::Source(format!("SerpApi error: {}", error)));
        }

        let papers = response
            .organic_results
            .into_iter()
            .map(to_paper)
            .take(limit)
            .collect();

        Ok(papers)
    }
}

fn to_paper(result: OrganicResult) -> Paper {
    let (authors, year) = match result.publication_info {
        Some(info) => {
            let summary = info.summary.unwrap_or_default();
            let authors = if info.authors.is_empty() {
                authors_from_summary(&summary)
            } else {
                info.authors
                    .into_iter()
                    .map(|a| a.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            (authors, year_from_summary(&summary).unwrap_or_default())
        }
        None => (String::new(), String::new()),
    };

    Paper {
        title: result.title.trim().to_string(),
        url: result.link.unwrap_or_default(),
        authors,
        year,
        snippet: result.snippet,
    }
}

/// "A Vaswani, N Shazeer - Advances in neural …, 2017 - neurips.cc" -> "A Vaswani, N Shazeer"
fn authors_from_summary(summary: &str) -> String {
    summary
        .split(" - ")
        .next()
        .unwrap_or_default()
        .trim_end_matches('…')
        .trim()
        .to_string()
}

/// Last plausible publication year mentioned in the summary line
fn year_from_summary(summary: &str) -> Option<String> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    let re = YEAR.get_or_init(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid year regex"));
    re.find_iter(summary).last().map(|m| m.as_str().to_string())
}
