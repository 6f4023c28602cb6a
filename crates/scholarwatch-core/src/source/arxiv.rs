use chrono::Datelike;
use feed_rs::parser;
use reqwest::Client;

use super::http::get_with_retry;
use super::PaperSource;
use crate::paper::Paper;
use crate::{Error, Result};

/// arXiv's API asks clients to keep pages small
const MAX_RESULTS_PER_PAGE: usize = 100;

/// arXiv search API, most recent submissions first
pub struct ArxivSource {
    client: Client,
    base_url: String,
}

impl ArxivSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl PaperSource for ArxivSource {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<Paper>> {
        let url = format!("{}/api/query", self.base_url);
        let query = [
            ("search_query", format!("all:\"{}\"", keyword.replace('"', ""))),
            ("sortBy", "submittedDate".to_string()),
            ("sortOrder", "descending".to_string()),
            ("start", "0".to_string()),
            ("max_results", limit.clamp(1, MAX_RESULTS_PER_PAGE).to_string()),
        ];

        let body = get_with_retry(&self.client, &url, &query, "application/atom+xml").await?;
        let mut papers = parse_atom(&body)?;
        papers.truncate(limit);
        Ok(papers)
    }
}

/// Parse an arXiv Atom response into papers
fn parse_atom(content: &[u8]) -> Result<Vec<Paper>> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let papers = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry
                .title
                .map(|t| collapse_whitespace(&t.content))
                .unwrap_or_default();

            let url = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref() == Some("alternate"))
                .or_else(|| entry.links.first())
                .map(|l| l.href.clone())
                .unwrap_or(entry.id);

            let authors = entry
                .authors
                .iter()
                .map(|a| a.name.trim().to_string())
                .collect::<Vec<_>>()
                .join(", ");

            let year = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.year().to_string())
                .unwrap_or_default();

            let snippet = entry.summary.map(|s| collapse_whitespace(&s.content));

            Paper {
                title,
                url,
                authors,
                year,
                snippet,
            }
        })
        .collect();

    Ok(papers)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
