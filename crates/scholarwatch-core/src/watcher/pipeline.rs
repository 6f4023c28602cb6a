use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::notify::Notifier;
use crate::paper::{KeywordMatcher, MatchMode};
use crate::source::PaperSource;
use crate::storage::{Database, KeywordRepository, SeenPaperRepository};
use crate::Result;

/// Outcome of one pass over all keywords
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub keywords: u32,
    pub new_papers: u32,
    /// Keywords that failed, with the error message
    pub failures: Vec<(String, String)>,
    pub finished_at: DateTime<Utc>,
}

impl CycleReport {
    pub fn summary(&self) -> String {
        format!(
            "{} new papers across {} keywords ({} failed) at {}",
            self.new_papers,
            self.keywords,
            self.failures.len(),
            self.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Fetch → match → dedupe → notify pipeline
pub struct Watcher {
    db: Database,
    source: Arc<dyn PaperSource>,
    notifier: Option<Arc<dyn Notifier>>,
    match_mode: MatchMode,
    per_keyword_limit: usize,
    keyword_pause: Duration,
}

impl Watcher {
    pub fn new(
        db: Database,
        config: &AppConfig,
        source: Arc<dyn PaperSource>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            db,
            source,
            notifier,
            match_mode: config.watch.match_mode,
            per_keyword_limit: config.watch.per_keyword_limit,
            keyword_pause: Duration::from_millis(config.watch.keyword_pause_ms),
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Poll the source for one keyword and emit every paper not seen before.
    ///
    /// A paper is recorded before it is announced; if the notification fails
    /// the record is dropped again and the error returned, so the paper is
    /// retried on the next cycle.
    pub async fn process_keyword(&self, keyword: &str) -> Result<u32> {
        let papers = self.source.search(keyword, self.per_keyword_limit).await?;
        let fetched = papers.len();

        let matcher = KeywordMatcher::new(keyword, self.match_mode);
        let papers = matcher.filter(papers);

        tracing::debug!(
            "Keyword '{}': {} fetched, {} matched",
            keyword,
            fetched,
            papers.len()
        );

        let seen_repo = SeenPaperRepository::new(&self.db);
        let mut new_count = 0;

        for paper in &papers {
            let Some(seen) = seen_repo.insert_if_new(keyword, paper).await? else {
                continue;
            };

            if let Some(ref notifier) = self.notifier {
                if let Err(e) = notifier.notify(keyword, paper).await {
                    seen_repo.forget(keyword, &seen.fingerprint).await?;
                    return Err(e);
                }
            }

            tracing::info!("New paper for '{}': {}", keyword, paper.title);
            new_count += 1;
        }

        Ok(new_count)
    }

    /// Process every keyword in alphabetical order. A failing keyword is
    /// logged and reported but does not stop the cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let keywords = KeywordRepository::new(&self.db).list_all().await?;

        let mut report = CycleReport {
            keywords: keywords.len() as u32,
            new_papers: 0,
            failures: Vec::new(),
            finished_at: Utc::now(),
        };

        for (index, keyword) in keywords.iter().enumerate() {
            if index > 0 && !self.keyword_pause.is_zero() {
                tokio::time::sleep(self.keyword_pause).await;
            }

            match self.process_keyword(&keyword.term).await {
                Ok(count) => report.new_papers += count,
                Err(e) => {
                    tracing::error!("Error processing '{}': {}", keyword.term, e);
                    report.failures.push((keyword.term.clone(), e.to_string()));
                }
            }
        }

        report.finished_at = Utc::now();

        if report.new_papers > 0 {
            tracing::info!("New papers this cycle: {}", report.new_papers);
        }

        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::notify::Notifier;
    use crate::paper::Paper;
    use crate::source::PaperSource;
    use crate::{Error, Result};

    pub fn paper(title: &str) -> Paper {
        Paper {
            title: title.to_string(),
            url: format!("https://example.org/{}", title.replace(' ', "-")),
            authors: "Test Author".to_string(),
            year: "2024".to_string(),
            snippet: None,
        }
    }

    /// Source answering from a fixed table; unknown keywords fail
    #[derive(Default)]
    pub struct StaticSource {
        pub results: Mutex<HashMap<String, Vec<Paper>>>,
    }

    impl StaticSource {
        pub fn with(self, keyword: &str, papers: Vec<Paper>) -> Self {
            self.results.lock().unwrap().insert(keyword.to_string(), papers);
            self
        }
    }

    #[async_trait::async_trait]
    impl PaperSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<Paper>> {
            self.results
                .lock()
                .unwrap()
                .get(keyword)
                .map(|papers| papers.iter().take(limit).cloned().collect())
                .ok_or_else(|| Error::Source(format!("no results for {}", keyword)))
        }
    }

    /// Notifier recording messages, optionally failing every call
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, keyword: &str, paper: &Paper) -> Result<()> {
            if self.fail {
                return Err(Error::Notify("webhook down".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((keyword.to_string(), paper.title.clone()));
            Ok(())
        }
    }
}
