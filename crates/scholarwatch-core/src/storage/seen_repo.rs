use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Database;
use crate::paper::{Paper, SeenPaper};
use crate::Result;

/// Largest feed a single request may ask for
pub const MAX_FEED_LIMIT: i64 = 1000;

/// Repository for the seen-set: papers already emitted per keyword
pub struct SeenPaperRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct SeenPaperRow {
    kw_term: String,
    fingerprint: String,
    title: String,
    url: String,
    authors: String,
    year: String,
    first_seen: DateTime<Utc>,
}

impl From<SeenPaperRow> for SeenPaper {
    fn from(row: SeenPaperRow) -> Self {
        SeenPaper {
            keyword: row.kw_term,
            fingerprint: row.fingerprint,
            title: row.title,
            url: row.url,
            authors: row.authors,
            year: row.year,
            first_seen: row.first_seen,
        }
    }
}

impl<'a> SeenPaperRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record a paper for a keyword. Returns `None` if it was already seen.
    pub async fn insert_if_new(&self, keyword: &str, paper: &Paper) -> Result<Option<SeenPaper>> {
        let fingerprint = paper.fingerprint();
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO seen_papers
            (kw_term, fingerprint, title, url, authors, year, first_seen)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(keyword)
        .bind(&fingerprint)
        .bind(&paper.title)
        .bind(&paper.url)
        .bind(&paper.authors)
        .bind(&paper.year)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(SeenPaper {
            keyword: keyword.to_string(),
            fingerprint,
            title: paper.title.clone(),
            url: paper.url.clone(),
            authors: paper.authors.clone(),
            year: paper.year.clone(),
            first_seen: now,
        }))
    }

    /// Drop a seen entry so the paper is picked up again next cycle
    pub async fn forget(&self, keyword: &str, fingerprint: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM seen_papers WHERE kw_term = ? AND fingerprint = ?")
            .bind(keyword)
            .bind(fingerprint)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Most recently seen papers, newest first, optionally for one keyword.
    /// `limit` is clamped to `1..=MAX_FEED_LIMIT`.
    pub async fn recent(&self, keyword: Option<&str>, limit: i64) -> Result<Vec<SeenPaper>> {
        let limit = limit.clamp(1, MAX_FEED_LIMIT);

        let rows: Vec<SeenPaperRow> = match keyword {
            Some(keyword) => {
                sqlx::query_as(
                    r#"
                    SELECT kw_term, fingerprint, title, url, authors, year, first_seen
                    FROM seen_papers
                    WHERE kw_term = ?
                    ORDER BY first_seen DESC, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(keyword)
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT kw_term, fingerprint, title, url, authors, year, first_seen
                    FROM seen_papers
                    ORDER BY first_seen DESC, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(limit)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.into_iter().map(SeenPaper::from).collect())
    }

    pub async fn count(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM seen_papers")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }

    pub async fn count_for(&self, keyword: &str) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM seen_papers WHERE kw_term = ?")
            .bind(keyword)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(n: u32) -> Paper {
        Paper {
            title: format!("Paper {}", n),
            url: format!("https://example.org/{}", n),
            authors: "Ada Lovelace".into(),
            year: "2024".into(),
            snippet: None,
        }
    }

    #[tokio::test]
    async fn test_insert_once_per_keyword() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SeenPaperRepository::new(&db);

        let first = repo.insert_if_new("ml", &paper(1)).await.unwrap();
        assert!(first.is_some());
        assert!(repo.insert_if_new("ml", &paper(1)).await.unwrap().is_none());

        // Same paper under another keyword is a separate entry
        assert!(repo.insert_if_new("stats", &paper(1)).await.unwrap().is_some());
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_forget_allows_reinsert() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SeenPaperRepository::new(&db);

        let seen = repo.insert_if_new("ml", &paper(1)).await.unwrap().unwrap();
        assert!(repo.forget("ml", &seen.fingerprint).await.unwrap());
        assert!(!repo.forget("ml", &seen.fingerprint).await.unwrap());
        assert!(repo.insert_if_new("ml", &paper(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_recent_newest_first_and_limited() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SeenPaperRepository::new(&db);

        for n in 1..=5 {
            repo.insert_if_new("ml", &paper(n)).await.unwrap();
        }
        repo.insert_if_new("bio", &paper(6)).await.unwrap();

        let all = repo.recent(None, 100).await.unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].title, "Paper 6");
        assert_eq!(all[5].title, "Paper 1");

        let ml = repo.recent(Some("ml"), 2).await.unwrap();
        let titles: Vec<_> = ml.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Paper 5", "Paper 4"]);
    }

    #[tokio::test]
    async fn test_recent_clamps_zero_limit() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SeenPaperRepository::new(&db);

        repo.insert_if_new("ml", &paper(1)).await.unwrap();
        repo.insert_if_new("ml", &paper(2)).await.unwrap();

        assert_eq!(repo.recent(None, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recent_caps_large_limit() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SeenPaperRepository::new(&db);

        sqlx::query(
            r#"
            WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 1005)
            INSERT INTO seen_papers (kw_term, fingerprint, first_seen)
            SELECT 'ml', 'fp-' || i, ? FROM n
            "#,
        )
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();
        assert_eq!(repo.count().await.unwrap(), 1005);

        assert_eq!(repo.recent(None, 5000).await.unwrap().len(), 1000);
        assert_eq!(repo.recent(Some("ml"), i64::MAX).await.unwrap().len(), 1000);
        assert_eq!(repo.recent(None, -5).await.unwrap().len(), 1);
    }
}
