use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Database;
use crate::paper::Keyword;
use crate::{Error, Result};

/// Repository for the watched keyword list
pub struct KeywordRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct KeywordRow {
    id: i64,
    term: String,
    created_at: DateTime<Utc>,
}

impl From<KeywordRow> for Keyword {
    fn from(row: KeywordRow) -> Self {
        Keyword {
            id: row.id,
            term: row.term,
            created_at: row.created_at,
        }
    }
}

impl<'a> KeywordRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Add a keyword. Returns `None` when the term is blank or already watched.
    pub async fn add(&self, term: &str) -> Result<Option<Keyword>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(None);
        }

        let result = sqlx::query("INSERT OR IGNORE INTO keywords (term, created_at) VALUES (?, ?)")
            .bind(term)
            .bind(Utc::now())
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(result.last_insert_rowid()).await
    }

    /// Insert every seed term that is not yet watched, returning how many were added
    pub async fn seed(&self, terms: &[String]) -> Result<u32> {
        let mut added = 0;
        for term in terms {
            if self.add(term).await?.is_some() {
                added += 1;
            }
        }
        Ok(added)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Keyword>> {
        let row: Option<KeywordRow> =
            sqlx::query_as("SELECT id, term, created_at FROM keywords WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map(Keyword::from))
    }

    pub async fn find_by_term(&self, term: &str) -> Result<Option<Keyword>> {
        let row: Option<KeywordRow> =
            sqlx::query_as("SELECT id, term, created_at FROM keywords WHERE term = ?")
                .bind(term.trim())
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map(Keyword::from))
    }

    /// All keywords, alphabetically
    pub async fn list_all(&self) -> Result<Vec<Keyword>> {
        let rows: Vec<KeywordRow> =
            sqlx::query_as("SELECT id, term, created_at FROM keywords ORDER BY term ASC")
                .fetch_all(self.db.pool())
                .await?;

        Ok(rows.into_iter().map(Keyword::from).collect())
    }

    /// Remove a keyword together with every paper seen for it
    pub async fn delete(&self, id: i64) -> Result<Option<Keyword>> {
        let Some(keyword) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM keywords WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let forgotten = sqlx::query("DELETE FROM seen_papers WHERE kw_term = ?")
            .bind(&keyword.term)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Removed keyword '{}' and {} seen papers",
            keyword.term,
            forgotten.rows_affected()
        );

        Ok(Some(keyword))
    }

    /// Remove a keyword by its term; unknown terms are `Error::KeywordNotFound`
    pub async fn delete_by_term(&self, term: &str) -> Result<Keyword> {
        let not_found = || Error::KeywordNotFound(term.trim().to_string());

        let keyword = self.find_by_term(term).await?.ok_or_else(not_found)?;
        self.delete(keyword.id).await?.ok_or_else(not_found)
    }

    pub async fn count(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM keywords")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::Paper;
    use crate::storage::SeenPaperRepository;

    #[tokio::test]
    async fn test_add_trims_and_ignores_duplicates() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = KeywordRepository::new(&db);

        let kw = repo.add("  large language models ").await.unwrap().unwrap();
        assert_eq!(kw.term, "large language models");

        assert!(repo.add("large language models").await.unwrap().is_none());
        assert!(repo.add("   ").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_is_alphabetical() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = KeywordRepository::new(&db);

        let seeds = vec!["zebrafish".to_string(), "alphafold".to_string(), "mri".to_string()];
        assert_eq!(repo.seed(&seeds).await.unwrap(), 3);
        assert_eq!(repo.seed(&seeds).await.unwrap(), 0);

        let terms: Vec<_> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.term)
            .collect();
        assert_eq!(terms, vec!["alphafold", "mri", "zebrafish"]);
    }

    #[tokio::test]
    async fn test_delete_forgets_seen_papers() {
        let db = Database::new_in_memory().await.unwrap();
        let keywords = KeywordRepository::new(&db);
        let seen = SeenPaperRepository::new(&db);

        let kept = keywords.add("kept").await.unwrap().unwrap();
        let removed = keywords.add("removed").await.unwrap().unwrap();

        let paper = Paper {
            title: "Shared paper".into(),
            url: "https://example.org/shared".into(),
            ..Default::default()
        };
        seen.insert_if_new(&kept.term, &paper).await.unwrap();
        seen.insert_if_new(&removed.term, &paper).await.unwrap();

        let deleted = keywords.delete(removed.id).await.unwrap().unwrap();
        assert_eq!(deleted.term, "removed");

        assert_eq!(seen.count_for("removed").await.unwrap(), 0);
        assert_eq!(seen.count_for("kept").await.unwrap(), 1);
        assert!(keywords.delete(removed.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_term() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = KeywordRepository::new(&db);

        repo.add("crispr").await.unwrap();
        assert_eq!(repo.delete_by_term(" crispr ").await.unwrap().term, "crispr");
        assert_eq!(repo.count().await.unwrap(), 0);

        let err = repo.delete_by_term("crispr").await.unwrap_err();
        assert!(matches!(err, Error::KeywordNotFound(ref term) if term == "crispr"));
    }
}
