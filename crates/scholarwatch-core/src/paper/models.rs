use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A publication as returned by a paper source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub url: String,
    /// Display string, e.g. "A Author, B Author"
    pub authors: String,
    pub year: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl Paper {
    /// A paper with neither a title nor a link cannot be shown or deduplicated
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.url.trim().is_empty()
    }

    pub fn fingerprint(&self) -> String {
        super::fingerprint(self)
    }
}

/// A watched search term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i64,
    pub term: String,
    pub created_at: DateTime<Utc>,
}

/// A paper recorded in the seen-set for one keyword
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeenPaper {
    pub keyword: String,
    pub fingerprint: String,
    pub title: String,
    pub url: String,
    pub authors: String,
    pub year: String,
    pub first_seen: DateTime<Utc>,
}

impl SeenPaper {
    /// Title shown in feeds, with the year appended when known
    pub fn display_title(&self) -> String {
        if self.year.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, self.year)
        }
    }
}
