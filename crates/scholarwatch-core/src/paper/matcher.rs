use serde::{Deserialize, Serialize};

use super::Paper;

/// How a fetched paper is checked against the keyword it was searched for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Accept whatever the source returned for the query
    #[default]
    Source,
    /// Every word of the keyword must appear in the title or snippet
    AllTerms,
    /// The keyword must appear verbatim in the title or snippet
    Phrase,
}

/// Case-insensitive keyword filter for one term
pub struct KeywordMatcher {
    mode: MatchMode,
    phrase: String,
    terms: Vec<String>,
}

impl KeywordMatcher {
    pub fn new(keyword: &str, mode: MatchMode) -> Self {
        let phrase = normalize(keyword);
        let terms = phrase.split(' ').filter(|t| !t.is_empty()).map(String::from).collect();
        Self { mode, phrase, terms }
    }

    pub fn matches(&self, paper: &Paper) -> bool {
        if paper.is_blank() {
            return false;
        }

        let haystack = match &paper.snippet {
            Some(snippet) => normalize(&format!("{} {}", paper.title, snippet)),
            None => normalize(&paper.title),
        };

        match self.mode {
            MatchMode::Source => true,
            MatchMode::AllTerms => self.terms.iter().all(|t| haystack.contains(t.as_str())),
            MatchMode::Phrase => !self.phrase.is_empty() && haystack.contains(&self.phrase),
        }
    }

    /// Keep the papers that match, preserving source order
    pub fn filter(&self, papers: Vec<Paper>) -> Vec<Paper> {
        papers.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Lowercase and collapse whitespace so line breaks in titles do not break phrases
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
