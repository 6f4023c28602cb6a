mod fingerprint;
mod matcher;
mod models;

pub use fingerprint::fingerprint;
pub use matcher::{KeywordMatcher, MatchMode};
pub use models::{Keyword, Paper, SeenPaper};
