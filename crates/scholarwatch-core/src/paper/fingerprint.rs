use sha2::{Digest, Sha256};

use super::Paper;

/// Stable identity of a paper across polls: SHA-256 over the trimmed
/// `title|authors|year|url`, hex encoded
pub fn fingerprint(paper: &Paper) -> String {
    let base = format!(
        "{}|{}|{}|{}",
        paper.title.trim(),
        paper.authors.trim(),
        paper.year.trim(),
        paper.url.trim()
    );
    hex::encode(Sha256::digest(base.as_bytes()))
}
