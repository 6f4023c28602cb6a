mod database;
mod keyword_repo;
mod seen_repo;

pub use database::Database;
pub use keyword_repo::KeywordRepository;
pub use seen_repo::{SeenPaperRepository, MAX_FEED_LIMIT};
