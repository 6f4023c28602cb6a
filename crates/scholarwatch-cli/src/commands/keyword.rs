use anyhow::Result;

use scholarwatch_core::storage::{Database, KeywordRepository, SeenPaperRepository};

pub async fn add(db: &Database, term: &str) -> Result<()> {
    match KeywordRepository::new(db).add(term).await? {
        Some(keyword) => println!("Watching '{}' ({})", keyword.term, keyword.id),
        None if term.trim().is_empty() => println!("Keyword is empty, nothing added."),
        None => println!("Already watching '{}'.", term.trim()),
    }
    Ok(())
}

pub async fn remove(db: &Database, term: &str) -> Result<()> {
    let keyword = KeywordRepository::new(db).delete_by_term(term).await?;
    println!("Stopped watching '{}'.", keyword.term);
    Ok(())
}

pub async fn list(db: &Database) -> Result<()> {
    let keywords = KeywordRepository::new(db).list_all().await?;

    if keywords.is_empty() {
        println!("No keywords yet.");
        println!("\nTo watch a keyword, run:");
        println!("  scholarwatch keyword add \"<term>\"");
        return Ok(());
    }

    println!("Keywords ({}):\n", keywords.len());

    let seen_repo = SeenPaperRepository::new(db);
    for keyword in &keywords {
        let seen = seen_repo.count_for(&keyword.term).await?;
        println!("  {} ({} papers)", keyword.term, seen);
        println!("    Added: {}", keyword.created_at.format("%Y-%m-%d %H:%M"));
    }

    Ok(())
}
