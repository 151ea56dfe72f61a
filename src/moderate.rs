//! Moderation and store statistics CLI runners.
//!
//! Entries enter the store pending and only become retrievable once a
//! reviewer approves them. Rejection is logical; nothing is deleted.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::models::EntryStatus;
use crate::sqlite_store::SqliteStore;
use crate::store::KnowledgeStore;

/// `voxkb review <kb-id> --approve|--reject`.
pub async fn run_review(config: &Config, kb_id: &str, approve: bool) -> Result<()> {
    let pool = db::connect(&config.db).await?;
    let store = SqliteStore::new(pool);

    let status = if approve {
        EntryStatus::Approved
    } else {
        EntryStatus::Rejected
    };

    let found = store.set_status(kb_id, status).await?;
    if found {
        println!("{} -> {}", kb_id, status.label());
    } else {
        println!("No entry with id '{}'.", kb_id);
    }

    store.pool().close().await;
    Ok(())
}

/// `voxkb stats` — entry counts by status plus distinct topics.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db).await?;
    let store = SqliteStore::new(pool);

    let stats = store.stats().await?;

    println!("knowledge base");
    println!("  approved: {}", stats.approved);
    println!("  pending: {}", stats.pending);
    println!("  rejected: {}", stats.rejected);
    println!("  topics: {}", stats.topics);

    store.pool().close().await;
    Ok(())
}
