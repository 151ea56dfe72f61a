//! SQLite connection pooling for the knowledge base.
//!
//! The database file and its parent directory are created on first
//! use. WAL journaling keeps moderation writes from blocking
//! concurrent retrieval reads.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::DbConfig;

/// Open the knowledge base pool described by `[db]` in the config.
pub async fn connect(db: &DbConfig) -> Result<SqlitePool> {
    if let Some(parent) = db.path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory {}", parent.display())
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&db.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    // A short-lived CLI process never needs more than a few connections.
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open knowledge base at {}", db.path.display()))?;

    Ok(pool)
}
