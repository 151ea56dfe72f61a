use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(&config.db).await?;

    // Knowledge entries. `seq` drives the kb-NNNN identifier; entries
    // are never deleted, so the sequence is stable.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS knowledge_base (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            kb_id TEXT NOT NULL UNIQUE,
            topic TEXT NOT NULL,
            description TEXT NOT NULL,
            reference_text TEXT NOT NULL DEFAULT '',
            author TEXT NOT NULL DEFAULT '',
            embedding BLOB NOT NULL,
            status INTEGER NOT NULL DEFAULT -1,
            dedup_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_knowledge_topic ON knowledge_base(topic)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_knowledge_status ON knowledge_base(status)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_knowledge_dedup_hash ON knowledge_base(dedup_hash)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
