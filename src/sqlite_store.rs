//! SQLite-backed [`KnowledgeStore`] implementation.
//!
//! Vector search is brute-force cosine similarity over embedding BLOBs,
//! scanned in sequence order so that equal scores resolve to insertion
//! order after a stable sort. Rows with missing or undecodable fields
//! are dropped individually with a warning instead of failing the whole
//! query.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{EntryStatus, KnowledgeEntry, Match, NewKnowledge};
use crate::store::{KnowledgeStore, StoreStats};

/// SQLite implementation of the [`KnowledgeStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Decode one row into a [`KnowledgeEntry`], or `None` if a required
/// field is missing or malformed.
fn decode_entry(row: &sqlx::sqlite::SqliteRow) -> Option<KnowledgeEntry> {
    let id: String = row.try_get("kb_id").ok()?;
    let topic: String = row.try_get("topic").ok()?;
    let description: String = row.try_get("description").ok()?;
    let references: String = row.try_get("reference_text").ok()?;
    let author: String = row.try_get("author").ok()?;
    let blob: Vec<u8> = row.try_get("embedding").ok()?;
    let status_raw: i64 = row.try_get("status").ok()?;
    let created_at: i64 = row.try_get("created_at").ok()?;

    Some(KnowledgeEntry {
        id,
        topic,
        description,
        references,
        author,
        embedding: blob_to_vec(&blob),
        status: EntryStatus::from_i64(status_raw)?,
        created_at,
    })
}

#[async_trait]
impl KnowledgeStore for SqliteStore {
    async fn search_similar(
        &self,
        query_vec: &[f32],
        threshold: f64,
        max_results: i64,
        topic_filter: Option<&str>,
    ) -> Result<Vec<Match>> {
        let rows = match topic_filter {
            Some(topic) => {
                sqlx::query(
                    r#"
                    SELECT kb_id, topic, description, embedding
                    FROM knowledge_base
                    WHERE status = 1 AND topic = ?
                    ORDER BY seq ASC
                    "#,
                )
                .bind(topic)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT kb_id, topic, description, embedding
                    FROM knowledge_base
                    WHERE status = 1
                    ORDER BY seq ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut matches: Vec<Match> = Vec::new();
        for row in &rows {
            let kb_id: String = match row.try_get("kb_id") {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("Warning: skipping malformed knowledge row: {}", e);
                    continue;
                }
            };
            let (topic, description, blob): (String, String, Vec<u8>) = match (
                row.try_get("topic"),
                row.try_get("description"),
                row.try_get("embedding"),
            ) {
                (Ok(t), Ok(d), Ok(b)) => (t, d, b),
                _ => {
                    eprintln!("Warning: skipping malformed knowledge row {}", kb_id);
                    continue;
                }
            };

            let similarity = cosine_similarity(query_vec, &blob_to_vec(&blob)) as f64;
            if similarity >= threshold {
                matches.push(Match {
                    kb_id,
                    topic,
                    description,
                    similarity,
                });
            }
        }

        // Stable sort: equal scores keep the seq scan order.
        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(max_results as usize);

        Ok(matches)
    }

    async fn fetch_by_topic(&self, topic: &str) -> Result<Vec<KnowledgeEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT kb_id, topic, description, reference_text, author,
                   embedding, status, created_at
            FROM knowledge_base
            WHERE status = 1 AND topic = ?
            ORDER BY seq ASC
            "#,
        )
        .bind(topic)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(decode_entry).collect())
    }

    async fn insert_entry(&self, entry: &NewKnowledge) -> Result<String> {
        let mut tx = self.pool.begin().await?;

        let next_seq: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(seq), 0) + 1 FROM knowledge_base")
            .fetch_one(&mut *tx)
            .await?;
        let kb_id = format!("kb-{:04}", next_seq);

        let blob = vec_to_blob(&entry.embedding);
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO knowledge_base
                (seq, kb_id, topic, description, reference_text, author,
                 embedding, status, dedup_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(next_seq)
        .bind(&kb_id)
        .bind(&entry.topic)
        .bind(&entry.description)
        .bind(&entry.references)
        .bind(&entry.author)
        .bind(&blob)
        .bind(EntryStatus::Pending.as_i64())
        .bind(&entry.dedup_hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(kb_id)
    }

    async fn has_dedup_hash(&self, hash: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM knowledge_base WHERE dedup_hash = ?")
                .bind(hash)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn set_status(&self, kb_id: &str, status: EntryStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE knowledge_base SET status = ? WHERE kb_id = ?")
            .bind(status.as_i64())
            .bind(kb_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM knowledge_base GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut stats = StoreStats::default();
        for row in &rows {
            let status: i64 = row.get("status");
            let n: i64 = row.get("n");
            match EntryStatus::from_i64(status) {
                Some(EntryStatus::Pending) => stats.pending = n,
                Some(EntryStatus::Rejected) => stats.rejected = n,
                Some(EntryStatus::Approved) => stats.approved = n,
                None => {}
            }
        }

        stats.topics = sqlx::query_scalar("SELECT COUNT(DISTINCT topic) FROM knowledge_base")
            .fetch_one(&self.pool)
            .await?;

        Ok(stats)
    }
}
