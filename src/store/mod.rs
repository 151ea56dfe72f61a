//! Storage abstraction for the knowledge base.
//!
//! The [`KnowledgeStore`] trait defines every storage operation the
//! retrieval and ingestion pipeline needs, enabling pluggable backends
//! (SQLite, in-memory for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{EntryStatus, KnowledgeEntry, Match, NewKnowledge};

/// Entry counts grouped by moderation status, plus distinct topics.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub pending: i64,
    pub rejected: i64,
    pub approved: i64,
    pub topics: i64,
}

/// Abstract storage backend for knowledge entries.
///
/// All read surfaces operate on approved entries only; pending and
/// rejected entries are invisible to retrieval.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`search_similar`](KnowledgeStore::search_similar) | Nearest-neighbor query over embeddings |
/// | [`fetch_by_topic`](KnowledgeStore::fetch_by_topic) | All approved entries for one topic |
/// | [`insert_entry`](KnowledgeStore::insert_entry) | Write a new pending entry, assigning its id |
/// | [`has_dedup_hash`](KnowledgeStore::has_dedup_hash) | Check for a previously ingested duplicate |
/// | [`set_status`](KnowledgeStore::set_status) | Moderation: flip an entry's status |
/// | [`stats`](KnowledgeStore::stats) | Entry counts by status |
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Similarity search over approved entries.
    ///
    /// Returns at most `max_results` matches with
    /// `similarity >= threshold`, ordered by descending similarity.
    /// Equal scores keep insertion order, so repeated identical queries
    /// return identical results.
    async fn search_similar(
        &self,
        query_vec: &[f32],
        threshold: f64,
        max_results: i64,
        topic_filter: Option<&str>,
    ) -> Result<Vec<Match>>;

    /// All approved entries whose topic exactly equals `topic`,
    /// in insertion order. An unknown topic yields an empty vec,
    /// not an error.
    async fn fetch_by_topic(&self, topic: &str) -> Result<Vec<KnowledgeEntry>>;

    /// Insert a new entry with pending status.
    ///
    /// Returns the assigned `kb-NNNN` identifier.
    async fn insert_entry(&self, entry: &NewKnowledge) -> Result<String>;

    /// Whether an entry with this dedup hash has already been ingested.
    async fn has_dedup_hash(&self, hash: &str) -> Result<bool>;

    /// Flip an entry's moderation status. Returns false if the id is
    /// unknown.
    async fn set_status(&self, kb_id: &str, status: EntryStatus) -> Result<bool>;

    /// Entry counts grouped by status, plus the distinct topic count.
    async fn stats(&self) -> Result<StoreStats>;
}
