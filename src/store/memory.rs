//! In-memory [`KnowledgeStore`] implementation for testing.
//!
//! Keeps entries in a `Vec` behind `std::sync::RwLock`, so insertion
//! order is the iteration order. Vector search is brute-force cosine
//! similarity over all approved entries.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{EntryStatus, KnowledgeEntry, Match, NewKnowledge};

use super::{KnowledgeStore, StoreStats};

/// In-memory store for tests.
pub struct InMemoryStore {
    entries: RwLock<Vec<KnowledgeEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Insert a pre-built entry directly, bypassing ingestion. Test
    /// seeding helper; the id is still assigned by the store.
    pub fn seed(&self, topic: &str, description: &str, embedding: Vec<f32>, status: EntryStatus) -> String {
        let mut entries = self.entries.write().unwrap();
        let id = format!("kb-{:04}", entries.len() + 1);
        entries.push(KnowledgeEntry {
            id: id.clone(),
            topic: topic.to_string(),
            description: description.to_string(),
            references: String::new(),
            author: String::new(),
            embedding,
            status,
            created_at: 0,
        });
        id
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    async fn search_similar(
        &self,
        query_vec: &[f32],
        threshold: f64,
        max_results: i64,
        topic_filter: Option<&str>,
    ) -> Result<Vec<Match>> {
        let entries = self.entries.read().unwrap();
        let mut matches: Vec<Match> = entries
            .iter()
            .filter(|e| e.status == EntryStatus::Approved)
            .filter(|e| topic_filter.map_or(true, |t| e.topic == t))
            .filter_map(|e| {
                let sim = cosine_similarity(query_vec, &e.embedding) as f64;
                if sim >= threshold {
                    Some(Match {
                        kb_id: e.id.clone(),
                        topic: e.topic.clone(),
                        description: e.description.clone(),
                        similarity: sim,
                    })
                } else {
                    None
                }
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(max_results as usize);
        Ok(matches)
    }

    async fn fetch_by_topic(&self, topic: &str) -> Result<Vec<KnowledgeEntry>> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.status == EntryStatus::Approved && e.topic == topic)
            .cloned()
            .collect())
    }

    async fn insert_entry(&self, entry: &NewKnowledge) -> Result<String> {
        let mut entries = self.entries.write().unwrap();
        let id = format!("kb-{:04}", entries.len() + 1);
        entries.push(KnowledgeEntry {
            id: id.clone(),
            topic: entry.topic.clone(),
            description: entry.description.clone(),
            references: entry.references.clone(),
            author: entry.author.clone(),
            embedding: entry.embedding.clone(),
            status: EntryStatus::Pending,
            created_at: chrono::Utc::now().timestamp(),
        });
        Ok(id)
    }

    async fn has_dedup_hash(&self, hash: &str) -> Result<bool> {
        // The memory store does not persist hashes per entry; recompute
        // from topic/description the same way ingestion does.
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .any(|e| crate::ingest::dedup_hash(&e.topic, &e.description) == hash))
    }

    async fn set_status(&self, kb_id: &str, status: EntryStatus) -> Result<bool> {
        let mut entries = self.entries.write().unwrap();
        match entries.iter_mut().find(|e| e.id == kb_id) {
            Some(e) => {
                e.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn stats(&self) -> Result<StoreStats> {
        let entries = self.entries.read().unwrap();
        let mut stats = StoreStats::default();
        let mut topics: Vec<&str> = Vec::new();
        for e in entries.iter() {
            match e.status {
                EntryStatus::Pending => stats.pending += 1,
                EntryStatus::Rejected => stats.rejected += 1,
                EntryStatus::Approved => stats.approved += 1,
            }
            if !topics.contains(&e.topic.as_str()) {
                topics.push(&e.topic);
            }
        }
        stats.topics = topics.len() as i64;
        Ok(stats)
    }
}
