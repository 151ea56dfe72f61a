//! Core data models for the knowledge base.
//!
//! These types represent the knowledge entries, similarity matches, and
//! consolidated context blobs that flow through the retrieval pipeline.

/// Moderation status of a knowledge entry.
///
/// Entries are created pending, reviewed by a moderator, and never
/// deleted — rejection is logical. Stored as an integer column:
/// pending = -1, rejected = 0, approved = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Rejected,
    Approved,
}

impl EntryStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            EntryStatus::Pending => -1,
            EntryStatus::Rejected => 0,
            EntryStatus::Approved => 1,
        }
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            -1 => Some(EntryStatus::Pending),
            0 => Some(EntryStatus::Rejected),
            1 => Some(EntryStatus::Approved),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Rejected => "rejected",
            EntryStatus::Approved => "approved",
        }
    }
}

/// A knowledge base entry, immutable once approved.
///
/// `id` is a stable sequential identifier of the form `kb-NNNN`.
/// `topic` is a short non-unique label; many entries share a topic.
#[derive(Debug, Clone)]
pub struct KnowledgeEntry {
    pub id: String,
    pub topic: String,
    pub description: String,
    pub references: String,
    pub author: String,
    pub embedding: Vec<f32>,
    pub status: EntryStatus,
    pub created_at: i64,
}

/// Fields for a new entry before the store assigns its id.
#[derive(Debug, Clone)]
pub struct NewKnowledge {
    pub topic: String,
    pub description: String,
    pub references: String,
    pub author: String,
    pub embedding: Vec<f32>,
    pub dedup_hash: String,
}

/// A transient candidate produced by a similarity query.
///
/// `similarity` is cosine similarity, higher is better. Every match
/// handed to the consolidation engine already satisfies the query
/// threshold.
#[derive(Debug, Clone)]
pub struct Match {
    pub kb_id: String,
    pub topic: String,
    pub description: String,
    pub similarity: f64,
}

/// The consolidation engine's output, produced fresh per query.
///
/// `contributing_ids` is duplicate-free and preserves the order in
/// which entries were incorporated into `text`.
#[derive(Debug, Clone)]
pub struct ConsolidatedContext {
    pub text: String,
    pub source_label: String,
    pub contributing_ids: Vec<String>,
}
