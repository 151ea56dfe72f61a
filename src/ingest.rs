//! Knowledge ingestion.
//!
//! Validates a new knowledge entry, embeds it in document mode, and
//! writes it with pending status. Ingestion failures are reported and
//! never raised: the operator retries manually. Either the full entry
//! is written or nothing is — the embedding happens before any store
//! write, so a failure on either side leaves no partial entry behind.

use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::db;
use crate::embedding::{self, Embedder, TaskKind};
use crate::models::NewKnowledge;
use crate::sqlite_store::SqliteStore;
use crate::store::KnowledgeStore;

/// Hash used to detect resubmission of the same topic/description pair.
pub fn dedup_hash(topic: &str, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(topic.as_bytes());
    hasher.update(b"\n");
    hasher.update(description.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Ingest one knowledge entry. Returns true on success.
///
/// The entry text is embedded as a retrieval *document* — never with
/// the query intent used for incoming questions. A vector whose length
/// differs from the embedder's configured dimensionality is treated as
/// an embedding failure.
pub async fn add_knowledge(
    store: &dyn KnowledgeStore,
    embedder: &dyn Embedder,
    topic: &str,
    description: &str,
    references: &str,
    author: &str,
) -> bool {
    let topic = topic.trim();
    let description = description.trim();

    if topic.is_empty() || description.is_empty() {
        eprintln!("Warning: knowledge entry rejected: topic and description are required");
        return false;
    }

    let hash = dedup_hash(topic, description);
    match store.has_dedup_hash(&hash).await {
        Ok(true) => {
            eprintln!("Warning: knowledge entry already ingested, skipping");
            return false;
        }
        Ok(false) => {}
        Err(e) => {
            eprintln!("Warning: could not check for duplicates: {}", e);
            return false;
        }
    }

    let text = format!("{}: {}", topic, description);
    let vector = match embedder.embed(&text, TaskKind::Document).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Warning: embedding failed, entry not saved: {}", e);
            return false;
        }
    };

    if embedder.dims() > 0 && vector.len() != embedder.dims() {
        eprintln!(
            "Warning: embedding has {} dims, expected {}; entry not saved",
            vector.len(),
            embedder.dims()
        );
        return false;
    }

    let entry = NewKnowledge {
        topic: topic.to_string(),
        description: description.to_string(),
        references: references.to_string(),
        author: author.to_string(),
        embedding: vector,
        dedup_hash: hash,
    };

    match store.insert_entry(&entry).await {
        Ok(_) => true,
        Err(e) => {
            eprintln!("Warning: store write failed, entry not saved: {}", e);
            false
        }
    }
}

/// CLI entry point for `voxkb add`.
pub async fn run_add(
    config: &Config,
    topic: &str,
    description: &str,
    references: &str,
    author: &str,
) -> anyhow::Result<()> {
    let embedder = embedding::create_embedder(&config.embedding)?;
    let pool = db::connect(&config.db).await?;
    let store = SqliteStore::new(pool);

    let ok = add_knowledge(&store, embedder.as_ref(), topic, description, references, author).await;

    println!("knowledge add");
    println!("  topic: {}", topic.trim());
    println!("  status: {}", if ok { "pending review" } else { "failed" });

    store.pool().close().await;

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
